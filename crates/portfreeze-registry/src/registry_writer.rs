use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use portfreeze_core::{Baseline, FrozenPackage, RegistryLayout};
use serde::Serialize;

/// Writes `value` as pretty JSON with sorted object keys and a trailing newline, so that equal
/// values always produce identical bytes.
pub fn write_canonical_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let content = render_canonical_json(value)
        .with_context(|| format!("failed serializing {}", path.display()))?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed creating directory {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("failed writing {}", path.display()))
}

pub fn render_canonical_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    // serde_json::Value keeps object keys in a BTreeMap, which gives the sorted order.
    let value = serde_json::to_value(value)?;
    let mut content = serde_json::to_string_pretty(&value)?;
    content.push('\n');
    Ok(content)
}

pub fn write_version_file(package: &FrozenPackage) -> Result<PathBuf> {
    write_canonical_json(&package.version_file, &package.version_file_document()).with_context(
        || format!("failed writing version file for package '{}'", package.name),
    )?;
    Ok(package.version_file.clone())
}

pub fn write_baseline(layout: &RegistryLayout, baseline: &Baseline) -> Result<PathBuf> {
    let path = layout.baseline_path();
    write_canonical_json(&path, baseline).context("failed writing registry baseline")?;
    Ok(path)
}
