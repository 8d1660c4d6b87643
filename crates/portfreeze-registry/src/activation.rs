use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::{json, Map, Value};
use tracing::info;

use crate::write_canonical_json;

/// Name of the client configuration document in a project root.
pub const CLIENT_CONFIGURATION_FILE: &str = "vcpkg-configuration.json";

const DEFAULT_REGISTRY_KEY: &str = "default-registry";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivationOutcome {
    /// The pointer was added and the document written.
    Written,
    /// The document already pointed at the frozen registry and was left untouched.
    AlreadyActive,
    /// Another default registry is configured; the document was left untouched.
    Conflict { existing: Value },
}

pub fn filesystem_registry_pointer(freeze_dir: &Path) -> Value {
    json!({
        "kind": "filesystem",
        "path": freeze_dir.to_string_lossy(),
    })
}

/// Points the client configuration at the frozen registry unless another default registry is
/// already configured.
pub fn activate_registry(config_path: &Path, freeze_dir: &Path) -> Result<ActivationOutcome> {
    let mut document = load_configuration(config_path)?;
    let target = filesystem_registry_pointer(freeze_dir);

    match document.get(DEFAULT_REGISTRY_KEY) {
        Some(existing) if *existing == target => return Ok(ActivationOutcome::AlreadyActive),
        Some(existing) if !existing.is_null() => {
            info!(
                config = %config_path.display(),
                existing = %existing,
                "a different default registry is already configured"
            );
            return Ok(ActivationOutcome::Conflict {
                existing: existing.clone(),
            });
        }
        _ => {}
    }

    document.insert(DEFAULT_REGISTRY_KEY.to_string(), target);
    write_canonical_json(config_path, &document).with_context(|| {
        format!(
            "failed writing client configuration: {}",
            config_path.display()
        )
    })?;
    Ok(ActivationOutcome::Written)
}

fn load_configuration(config_path: &Path) -> Result<Map<String, Value>> {
    let content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
        Err(err) => {
            return Err(err).with_context(|| {
                format!(
                    "failed reading client configuration: {}",
                    config_path.display()
                )
            });
        }
    };
    if content.trim().is_empty() {
        return Ok(Map::new());
    }

    match serde_json::from_str::<Value>(&content).with_context(|| {
        format!(
            "failed parsing client configuration: {}",
            config_path.display()
        )
    })? {
        Value::Object(map) => Ok(map),
        _ => anyhow::bail!(
            "client configuration is not a JSON object: {}",
            config_path.display()
        ),
    }
}
