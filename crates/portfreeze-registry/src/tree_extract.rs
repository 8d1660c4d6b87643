use std::collections::BTreeSet;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use portfreeze_core::FreezeError;

use crate::{ContentStore, TreeEntry, TreeEntryKind};

/// Materializes `tree_id` into `destination`, creating it if needed.
///
/// Existing files named by the tree are overwritten. Any other entry found in a directory the tree
/// describes stops extraction with [`FreezeError::StrayEntry`]; nothing is ever deleted.
pub fn extract_tree<S: ContentStore + ?Sized>(
    store: &S,
    tree_id: &str,
    destination: &Path,
) -> Result<()> {
    fs::create_dir_all(destination)
        .with_context(|| format!("failed creating directory {}", destination.display()))?;
    let written = materialize_tree(store, tree_id, destination)?;
    ensure_no_stray_entries(destination, &written)
}

/// Writes the direct entries of `tree_id` under `destination` (recursing into subtrees) and
/// returns the names written at this level.
pub fn materialize_tree<S: ContentStore + ?Sized>(
    store: &S,
    tree_id: &str,
    destination: &Path,
) -> Result<BTreeSet<OsString>> {
    let entries = store
        .list_tree(tree_id)
        .with_context(|| format!("failed listing tree {tree_id}"))?;

    let mut written = BTreeSet::new();
    for entry in entries {
        validate_entry_name(&entry, tree_id)?;
        let path = destination.join(&entry.name);
        match &entry.kind {
            TreeEntryKind::Tree => extract_tree(store, &entry.id, &path)?,
            TreeEntryKind::Blob => write_blob(store, &entry.id, &path)?,
            TreeEntryKind::Other(kind) => {
                return Err(FreezeError::UnsupportedTreeEntry {
                    tree_id: tree_id.to_string(),
                    name: entry.name.clone(),
                    kind: kind.clone(),
                }
                .into());
            }
        }
        written.insert(OsString::from(&entry.name));
    }

    Ok(written)
}

/// Fails on the first (sorted) entry of `directory` that is not in `expected`.
pub fn ensure_no_stray_entries(directory: &Path, expected: &BTreeSet<OsString>) -> Result<()> {
    let mut strays = Vec::new();
    for entry in fs::read_dir(directory)
        .with_context(|| format!("failed reading directory {}", directory.display()))?
    {
        let entry = entry?;
        if !expected.contains(&entry.file_name()) {
            strays.push(entry.path());
        }
    }

    strays.sort();
    match strays.into_iter().next() {
        Some(stray) => Err(FreezeError::StrayEntry(stray).into()),
        None => Ok(()),
    }
}

fn write_blob<S: ContentStore + ?Sized>(store: &S, blob_id: &str, path: &Path) -> Result<()> {
    let mut file = fs::File::create(path)
        .with_context(|| format!("failed creating file {}", path.display()))?;
    store
        .copy_blob(blob_id, &mut file)
        .with_context(|| format!("failed writing blob {} to {}", blob_id, path.display()))?;
    Ok(())
}

fn validate_entry_name(entry: &TreeEntry, tree_id: &str) -> Result<()> {
    let name = entry.name.as_str();
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0')
    {
        anyhow::bail!("tree {tree_id} contains invalid entry name '{name}'");
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeDifference {
    Missing(PathBuf),
    Unexpected(PathBuf),
    KindMismatch(PathBuf),
    ContentMismatch(PathBuf),
}

impl TreeDifference {
    pub fn path(&self) -> &Path {
        match self {
            Self::Missing(path)
            | Self::Unexpected(path)
            | Self::KindMismatch(path)
            | Self::ContentMismatch(path) => path,
        }
    }
}

/// Compares `directory` against the content of `tree_id`, returning every difference found.
pub fn verify_tree<S: ContentStore + ?Sized>(
    store: &S,
    tree_id: &str,
    directory: &Path,
) -> Result<Vec<TreeDifference>> {
    let mut differences = Vec::new();
    if !directory.is_dir() {
        differences.push(TreeDifference::Missing(directory.to_path_buf()));
        return Ok(differences);
    }
    verify_tree_into(store, tree_id, directory, &mut differences)?;
    Ok(differences)
}

fn verify_tree_into<S: ContentStore + ?Sized>(
    store: &S,
    tree_id: &str,
    directory: &Path,
    differences: &mut Vec<TreeDifference>,
) -> Result<()> {
    let entries = store
        .list_tree(tree_id)
        .with_context(|| format!("failed listing tree {tree_id}"))?;

    let mut expected = BTreeSet::new();
    for entry in entries {
        let path = directory.join(&entry.name);
        expected.insert(OsString::from(&entry.name));
        match entry.kind {
            TreeEntryKind::Tree => {
                if path.is_dir() {
                    verify_tree_into(store, &entry.id, &path, differences)?;
                } else if path.exists() {
                    differences.push(TreeDifference::KindMismatch(path));
                } else {
                    differences.push(TreeDifference::Missing(path));
                }
            }
            TreeEntryKind::Blob => {
                if path.is_file() {
                    let on_disk = fs::read(&path)
                        .with_context(|| format!("failed reading {}", path.display()))?;
                    if on_disk != store.read_blob(&entry.id)? {
                        differences.push(TreeDifference::ContentMismatch(path));
                    }
                } else if path.exists() {
                    differences.push(TreeDifference::KindMismatch(path));
                } else {
                    differences.push(TreeDifference::Missing(path));
                }
            }
            TreeEntryKind::Other(_) => differences.push(TreeDifference::KindMismatch(path)),
        }
    }

    let mut unexpected = Vec::new();
    for entry in fs::read_dir(directory)
        .with_context(|| format!("failed reading directory {}", directory.display()))?
    {
        let entry = entry?;
        if !expected.contains(&entry.file_name()) {
            unexpected.push(entry.path());
        }
    }
    unexpected.sort();
    differences.extend(unexpected.into_iter().map(TreeDifference::Unexpected));
    Ok(())
}
