use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{Context, Result};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeEntryKind {
    Tree,
    Blob,
    /// Anything else git can place in a tree, such as a submodule `commit`.
    Other(String),
}

impl TreeEntryKind {
    pub fn parse(input: &str) -> Self {
        match input {
            "tree" => Self::Tree,
            "blob" => Self::Blob,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Tree => "tree",
            Self::Blob => "blob",
            Self::Other(kind) => kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub kind: TreeEntryKind,
    pub id: String,
    pub name: String,
}

/// Read-only access to a content-addressed object store with trees and blobs.
pub trait ContentStore {
    /// Direct children of a tree, in store order.
    fn list_tree(&self, tree_id: &str) -> Result<Vec<TreeEntry>>;

    fn read_blob(&self, blob_id: &str) -> Result<Vec<u8>>;

    /// Writes a blob's bytes into `writer`, returning the number of bytes copied.
    fn copy_blob(&self, blob_id: &str, writer: &mut dyn Write) -> Result<u64> {
        let bytes = self.read_blob(blob_id)?;
        writer
            .write_all(&bytes)
            .with_context(|| format!("failed writing blob {blob_id}"))?;
        Ok(bytes.len() as u64)
    }
}

/// Object store of a git checkout, queried by running `git` once per object.
#[derive(Debug, Clone)]
pub struct GitObjectStore {
    repo_root: PathBuf,
}

impl GitObjectStore {
    pub fn open(repo_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
        }
    }

    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    fn git(&self) -> Command {
        let mut command = base_git_command();
        command.current_dir(&self.repo_root);
        command
    }
}

impl ContentStore for GitObjectStore {
    fn list_tree(&self, tree_id: &str) -> Result<Vec<TreeEntry>> {
        validate_object_id(tree_id)?;
        debug!(tree = tree_id, "listing tree");
        let output = self
            .git()
            .arg("ls-tree")
            .arg("-z")
            .arg(tree_id)
            .output()
            .with_context(|| format!("failed launching git ls-tree {tree_id}"))?;
        if !output.status.success() {
            anyhow::bail!(
                "git ls-tree {} failed in {}: {}",
                tree_id,
                self.repo_root.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let listing = String::from_utf8(output.stdout)
            .with_context(|| format!("git ls-tree {tree_id} produced non-UTF-8 output"))?;
        parse_ls_tree_output(&listing)
            .with_context(|| format!("failed parsing git ls-tree output for {tree_id}"))
    }

    fn read_blob(&self, blob_id: &str) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.copy_blob(blob_id, &mut bytes)?;
        Ok(bytes)
    }

    fn copy_blob(&self, blob_id: &str, writer: &mut dyn Write) -> Result<u64> {
        validate_object_id(blob_id)?;
        debug!(blob = blob_id, "reading blob");
        let mut child = self
            .git()
            .arg("cat-file")
            .arg("blob")
            .arg(blob_id)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed launching git cat-file blob {blob_id}"))?;

        let copied = match child.stdout.take() {
            Some(mut stdout) => io::copy(&mut stdout, writer)
                .with_context(|| format!("failed streaming blob {blob_id}"))?,
            None => 0,
        };

        let output = child
            .wait_with_output()
            .with_context(|| format!("failed waiting for git cat-file blob {blob_id}"))?;
        if !output.status.success() {
            anyhow::bail!(
                "git cat-file blob {} failed in {}: {}",
                blob_id,
                self.repo_root.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(copied)
    }
}

pub(crate) fn base_git_command() -> Command {
    let mut command = Command::new("git");
    command
        .arg("-c")
        .arg("core.autocrlf=false")
        .arg("-c")
        .arg("core.eol=lf");
    if cfg!(windows) {
        command.arg("-c").arg("core.longpaths=true");
    }
    command
}

/// Parses `git ls-tree -z` records: `<mode> SP <kind> SP <id> TAB <name> NUL`.
pub(crate) fn parse_ls_tree_output(listing: &str) -> Result<Vec<TreeEntry>> {
    let mut entries = Vec::new();
    for record in listing.split('\0').filter(|record| !record.is_empty()) {
        let (meta, name) = record
            .split_once('\t')
            .with_context(|| format!("malformed ls-tree record: '{record}'"))?;
        let mut fields = meta.split_whitespace();
        let (Some(_mode), Some(kind), Some(id), None) =
            (fields.next(), fields.next(), fields.next(), fields.next())
        else {
            anyhow::bail!("malformed ls-tree record: '{record}'");
        };
        entries.push(TreeEntry {
            kind: TreeEntryKind::parse(kind),
            id: id.to_string(),
            name: name.to_string(),
        });
    }
    Ok(entries)
}

pub(crate) fn validate_object_id(id: &str) -> Result<()> {
    if id.len() < 4 || id.len() > 64 || !id.chars().all(|ch| ch.is_ascii_hexdigit()) {
        anyhow::bail!("invalid object id: '{id}'");
    }
    Ok(())
}
