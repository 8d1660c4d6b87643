use std::path::PathBuf;

use thiserror::Error;

/// Failures the command line has to tell apart when choosing an exit code.
#[derive(Debug, Error)]
pub enum FreezeError {
    #[error("status file not found: {}", .0.display())]
    StatusFileMissing(PathBuf),
    #[error("required JSON file not found: {}", .0.display())]
    JsonFileMissing(PathBuf),
    #[error(
        "unexpected entry {} is not part of the frozen tree; refusing to delete it, remove it manually and re-run",
        .0.display()
    )]
    StrayEntry(PathBuf),
    #[error("status paragraph has a continuation line before any key: {line:?}")]
    OrphanContinuation { line: String },
    #[error("status paragraph is missing the 'package' field")]
    MissingPackageField,
    #[error("invalid port-version '{value}' for package '{package}'")]
    InvalidPortVersion { package: String, value: String },
    #[error(
        "no entry in {} matches installed {package} {version} (port-version {port_version})",
        .index.display()
    )]
    NoMatchingVersion {
        package: String,
        version: String,
        port_version: u32,
        index: PathBuf,
    },
    #[error("tree {tree_id} has unsupported entry '{name}' of kind '{kind}'")]
    UnsupportedTreeEntry {
        tree_id: String,
        name: String,
        kind: String,
    },
}

impl FreezeError {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::StatusFileMissing(_) => 1,
            Self::JsonFileMissing(_) | Self::StrayEntry(_) => 2,
            _ => 3,
        }
    }

    /// Exit code for an arbitrary error chain, falling back to the generic failure code.
    pub fn exit_code_for(err: &anyhow::Error) -> u8 {
        err.chain()
            .find_map(|cause| cause.downcast_ref::<FreezeError>())
            .map(FreezeError::exit_code)
            .unwrap_or(3)
    }
}
