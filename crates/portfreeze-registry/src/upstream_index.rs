use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use portfreeze_core::{
    FreezeError, InstalledPackageRecord, ResolvedVersion, SkipReason, UpstreamLayout,
    VersionIndexFile,
};
use tracing::debug;

/// Outcome of looking up one status record in the upstream version index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(ResolvedVersion),
    Skipped(SkipReason),
}

/// The upstream registry checkout whose `versions/` tree describes every published port version.
#[derive(Debug, Clone)]
pub struct UpstreamRepository {
    layout: UpstreamLayout,
}

impl UpstreamRepository {
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self {
            layout: UpstreamLayout::new(root),
        }
    }

    pub fn root(&self) -> &Path {
        self.layout.root()
    }

    pub fn load_version_index(&self, package: &str) -> Result<VersionIndexFile> {
        let path = self.layout.version_index_path(package);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(FreezeError::JsonFileMissing(path).into());
            }
            Err(err) => {
                return Err(err).with_context(|| {
                    format!("failed reading version index: {}", path.display())
                });
            }
        };

        VersionIndexFile::from_json_str(&content)
            .with_context(|| format!("failed parsing version index: {}", path.display()))
    }

    pub fn resolve_record(&self, record: &InstalledPackageRecord) -> Result<Resolution> {
        let Some(version) = record.version.as_deref() else {
            debug!(package = %record.package, feature = ?record.feature, "skipping feature entry");
            return Ok(Resolution::Skipped(SkipReason::FeatureEntry));
        };
        if !record.is_installed() {
            debug!(package = %record.package, status = %record.status, "skipping record that is not installed");
            return Ok(Resolution::Skipped(SkipReason::NotInstalled));
        }

        self.resolve(&record.package, version, record.port_version)
            .map(Resolution::Resolved)
    }

    pub fn resolve(
        &self,
        package: &str,
        version: &str,
        port_version: u32,
    ) -> Result<ResolvedVersion> {
        let index = self.load_version_index(package)?;
        let Some((kind, entry)) = index.find_match(version, port_version) else {
            return Err(FreezeError::NoMatchingVersion {
                package: package.to_string(),
                version: version.to_string(),
                port_version,
                index: self.layout.version_index_path(package),
            }
            .into());
        };

        debug!(
            package,
            version,
            port_version,
            kind = kind.key(),
            git_tree = %entry.git_tree,
            "resolved upstream version"
        );
        Ok(ResolvedVersion {
            kind,
            version: version.to_string(),
            port_version,
            git_tree: entry.git_tree.clone(),
        })
    }
}
