use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VersionKind {
    Relaxed,
    Semver,
    Date,
    String,
}

/// Order in which version kinds are tried when matching an installed version.
pub const VERSION_KIND_PRIORITY: [VersionKind; 4] = [
    VersionKind::Relaxed,
    VersionKind::Semver,
    VersionKind::Date,
    VersionKind::String,
];

impl VersionKind {
    pub fn key(self) -> &'static str {
        match self {
            Self::Relaxed => "version",
            Self::Semver => "version-semver",
            Self::Date => "version-date",
            Self::String => "version-string",
        }
    }

    pub fn parse(input: &str) -> Option<Self> {
        VERSION_KIND_PRIORITY
            .into_iter()
            .find(|kind| kind.key() == input.trim())
    }

    pub fn value_in(self, entry: &VersionIndexEntry) -> Option<&str> {
        match self {
            Self::Relaxed => entry.version.as_deref(),
            Self::Semver => entry.version_semver.as_deref(),
            Self::Date => entry.version_date.as_deref(),
            Self::String => entry.version_string.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionIndexEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(
        rename = "version-semver",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub version_semver: Option<String>,
    #[serde(
        rename = "version-date",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub version_date: Option<String>,
    #[serde(
        rename = "version-string",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub version_string: Option<String>,
    #[serde(rename = "port-version", default)]
    pub port_version: u32,
    #[serde(rename = "git-tree")]
    pub git_tree: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionIndexFile {
    #[serde(default)]
    pub versions: Vec<VersionIndexEntry>,
}

impl VersionIndexFile {
    pub fn from_json_str(input: &str) -> Result<Self> {
        serde_json::from_str(input).context("failed to parse version index")
    }

    /// First entry, scanned in file order, whose value under any recognised kind equals
    /// `version` and whose port-version equals `port_version`.
    pub fn find_match(
        &self,
        version: &str,
        port_version: u32,
    ) -> Option<(VersionKind, &VersionIndexEntry)> {
        self.versions.iter().find_map(|entry| {
            if entry.port_version != port_version {
                return None;
            }
            VERSION_KIND_PRIORITY
                .into_iter()
                .find(|kind| kind.value_in(entry) == Some(version))
                .map(|kind| (kind, entry))
        })
    }
}

/// Version of an installed package as found in the upstream index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVersion {
    pub kind: VersionKind,
    pub version: String,
    pub port_version: u32,
    pub git_tree: String,
}
