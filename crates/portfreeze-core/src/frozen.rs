use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{RegistryLayout, ResolvedVersion};

/// A package whose port tree has been (or is about to be) copied into the frozen registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrozenPackage {
    pub name: String,
    pub resolved: ResolvedVersion,
    pub port_dir: PathBuf,
    pub version_file: PathBuf,
    pub registry_path: String,
}

impl FrozenPackage {
    pub fn new(layout: &RegistryLayout, name: &str, resolved: ResolvedVersion) -> Self {
        Self {
            port_dir: layout.port_dir(name, &resolved.version, resolved.port_version),
            version_file: layout.version_file_path(name),
            registry_path: RegistryLayout::port_registry_path(
                name,
                &resolved.version,
                resolved.port_version,
            ),
            name: name.to_string(),
            resolved,
        }
    }

    pub fn version(&self) -> &str {
        &self.resolved.version
    }

    pub fn port_version(&self) -> u32 {
        self.resolved.port_version
    }

    /// Contents of the package's version file in the frozen registry.
    pub fn version_file_document(&self) -> Value {
        let mut entry = serde_json::Map::new();
        entry.insert(
            self.resolved.kind.key().to_string(),
            Value::String(self.resolved.version.clone()),
        );
        entry.insert("port-version".to_string(), json!(self.resolved.port_version));
        entry.insert("path".to_string(), Value::String(self.registry_path.clone()));
        json!({ "versions": [Value::Object(entry)] })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaselineEntry {
    pub baseline: String,
    #[serde(rename = "port-version")]
    pub port_version: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Baseline {
    #[serde(default)]
    pub default: BTreeMap<String, BaselineEntry>,
}

impl Baseline {
    pub fn from_frozen<'a>(packages: impl IntoIterator<Item = &'a FrozenPackage>) -> Self {
        let mut baseline = Self::default();
        for package in packages {
            baseline.insert(package);
        }
        baseline
    }

    pub fn insert(&mut self, package: &FrozenPackage) {
        self.default.insert(
            package.name.clone(),
            BaselineEntry {
                baseline: package.version().to_string(),
                port_version: package.port_version(),
            },
        );
    }

    pub fn get(&self, package: &str) -> Option<&BaselineEntry> {
        self.default.get(package)
    }

    pub fn len(&self) -> usize {
        self.default.len()
    }

    pub fn is_empty(&self) -> bool {
        self.default.is_empty()
    }
}

/// Why a status record did not produce a frozen package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    FeatureEntry,
    NotInstalled,
    Duplicate,
    ConflictingDuplicate,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FeatureEntry => "feature entry",
            Self::NotInstalled => "not installed",
            Self::Duplicate => "already frozen",
            Self::ConflictingDuplicate => "conflicts with an already frozen version",
        }
    }
}
