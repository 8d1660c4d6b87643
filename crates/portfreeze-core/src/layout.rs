use std::path::{Path, PathBuf};

/// Prefix the client tool expands to the registry root inside version files.
pub const REGISTRY_ROOT_MARKER: &str = "$";

/// Paths inside a generated file-system registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryLayout {
    root: PathBuf,
}

impl RegistryLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ports_dir(&self) -> PathBuf {
        self.root.join("ports")
    }

    pub fn versions_dir(&self) -> PathBuf {
        self.root.join("versions")
    }

    pub fn port_dir(&self, package: &str, version: &str, port_version: u32) -> PathBuf {
        self.ports_dir()
            .join(package)
            .join(port_dir_name(version, port_version))
    }

    pub fn version_file_path(&self, package: &str) -> PathBuf {
        self.versions_dir()
            .join(first_letter_dir(package))
            .join(format!("{package}.json"))
    }

    pub fn baseline_path(&self) -> PathBuf {
        self.versions_dir().join("baseline.json")
    }

    /// Registry-relative form of [`RegistryLayout::port_dir`], as written into version files.
    pub fn port_registry_path(package: &str, version: &str, port_version: u32) -> String {
        format!(
            "{REGISTRY_ROOT_MARKER}/ports/{package}/{}",
            port_dir_name(version, port_version)
        )
    }
}

/// Paths inside the upstream registry checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamLayout {
    root: PathBuf,
}

impl UpstreamLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn version_index_path(&self, package: &str) -> PathBuf {
        self.root
            .join("versions")
            .join(first_letter_dir(package))
            .join(format!("{package}.json"))
    }
}

/// Bucket directory for a package's version file, e.g. `z-` for `zlib`.
pub fn first_letter_dir(package: &str) -> String {
    match package.chars().next() {
        Some(first) => format!("{first}-"),
        None => "-".to_string(),
    }
}

fn port_dir_name(version: &str, port_version: u32) -> String {
    if port_version == 0 {
        version.to_string()
    } else {
        format!("{version}_{port_version}")
    }
}
