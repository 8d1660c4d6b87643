mod error;
mod frozen;
mod layout;
mod status;
mod version;

pub use error::FreezeError;
pub use frozen::{Baseline, BaselineEntry, FrozenPackage, SkipReason};
pub use layout::{first_letter_dir, RegistryLayout, UpstreamLayout, REGISTRY_ROOT_MARKER};
pub use status::{
    parse_status_paragraph, InstalledPackageRecord, StatusParagraphs, INSTALLED_STATUS_MARKER,
};
pub use version::{
    ResolvedVersion, VersionIndexEntry, VersionIndexFile, VersionKind, VERSION_KIND_PRIORITY,
};
