mod activation;
mod freeze;
mod git_ops;
mod registry_writer;
mod tree_extract;
mod upstream_index;

pub use activation::{
    activate_registry, filesystem_registry_pointer, ActivationOutcome, CLIENT_CONFIGURATION_FILE,
};
pub use freeze::{
    freeze_installed, freeze_package, freeze_records, open_status_file, FreezeEvent,
    FreezeOptions, FreezeReport, SkippedRecord, StatusFileRecords,
};
pub use git_ops::{ContentStore, GitObjectStore, TreeEntry, TreeEntryKind};
pub use registry_writer::{
    render_canonical_json, write_baseline, write_canonical_json, write_version_file,
};
pub use tree_extract::{
    ensure_no_stray_entries, extract_tree, materialize_tree, verify_tree, TreeDifference,
};
pub use upstream_index::{Resolution, UpstreamRepository};
