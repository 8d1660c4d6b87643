use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use portfreeze_core::{
    Baseline, FreezeError, FrozenPackage, InstalledPackageRecord, RegistryLayout, SkipReason,
    StatusParagraphs,
};
use tracing::info;

use crate::{
    activate_registry, extract_tree, write_baseline, write_version_file, ActivationOutcome,
    ContentStore, Resolution, UpstreamRepository,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreezeOptions {
    pub upstream_root: PathBuf,
    pub status_file: PathBuf,
    pub freeze_dir: PathBuf,
    /// Client configuration to point at the frozen registry; `None` skips activation.
    pub configuration: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    pub package: String,
    pub feature: Option<String>,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreezeReport {
    pub frozen: Vec<FrozenPackage>,
    pub skipped: Vec<SkippedRecord>,
    pub baseline_path: PathBuf,
    pub activation: Option<ActivationOutcome>,
}

#[derive(Debug, Clone, Copy)]
pub enum FreezeEvent<'a> {
    Resolving { package: &'a str },
    Frozen(&'a FrozenPackage),
    Skipped(&'a SkippedRecord),
}

pub type StatusFileRecords = StatusParagraphs<io::Lines<BufReader<File>>>;

pub fn open_status_file(path: &Path) -> Result<StatusFileRecords> {
    match File::open(path) {
        Ok(file) => Ok(StatusParagraphs::from_reader(BufReader::new(file))),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            Err(FreezeError::StatusFileMissing(path.to_path_buf()).into())
        }
        Err(err) => Err(err)
            .with_context(|| format!("failed opening status file: {}", path.display())),
    }
}

/// Freezes every installed package listed in the status file, then writes the baseline and,
/// when configured, activates the registry.
pub fn freeze_installed<S: ContentStore + ?Sized>(
    store: &S,
    options: &FreezeOptions,
    observer: impl FnMut(FreezeEvent<'_>),
) -> Result<FreezeReport> {
    let upstream = UpstreamRepository::open(&options.upstream_root);
    let layout = RegistryLayout::new(&options.freeze_dir);
    let records = open_status_file(&options.status_file)?;

    let mut report = freeze_records(store, &upstream, &layout, records, observer)?;
    if let Some(configuration) = &options.configuration {
        report.activation = Some(activate_registry(configuration, &options.freeze_dir)?);
    }
    Ok(report)
}

pub fn freeze_records<S, I>(
    store: &S,
    upstream: &UpstreamRepository,
    layout: &RegistryLayout,
    records: I,
    mut observer: impl FnMut(FreezeEvent<'_>),
) -> Result<FreezeReport>
where
    S: ContentStore + ?Sized,
    I: IntoIterator<Item = Result<InstalledPackageRecord>>,
{
    let mut frozen: Vec<FrozenPackage> = Vec::new();
    let mut skipped: Vec<SkippedRecord> = Vec::new();

    for record in records {
        let record = record.context("failed parsing status file")?;
        observer(FreezeEvent::Resolving {
            package: &record.package,
        });

        let resolution = upstream
            .resolve_record(&record)
            .with_context(|| format!("failed resolving package '{}'", record.package))?;
        let resolved = match resolution {
            Resolution::Resolved(resolved) => resolved,
            Resolution::Skipped(reason) => {
                let skip = skipped_record(&record, reason);
                observer(FreezeEvent::Skipped(&skip));
                skipped.push(skip);
                continue;
            }
        };

        if let Some(existing) = frozen.iter().find(|package| package.name == record.package) {
            let reason = if existing.version() == resolved.version
                && existing.port_version() == resolved.port_version
            {
                SkipReason::Duplicate
            } else {
                info!(
                    package = %record.package,
                    frozen = %existing.version(),
                    installed = %resolved.version,
                    "package installed with more than one version; keeping the first"
                );
                SkipReason::ConflictingDuplicate
            };
            let skip = skipped_record(&record, reason);
            observer(FreezeEvent::Skipped(&skip));
            skipped.push(skip);
            continue;
        }

        let package = FrozenPackage::new(layout, &record.package, resolved);
        freeze_package(store, &package)?;
        info!(
            package = %package.name,
            version = %package.version(),
            port_version = package.port_version(),
            "frozen"
        );
        observer(FreezeEvent::Frozen(&package));
        frozen.push(package);
    }

    let baseline = Baseline::from_frozen(&frozen);
    let baseline_path = write_baseline(layout, &baseline)?;

    Ok(FreezeReport {
        frozen,
        skipped,
        baseline_path,
        activation: None,
    })
}

/// Extracts one package's port tree and writes its version file.
pub fn freeze_package<S: ContentStore + ?Sized>(
    store: &S,
    package: &FrozenPackage,
) -> Result<()> {
    extract_tree(store, &package.resolved.git_tree, &package.port_dir).with_context(|| {
        format!(
            "failed extracting port '{}' (tree {}) into {}",
            package.name,
            package.resolved.git_tree,
            package.port_dir.display()
        )
    })?;
    write_version_file(package)?;
    Ok(())
}

fn skipped_record(record: &InstalledPackageRecord, reason: SkipReason) -> SkippedRecord {
    SkippedRecord {
        package: record.package.clone(),
        feature: record.feature.clone(),
        reason,
    }
}
