use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use portfreeze_core::FreezeError;
use portfreeze_registry::{
    freeze_installed, ActivationOutcome, FreezeEvent, FreezeOptions, GitObjectStore,
    CLIENT_CONFIGURATION_FILE,
};
use tracing_subscriber::EnvFilter;

mod render;

use render::{
    format_frozen_line, format_skipped_line, format_summary_line, render_error_lines,
    TerminalRenderer,
};

const DEFAULT_STATUS_FILE: &str = "vcpkg_installed/vcpkg/status";
const DEFAULT_FREEZE_DIRECTORY: &str = "vcpkg-registry";

#[derive(Parser, Debug)]
#[command(name = "portfreeze", version)]
#[command(
    about = "Freeze the installed vcpkg ports into a self-contained file-system registry",
    long_about = None
)]
struct Cli {
    /// Upstream registry checkout whose git objects hold every port version.
    #[arg(long, env = "VCPKG_ROOT")]
    repo: PathBuf,
    /// Installed-package status file to freeze.
    #[arg(long, default_value = DEFAULT_STATUS_FILE)]
    status_file: PathBuf,
    /// Root of the generated registry.
    #[arg(long, default_value = DEFAULT_FREEZE_DIRECTORY)]
    freeze_directory: PathBuf,
    /// Client configuration pointed at the generated registry.
    #[arg(long, default_value = CLIENT_CONFIGURATION_FILE)]
    configuration: PathBuf,
    /// Leave the client configuration untouched.
    #[arg(long)]
    no_activate: bool,
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn freeze_options(&self) -> FreezeOptions {
        FreezeOptions {
            upstream_root: self.repo.clone(),
            status_file: self.status_file.clone(),
            freeze_dir: self.freeze_directory.clone(),
            configuration: (!self.no_activate).then(|| self.configuration.clone()),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run_cli(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            for line in render_error_lines(&err) {
                eprintln!("{line}");
            }
            ExitCode::from(FreezeError::exit_code_for(&err))
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run_cli(cli: &Cli) -> Result<()> {
    let renderer = TerminalRenderer::current();
    let options = cli.freeze_options();
    let store = GitObjectStore::open(&cli.repo);

    let mut progress = renderer.start_progress("freeze");
    let result = freeze_installed(&store, &options, |event| match event {
        FreezeEvent::Resolving { package } => progress.set_message(package),
        FreezeEvent::Frozen(package) => {
            progress.advance();
            progress.print_line(&renderer.status_line("ok", &format_frozen_line(package)));
        }
        FreezeEvent::Skipped(skip) => {
            if cli.verbose {
                progress.print_line(&renderer.status_line("skip", &format_skipped_line(skip)));
            }
        }
    });
    let report = match result {
        Ok(report) => {
            progress.finish_success();
            report
        }
        Err(err) => {
            progress.finish_abandon();
            return Err(err);
        }
    };

    renderer.print_status(
        "ok",
        &format!("wrote baseline {}", report.baseline_path.display()),
    );
    match &report.activation {
        Some(ActivationOutcome::Written) => renderer.print_status(
            "ok",
            &format!(
                "{} now uses {} as its default registry",
                cli.configuration.display(),
                cli.freeze_directory.display()
            ),
        ),
        Some(ActivationOutcome::AlreadyActive) => renderer.print_status(
            "ok",
            &format!(
                "{} already uses {}",
                cli.configuration.display(),
                cli.freeze_directory.display()
            ),
        ),
        Some(ActivationOutcome::Conflict { existing }) => renderer.print_warning(&format!(
            "{} already configures a different default registry ({existing}); it was left unchanged and may take precedence over {}",
            cli.configuration.display(),
            cli.freeze_directory.display()
        )),
        None => {}
    }
    renderer.print_status("ok", &format_summary_line(&report, &cli.freeze_directory));
    Ok(())
}
