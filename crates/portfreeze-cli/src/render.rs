use std::io::IsTerminal;
use std::path::Path;
use std::time::{Duration, Instant};

use anstyle::{AnsiColor, Effects, Style};
use indicatif::{HumanCount, ProgressBar, ProgressStyle};
use portfreeze_core::FrozenPackage;
use portfreeze_registry::{FreezeReport, SkippedRecord};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum OutputStyle {
    Plain,
    Rich,
}

#[derive(Copy, Clone, Debug)]
pub(crate) struct TerminalRenderer {
    style: OutputStyle,
}

pub(crate) struct TerminalProgress {
    style: OutputStyle,
    label: String,
    current: u64,
    progress_bar: Option<ProgressBar>,
    started_at: Instant,
}

pub(crate) fn current_output_style() -> OutputStyle {
    let no_color = std::env::var_os("NO_COLOR").is_some_and(|value| !value.is_empty());
    if no_color || !std::io::stdout().is_terminal() {
        OutputStyle::Plain
    } else {
        OutputStyle::Rich
    }
}

impl TerminalRenderer {
    pub(crate) fn from_style(style: OutputStyle) -> Self {
        Self { style }
    }

    pub(crate) fn current() -> Self {
        Self::from_style(current_output_style())
    }

    pub(crate) fn status_line(self, status: &str, message: &str) -> String {
        let line = render_status_line(self.style, status, message);
        match self.style {
            OutputStyle::Plain => line,
            OutputStyle::Rich => colorize(status_style(status), &line),
        }
    }

    pub(crate) fn print_status(self, status: &str, message: &str) {
        println!("{}", self.status_line(status, message));
    }

    pub(crate) fn print_warning(self, message: &str) {
        let line = match self.style {
            OutputStyle::Plain => format!("warning: {message}"),
            OutputStyle::Rich => self.status_line("warn", message),
        };
        eprintln!("{line}");
    }

    pub(crate) fn start_progress(self, label: &str) -> TerminalProgress {
        let progress_bar = if self.style == OutputStyle::Rich {
            let progress_bar = ProgressBar::new_spinner();
            if let Ok(style) =
                ProgressStyle::with_template("{spinner:.cyan.bold} {prefix:<8} {msg} {elapsed}")
            {
                progress_bar.set_style(style.tick_chars("|/-\\ "));
            }
            progress_bar.set_prefix(label.to_string());
            progress_bar.enable_steady_tick(Duration::from_millis(80));
            Some(progress_bar)
        } else {
            None
        };

        TerminalProgress {
            style: self.style,
            label: label.to_string(),
            current: 0,
            progress_bar,
            started_at: Instant::now(),
        }
    }
}

impl TerminalProgress {
    pub(crate) fn set_message(&mut self, message: &str) {
        if let Some(progress_bar) = &self.progress_bar {
            progress_bar.set_message(message.to_string());
        }
    }

    pub(crate) fn advance(&mut self) {
        self.current += 1;
    }

    /// Prints above the spinner so the line is not overwritten by the next tick.
    pub(crate) fn print_line(&self, line: &str) {
        match &self.progress_bar {
            Some(progress_bar) => progress_bar.println(line),
            None => println!("{line}"),
        }
    }

    pub(crate) fn finish_success(mut self) {
        let Some(progress_bar) = self.progress_bar.take() else {
            return;
        };

        progress_bar.finish_and_clear();
        if let Some(line) = render_progress_line(
            self.style,
            &self.label,
            self.current,
            Some(self.started_at.elapsed()),
        ) {
            println!("{line}");
        }
    }

    pub(crate) fn finish_abandon(mut self) {
        if let Some(progress_bar) = self.progress_bar.take() {
            progress_bar.finish_and_clear();
        }
    }
}

pub(crate) fn render_status_line(style: OutputStyle, status: &str, message: &str) -> String {
    match style {
        OutputStyle::Plain => message.to_string(),
        OutputStyle::Rich => format!("[{}] {message}", status.to_ascii_uppercase()),
    }
}

pub(crate) fn format_frozen_line(package: &FrozenPackage) -> String {
    format!(
        "froze {} {} ({}) -> {}",
        package.name,
        format_version(package.version(), package.port_version()),
        package.resolved.kind.key(),
        package.port_dir.display()
    )
}

pub(crate) fn format_skipped_line(skip: &SkippedRecord) -> String {
    match &skip.feature {
        Some(feature) => format!(
            "skipped {}[{}]: {}",
            skip.package,
            feature,
            skip.reason.as_str()
        ),
        None => format!("skipped {}: {}", skip.package, skip.reason.as_str()),
    }
}

pub(crate) fn format_summary_line(report: &FreezeReport, freeze_dir: &Path) -> String {
    format!(
        "froze {} package(s) into {}, skipped {} record(s)",
        HumanCount(report.frozen.len() as u64),
        freeze_dir.display(),
        HumanCount(report.skipped.len() as u64)
    )
}

pub(crate) fn render_error_lines(err: &anyhow::Error) -> Vec<String> {
    let mut lines = vec![format!("error: {err}")];
    lines.extend(err.chain().skip(1).map(|cause| format!("caused by: {cause}")));
    lines
}

fn format_version(version: &str, port_version: u32) -> String {
    if port_version == 0 {
        version.to_string()
    } else {
        format!("{version}#{port_version}")
    }
}

fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    let millis = elapsed.subsec_millis();
    format!("{secs}.{millis:03}s")
}

fn status_style(status: &str) -> Style {
    match status {
        "ok" => Style::new().fg_color(Some(AnsiColor::BrightGreen.into())),
        "warn" => Style::new()
            .fg_color(Some(AnsiColor::BrightYellow.into()))
            .effects(Effects::BOLD),
        "skip" => Style::new().fg_color(Some(AnsiColor::BrightBlack.into())),
        _ => Style::new(),
    }
}

fn progress_label_style() -> Style {
    Style::new()
        .fg_color(Some(AnsiColor::BrightCyan.into()))
        .effects(Effects::BOLD)
}

fn colorize(style: Style, text: &str) -> String {
    format!("{}{}{}", style.render(), text, style.render_reset())
}

fn render_progress_line(
    style: OutputStyle,
    label: &str,
    current: u64,
    elapsed: Option<Duration>,
) -> Option<String> {
    if style == OutputStyle::Plain {
        return None;
    }

    let suffix = elapsed
        .map(|value| format!(" in {}", format_elapsed(value)))
        .unwrap_or_default();
    Some(format!(
        "{} {} package(s) complete{}",
        colorize(progress_label_style(), label),
        HumanCount(current),
        suffix
    ))
}
