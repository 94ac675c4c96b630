//! Output formatting.

use crate::cli::OutputFormat;
use camino::Utf8PathBuf;
use css_rewrite::{RewriteMode, RewriteStats, SectionReport, TargetReport};
use serde::Serialize;

/// The outcome of a width-fix run.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidthFixRun {
    /// The stylesheet.
    pub file: Utf8PathBuf,
    /// Whether the stylesheet was written.
    pub written: bool,
    /// Whether writing was suppressed.
    pub dry_run: bool,
    /// The injected declaration.
    pub declaration: String,
    /// Blocks that received the declaration.
    pub injected: usize,
    /// Per-selector counts.
    pub targets: Vec<TargetReport>,
    /// Problems worth a look.
    pub warnings: Vec<String>,
}

/// The outcome of a namespace run.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceRun {
    /// The job name.
    pub job: String,
    /// The stylesheet.
    pub file: Utf8PathBuf,
    /// Scanner mode used.
    pub mode: RewriteMode,
    /// Whether the stylesheet was written.
    pub written: bool,
    /// Whether writing was suppressed.
    pub dry_run: bool,
    /// Lines in the rewritten stylesheet.
    pub total_lines: usize,
    /// Counters summed over all sections.
    pub totals: RewriteStats,
    /// Per-section reports.
    pub sections: Vec<SectionReport>,
    /// Problems worth a look.
    pub warnings: Vec<String>,
}

/// The outcome of a run.
#[derive(Debug, Serialize)]
#[serde(tag = "command", rename_all = "kebab-case")]
pub enum RunReport {
    WidthFix(WidthFixRun),
    Namespace(NamespaceRun),
}

impl RunReport {
    /// Returns the warnings collected during the run.
    pub fn warnings(&self) -> &[String] {
        match self {
            RunReport::WidthFix(run) => &run.warnings,
            RunReport::Namespace(run) => &run.warnings,
        }
    }

    /// Returns whether the stylesheet was written.
    pub fn written(&self) -> bool {
        match self {
            RunReport::WidthFix(run) => run.written,
            RunReport::Namespace(run) => run.written,
        }
    }
}

/// Formats run reports for output.
pub struct Formatter {
    format: OutputFormat,
}

impl Formatter {
    /// Creates a new formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a report.
    pub fn format(&self, report: &RunReport) -> String {
        match self.format {
            OutputFormat::Human => match report {
                RunReport::WidthFix(run) => format_width_fix(run),
                RunReport::Namespace(run) => format_namespace(run),
            },
            OutputFormat::Json => {
                let mut json = serde_json::to_string_pretty(report).unwrap_or_default();
                json.push('\n');
                json
            }
        }
    }
}

fn format_width_fix(run: &WidthFixRun) -> String {
    let mut output = String::new();

    for target in &run.targets {
        output.push_str(&format!(
            "{}: {} {} matched, {} updated\n",
            target.selector,
            target.matched,
            plural(target.matched, "block", "blocks"),
            target.injected
        ));
    }

    output.push_str(&format!(
        "Width fix applied to {} {} in {}\n",
        run.injected,
        plural(run.injected, "block", "blocks"),
        run.file
    ));
    output.push_str(&write_status(run.written, run.dry_run));
    output
}

fn format_namespace(run: &NamespaceRun) -> String {
    let mut output = String::new();

    for section in &run.sections {
        output.push_str(&format!("Applying {} namespace...\n", section.namespace));
        if section.found {
            output.push_str(&format!(
                "  {} (line {}): {} {} prefixed on {} {}\n",
                section.label,
                section.start_line,
                section.stats.selectors_prefixed,
                plural(section.stats.selectors_prefixed, "selector", "selectors"),
                section.stats.lines_rewritten,
                plural(section.stats.lines_rewritten, "line", "lines"),
            ));
        } else {
            output.push_str(&format!("  {}: marker not found, section empty\n", section.label));
        }
    }

    output.push_str(&format!(
        "Namespacing completed ({}): {} {} prefixed in {}\n",
        run.mode,
        run.totals.selectors_prefixed,
        plural(run.totals.selectors_prefixed, "selector", "selectors"),
        run.file
    ));
    output.push_str(&format!("Total lines: {}\n", run.total_lines));
    output.push_str(&write_status(run.written, run.dry_run));
    output
}

fn write_status(written: bool, dry_run: bool) -> String {
    if dry_run {
        "Dry run: nothing written\n".to_string()
    } else if written {
        String::new()
    } else {
        "No changes; file left as is\n".to_string()
    }
}

fn plural<'a>(count: usize, one: &'a str, many: &'a str) -> &'a str {
    if count == 1 {
        one
    } else {
        many
    }
}
