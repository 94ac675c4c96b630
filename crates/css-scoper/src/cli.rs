//! CLI argument parsing.

use camino::Utf8PathBuf;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use css_rewrite::RewriteMode;

/// Scope page stylesheets with namespace classes and patch dashboard layout blocks.
#[derive(Debug, Parser)]
#[command(name = "css-scoper")]
#[command(version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Directory that relative stylesheet paths resolve against
    #[arg(long, default_value = ".", global = true)]
    pub workspace: Utf8PathBuf,

    /// Config file, relative to the workspace (default: css-scoper.json when present)
    #[arg(long, global = true)]
    pub config: Option<Utf8PathBuf>,

    /// Stylesheet to process instead of the configured one
    #[arg(long, global = true)]
    pub file: Option<Utf8PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "human", global = true)]
    pub output: OutputFormat,

    /// Transform and report without writing the stylesheet
    #[arg(long = "dry-run", global = true)]
    pub dry_run: bool,

    /// Namespace the remaining sections when a section marker is missing
    #[arg(long = "allow-missing-markers", global = true)]
    pub allow_missing_markers: bool,

    /// Exit with error on warnings
    #[arg(long = "fail-on-warnings", global = true)]
    pub fail_on_warnings: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

/// What to run.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Add the fallback width declaration to blocks that lack one
    WidthFix,

    /// Prefix the selectors of each stylesheet section with its namespace
    Namespace {
        /// Job name: pages, dashboards, or one defined in the config file
        job: String,

        /// Override the job's scanner mode
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,
    },
}

/// Output format options.
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    #[default]
    Human,
    /// JSON output
    Json,
}

/// Scanner mode as spelled on the command line.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum ModeArg {
    /// Rewrite every selector line, keyframe steps included
    Plain,
    /// Skip keyframes bodies and already-namespaced selectors
    KeyframeAware,
    /// Track brace nesting and keep indentation
    BraceDepth,
}

impl From<ModeArg> for RewriteMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Plain => RewriteMode::Plain,
            ModeArg::KeyframeAware => RewriteMode::KeyframeAware,
            ModeArg::BraceDepth => RewriteMode::BraceDepth,
        }
    }
}

impl Args {
    /// Returns the log filter implied by `-v` flags.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_args() {
        let args = Args::parse_from(["css-scoper", "width-fix"]);
        assert_eq!(args.workspace.as_str(), ".");
        assert_eq!(args.output, OutputFormat::Human);
        assert!(matches!(args.command, Command::WidthFix));
        assert!(!args.dry_run);
        assert_eq!(args.log_filter(), "warn");
    }

    #[test]
    fn test_namespace_job() {
        let args = Args::parse_from(["css-scoper", "namespace", "pages"]);
        match args.command {
            Command::Namespace { job, mode } => {
                assert_eq!(job, "pages");
                assert!(mode.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_mode_override() {
        let args = Args::parse_from(["css-scoper", "namespace", "dashboards", "--mode", "brace-depth"]);
        let Command::Namespace { mode, .. } = args.command else {
            panic!("expected namespace command");
        };
        assert_eq!(mode.map(RewriteMode::from), Some(RewriteMode::BraceDepth));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = Args::parse_from([
            "css-scoper",
            "namespace",
            "pages",
            "--workspace",
            "/srv/site",
            "--dry-run",
            "--output",
            "json",
            "-vv",
        ]);
        assert_eq!(args.workspace.as_str(), "/srv/site");
        assert!(args.dry_run);
        assert_eq!(args.output, OutputFormat::Json);
        assert_eq!(args.log_filter(), "debug");
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Args::try_parse_from(["css-scoper"]).is_err());
    }
}
