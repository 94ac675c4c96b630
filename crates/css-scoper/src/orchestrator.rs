//! Main orchestration logic: read, transform, report, write.

use crate::cli::{Args, Command};
use crate::config::{NamespaceJob, ScoperConfig, WidthFixConfig};
use crate::output::{NamespaceRun, RunReport, WidthFixRun};
use camino::{Utf8Path, Utf8PathBuf};
use css_rewrite::{marker_label, namespace_stylesheet, LineIndex, RewriteError, WidthFix};
use log::info;
use miette::Diagnostic;
use std::fs;
use thiserror::Error;

/// Orchestration errors.
#[derive(Debug, Error, Diagnostic)]
pub enum OrchestratorError {
    /// Failed to read a stylesheet.
    #[error("failed to read {path}")]
    #[diagnostic(
        code(css_scoper::read_failed),
        help("stylesheet paths are resolved against --workspace")
    )]
    ReadFailed {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a stylesheet back.
    #[error("failed to write {path}")]
    #[diagnostic(code(css_scoper::write_failed))]
    WriteFailed {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file could not be read or parsed.
    #[error("invalid config file: {0}")]
    #[diagnostic(code(css_scoper::config))]
    ConfigFailed(String),

    /// No namespace job has the requested name.
    #[error("unknown namespace job `{name}`")]
    #[diagnostic(code(css_scoper::unknown_job), help("available jobs: {available}"))]
    UnknownJob { name: String, available: String },

    /// Section markers are missing from the stylesheet.
    #[error("{path} is missing section markers")]
    #[diagnostic(
        code(css_scoper::missing_markers),
        help("pass --allow-missing-markers to namespace the sections that were found")
    )]
    MissingMarkers {
        path: Utf8PathBuf,
        #[source]
        source: RewriteError,
    },

    /// The configured rewrite is invalid.
    #[error(transparent)]
    #[diagnostic(code(css_scoper::rewrite))]
    Rewrite(#[from] RewriteError),
}

/// Runs the selected command.
pub fn run(args: &Args) -> Result<RunReport, OrchestratorError> {
    let workspace = if args.workspace.is_relative() {
        std::env::current_dir()
            .ok()
            .and_then(|p| Utf8PathBuf::try_from(p).ok())
            .unwrap_or_default()
            .join(&args.workspace)
    } else {
        args.workspace.clone()
    };

    let (config, source) = ScoperConfig::load(&workspace, args.config.as_deref())
        .map_err(OrchestratorError::ConfigFailed)?;
    if let Some(source) = &source {
        info!("loaded config from {}", source);
    }

    match &args.command {
        Command::WidthFix => run_width_fix(args, &workspace, &config.width_fix),
        Command::Namespace { job, mode } => {
            let Some(found) = config.namespaces.get(job) else {
                return Err(OrchestratorError::UnknownJob {
                    name: job.clone(),
                    available: config.job_names(),
                });
            };
            let mut found = found.clone();
            if let Some(mode) = mode {
                found.mode = (*mode).into();
            }
            run_namespace(args, &workspace, job, &found)
        }
    }
}

/// Applies the width fix to the configured stylesheet.
fn run_width_fix(
    args: &Args,
    workspace: &Utf8Path,
    config: &WidthFixConfig,
) -> Result<RunReport, OrchestratorError> {
    let fix = WidthFix::new(&config.selectors, &config.declaration)?;
    let path = resolve(workspace, args.file.as_deref().unwrap_or(&config.file));
    let stylesheet = Stylesheet::read(&path)?;

    let (text, report) = fix.apply(&stylesheet.text);

    let warnings = report
        .unmatched()
        .map(|t| format!("no `{}` block found in {}", t.selector, path))
        .collect();

    let written = stylesheet.write_if_changed(&text, args.dry_run)?;

    Ok(RunReport::WidthFix(WidthFixRun {
        file: path,
        written,
        dry_run: args.dry_run,
        declaration: fix.declaration().to_string(),
        injected: report.injected(),
        targets: report.targets,
        warnings,
    }))
}

/// Namespaces every section of a job's stylesheet.
fn run_namespace(
    args: &Args,
    workspace: &Utf8Path,
    name: &str,
    job: &NamespaceJob,
) -> Result<RunReport, OrchestratorError> {
    let path = resolve(workspace, args.file.as_deref().unwrap_or(&job.file));
    let stylesheet = Stylesheet::read(&path)?;

    let result = namespace_stylesheet(&stylesheet.text, &job.plan(), job.mode)?;

    let mut warnings = Vec::new();
    if !result.missing.is_empty() {
        let source = RewriteError::MarkerNotFound {
            markers: result.missing.clone(),
        };
        if !args.allow_missing_markers {
            return Err(OrchestratorError::MissingMarkers { path, source });
        }
        warnings.push(source.to_string());
    }
    for section in &result.sections {
        let stats = section.stats;
        if section.found && stats.lines > 1 && stats.selectors_prefixed + stats.already_namespaced == 0 {
            warnings.push(format!("section {} has no selectors to namespace", section.namespace));
        }
    }
    for marker in &result.duplicates {
        warnings.push(format!(
            "section marker `{}` occurs more than once; the first occurrence was used",
            marker_label(marker)
        ));
    }

    let written = stylesheet.write_if_changed(&result.text, args.dry_run)?;

    Ok(RunReport::Namespace(NamespaceRun {
        job: name.to_string(),
        file: path,
        mode: job.mode,
        written,
        dry_run: args.dry_run,
        total_lines: LineIndex::new(&result.text).line_count(),
        totals: result.totals(),
        sections: result.sections,
        warnings,
    }))
}

fn resolve(workspace: &Utf8Path, path: &Utf8Path) -> Utf8PathBuf {
    if path.is_relative() {
        workspace.join(path)
    } else {
        path.to_path_buf()
    }
}

/// A stylesheet read into memory. Files that use `\r\n` throughout are
/// normalised to `\n` and restored on write.
struct Stylesheet {
    path: Utf8PathBuf,
    text: String,
    original: String,
    crlf: bool,
}

impl Stylesheet {
    fn read(path: &Utf8Path) -> Result<Self, OrchestratorError> {
        let original = fs::read_to_string(path).map_err(|source| OrchestratorError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        info!("read {} ({} bytes)", path, original.len());

        // Mixed endings are processed as is; `\r` stays at the end of its line.
        let newlines = original.matches('\n').count();
        let crlf = newlines > 0 && original.matches("\r\n").count() == newlines;
        let text = if crlf {
            original.replace("\r\n", "\n")
        } else {
            original.clone()
        };

        Ok(Self {
            path: path.to_path_buf(),
            text,
            original,
            crlf,
        })
    }

    /// Writes `text` back with the original line endings. Returns whether
    /// the file was written.
    fn write_if_changed(&self, text: &str, dry_run: bool) -> Result<bool, OrchestratorError> {
        let content = if self.crlf {
            text.replace('\n', "\r\n")
        } else {
            text.to_string()
        };

        if dry_run || content == self.original {
            info!("{} left unchanged", self.path);
            return Ok(false);
        }

        fs::write(&self.path, &content).map_err(|source| OrchestratorError::WriteFailed {
            path: self.path.clone(),
            source,
        })?;
        info!("wrote {} ({} bytes)", self.path, content.len());
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn workspace_with(file: &str, content: &str) -> (TempDir, Utf8PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
        let path = root.join(file);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        (dir, root)
    }

    fn args(root: &Utf8Path, extra: &[&str]) -> Args {
        let mut argv = vec!["css-scoper", "--workspace", root.as_str()];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn test_width_fix_writes_file() {
        let (_dir, root) = workspace_with(
            "styles/unified-dashboards.css",
            ".operator-dash .main-content {\n  padding: 1rem;\n}\n",
        );

        let report = run(&args(&root, &["width-fix"])).unwrap();
        let RunReport::WidthFix(run) = report else {
            panic!("expected width-fix report");
        };
        assert!(run.written);
        assert_eq!(run.injected, 1);
        assert_eq!(run.warnings.len(), 1);

        let written = fs::read_to_string(root.join("styles/unified-dashboards.css")).unwrap();
        assert!(written.contains("    width: calc(100% - var(--sidebar-width));\n}"));
    }

    #[test]
    fn test_dry_run_leaves_file_alone() {
        let css = ".visitor-dash .main-content {\n}\n";
        let (_dir, root) = workspace_with("styles/unified-dashboards.css", css);

        let report = run(&args(&root, &["width-fix", "--dry-run"])).unwrap();
        assert!(!report.written());
        let on_disk = fs::read_to_string(root.join("styles/unified-dashboards.css")).unwrap();
        assert_eq!(on_disk, css);
    }

    #[test]
    fn test_crlf_line_endings_preserved() {
        let css = ".a {\r\n}\r\n/* ============================================\r\n   BROWSE PAGE STYLES\r\n*/\r\n.b {\r\n}\r\n";
        let (_dir, root) = workspace_with("site.css", css);
        let config = root.join("css-scoper.json");
        fs::write(
            &config,
            format!(
                r#"{{ "namespaces": {{ "site": {{ "file": "site.css", "namespace": ".x",
                    "sections": [{{ "marker": {}, "namespace": ".y" }}] }} }} }}"#,
                serde_json::to_string(&crate::config::banner("BROWSE PAGE STYLES")).unwrap()
            ),
        )
        .unwrap();

        run(&args(&root, &["namespace", "site"])).unwrap();
        let on_disk = fs::read_to_string(root.join("site.css")).unwrap();
        assert_eq!(
            on_disk,
            ".x .a {\r\n}\r\n/* ============================================\r\n   BROWSE PAGE STYLES\r\n*/\r\n.y .b {\r\n}\r\n"
        );
    }

    fn site_job(root: &Utf8Path, marker: &str) {
        fs::write(
            root.join("css-scoper.json"),
            format!(
                r#"{{ "namespaces": {{ "site": {{ "file": "site.css", "namespace": ".x",
                    "sections": [{{ "marker": {}, "namespace": ".y" }}] }} }} }}"#,
                serde_json::to_string(marker).unwrap()
            ),
        )
        .unwrap();
    }

    #[test]
    fn test_mixed_line_endings_kept_per_line() {
        let (_dir, root) = workspace_with("site.css", ".a {\r\n}\n/* SITE */\n.b {\n}\r\n");
        site_job(&root, "/* SITE */");

        run(&args(&root, &["namespace", "site"])).unwrap();
        let on_disk = fs::read_to_string(root.join("site.css")).unwrap();
        assert_eq!(on_disk, ".x .a {\r\n}\n/* SITE */\n.y .b {\n}\r\n");
    }

    #[test]
    fn test_duplicate_marker_warning_uses_marker_label() {
        let (_dir, root) = workspace_with("site.css", ".a {\n}\n\n   SITE\n\n.b {\n}\n\n   SITE\n\n");
        site_job(&root, "\n   SITE\n\n");

        let report = run(&args(&root, &["namespace", "site"])).unwrap();
        assert_eq!(
            report.warnings(),
            ["section marker `SITE` occurs more than once; the first occurrence was used".to_string()]
        );
    }

    #[test]
    fn test_missing_marker_is_an_error() {
        let (_dir, root) = workspace_with("styles/pages-core.css", ".card {\n}\n");

        let err = run(&args(&root, &["namespace", "pages"])).unwrap_err();
        assert!(matches!(err, OrchestratorError::MissingMarkers { .. }));
        let on_disk = fs::read_to_string(root.join("styles/pages-core.css")).unwrap();
        assert_eq!(on_disk, ".card {\n}\n");
    }

    #[test]
    fn test_missing_marker_allowed() {
        let (_dir, root) = workspace_with("styles/pages-core.css", ".card {\n}\n");

        let report = run(&args(&root, &["namespace", "pages", "--allow-missing-markers"])).unwrap();
        assert!(report.written());
        assert_eq!(report.warnings().len(), 1);
        let on_disk = fs::read_to_string(root.join("styles/pages-core.css")).unwrap();
        assert_eq!(on_disk, ".auth-page .card {\n}\n");
    }

    #[test]
    fn test_unknown_job() {
        let (_dir, root) = workspace_with("x.css", "");
        let err = run(&args(&root, &["namespace", "checkout"])).unwrap_err();
        match err {
            OrchestratorError::UnknownJob { name, available } => {
                assert_eq!(name, "checkout");
                assert_eq!(available, "dashboards, pages");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_stylesheet() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
        let err = run(&args(&root, &["width-fix"])).unwrap_err();
        assert!(matches!(err, OrchestratorError::ReadFailed { .. }));
    }

    #[test]
    fn test_file_and_mode_overrides() {
        let (_dir, root) = workspace_with("other.css", "@keyframes a {\n  from {\n}\n.b {\n}\n");

        let report = run(&args(
            &root,
            &["namespace", "dashboards", "--file", "other.css", "--mode", "keyframe-aware", "--allow-missing-markers"],
        ))
        .unwrap();
        let RunReport::Namespace(run) = report else {
            panic!("expected namespace report");
        };
        assert_eq!(run.mode, css_rewrite::RewriteMode::KeyframeAware);
        let on_disk = fs::read_to_string(root.join("other.css")).unwrap();
        assert_eq!(on_disk, "@keyframes a {\n  from {\n}\n.family-dash .b {\n}\n");
    }
}
