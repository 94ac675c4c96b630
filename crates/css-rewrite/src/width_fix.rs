//! Fallback `width` injection.
//!
//! Dashboard layouts lean on `width: calc(100% - var(--sidebar-width))` for
//! their main content column. Some namespaced `.main-content` blocks lost the
//! declaration; [`WidthFix`] appends it to every matching block that has no
//! `width` yet.

use crate::error::RewriteError;
use log::debug;
use regex::{Captures, Regex};

/// Selectors patched when no targets are configured.
pub const DEFAULT_TARGETS: [&str; 2] = [
    ".operator-dash .main-content",
    ".visitor-dash .main-content",
];

/// Declaration injected when none is configured.
pub const DEFAULT_DECLARATION: &str = "width: calc(100% - var(--sidebar-width))";

/// Indentation of the injected declaration.
const INDENT: &str = "    ";

/// What happened to one target selector.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct TargetReport {
    /// The selector as configured.
    pub selector: String,
    /// Blocks that matched the selector.
    pub matched: usize,
    /// Blocks that received the declaration.
    pub injected: usize,
}

/// Outcome of a width-fix pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct WidthFixReport {
    /// One entry per target, in configuration order.
    pub targets: Vec<TargetReport>,
}

impl WidthFixReport {
    /// Total number of blocks that received the declaration.
    pub fn injected(&self) -> usize {
        self.targets.iter().map(|t| t.injected).sum()
    }

    /// Targets that matched no block at all.
    pub fn unmatched(&self) -> impl Iterator<Item = &TargetReport> {
        self.targets.iter().filter(|t| t.matched == 0)
    }
}

#[derive(Debug, Clone)]
struct Target {
    selector: String,
    pattern: Regex,
}

/// Injects a declaration into selector blocks that lack its property.
#[derive(Debug, Clone)]
pub struct WidthFix {
    targets: Vec<Target>,
    declaration: String,
    needles: [String; 2],
}

impl WidthFix {
    /// Builds a pass for the given selectors and declaration.
    ///
    /// The declaration may carry a trailing `;`; it is normalised away.
    pub fn new<I, S>(selectors: I, declaration: &str) -> Result<Self, RewriteError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let declaration = declaration.trim().trim_end_matches(';').trim_end();
        let property = match declaration.split_once(':') {
            Some((property, value)) if !property.trim().is_empty() && !value.trim().is_empty() => {
                property.trim()
            }
            _ => {
                return Err(RewriteError::InvalidDeclaration {
                    declaration: declaration.to_string(),
                })
            }
        };

        let targets = selectors
            .into_iter()
            .map(|selector| Target::new(selector.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            targets,
            needles: [format!("{}:", property), format!("{} :", property)],
            declaration: declaration.to_string(),
        })
    }

    /// Builds the pass for the two dashboard `.main-content` blocks.
    pub fn dashboards() -> Result<Self, RewriteError> {
        Self::new(DEFAULT_TARGETS, DEFAULT_DECLARATION)
    }

    /// Returns the declaration without its trailing semicolon.
    pub fn declaration(&self) -> &str {
        &self.declaration
    }

    /// Applies every target in order and returns the new text.
    ///
    /// Blocks that already declare the property are left byte-identical, so
    /// applying the pass to its own output changes nothing.
    pub fn apply(&self, text: &str) -> (String, WidthFixReport) {
        let mut content = text.to_string();
        let mut report = WidthFixReport::default();

        for target in &self.targets {
            let mut matched = 0;
            let mut injected = 0;

            let replaced = target.pattern.replace_all(&content, |caps: &Captures| {
                matched += 1;
                let body = &caps[1];
                if self.has_property(body) {
                    return caps[0].to_string();
                }

                injected += 1;
                let mut body = body.trim_end().to_string();
                if !body.ends_with(';') && !body.ends_with('{') {
                    body.push(';');
                }
                format!("{}\n{}{};\n{}", body, INDENT, self.declaration, &caps[2])
            });
            content = replaced.into_owned();

            debug!(
                "{}: {} matched, {} injected",
                target.selector, matched, injected
            );
            report.targets.push(TargetReport {
                selector: target.selector.clone(),
                matched,
                injected,
            });
        }

        (content, report)
    }

    fn has_property(&self, body: &str) -> bool {
        self.needles.iter().any(|needle| body.contains(needle.as_str()))
    }
}

impl Target {
    fn new(selector: &str) -> Result<Self, RewriteError> {
        let tokens: Vec<String> = selector.split_whitespace().map(regex::escape).collect();
        if tokens.is_empty() {
            return Err(RewriteError::InvalidSelector {
                selector: selector.to_string(),
                message: "selector is empty".to_string(),
            });
        }

        // Group 1 runs from the selector to just before the closing brace,
        // group 2 is the brace plus the whitespace character after it.
        let source = format!(r"({}\s*\{{\s*[^}}]*?)(\}}(?:\s|\z))", tokens.join(r"\s+"));
        let pattern = Regex::new(&source).map_err(|e| RewriteError::InvalidSelector {
            selector: selector.to_string(),
            message: e.to_string(),
        })?;

        Ok(Self {
            selector: selector.to_string(),
            pattern,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_injects_missing_width() {
        let input = ".operator-dash .main-content {\n  padding: 1rem;\n}\n";
        let (output, report) = WidthFix::dashboards().unwrap().apply(input);
        assert_eq!(
            output,
            ".operator-dash .main-content {\n  padding: 1rem;\n    width: calc(100% - var(--sidebar-width));\n}\n"
        );
        assert_eq!(report.injected(), 1);
        assert_eq!(report.unmatched().count(), 1);
    }

    #[test]
    fn test_block_at_end_of_file() {
        let input = ".operator-dash .main-content {\n  padding: 1rem;\n}";
        let (output, _) = WidthFix::dashboards().unwrap().apply(input);
        assert_eq!(
            output,
            ".operator-dash .main-content {\n  padding: 1rem;\n    width: calc(100% - var(--sidebar-width));\n}"
        );
    }

    #[test]
    fn test_adds_missing_semicolon() {
        let input = ".visitor-dash  .main-content{ margin-left: 240px }\n";
        let (output, _) = WidthFix::dashboards().unwrap().apply(input);
        assert_eq!(
            output,
            ".visitor-dash  .main-content{ margin-left: 240px;\n    width: calc(100% - var(--sidebar-width));\n}\n"
        );
    }

    #[test]
    fn test_existing_width_untouched() {
        let input = ".operator-dash .main-content {\n  width : 100%;\n}\n.visitor-dash .main-content {\n  width: auto;\n}\n";
        let (output, report) = WidthFix::dashboards().unwrap().apply(input);
        assert_eq!(output, input);
        assert_eq!(report.injected(), 0);
        assert!(report.targets.iter().all(|t| t.matched == 1));
    }

    #[test]
    fn test_idempotent() {
        let input = ".operator-dash .main-content {\n  padding: 1rem;\n}\n\n.visitor-dash .main-content {\n}\n";
        let fix = WidthFix::dashboards().unwrap();
        let (once, _) = fix.apply(input);
        let (twice, report) = fix.apply(&once);
        assert_eq!(once, twice);
        assert_eq!(report.injected(), 0);
        assert_eq!(once.matches("width:").count(), 2);
    }

    #[test]
    fn test_empty_body() {
        let input = ".visitor-dash .main-content {\n}\n";
        let (output, _) = WidthFix::dashboards().unwrap().apply(input);
        assert_eq!(
            output,
            ".visitor-dash .main-content {\n    width: calc(100% - var(--sidebar-width));\n}\n"
        );
    }

    #[test]
    fn test_no_match_is_reported() {
        let input = ".family-dash .main-content {\n  padding: 0;\n}\n";
        let (output, report) = WidthFix::dashboards().unwrap().apply(input);
        assert_eq!(output, input);
        assert_eq!(report.unmatched().count(), 2);
    }

    #[test]
    fn test_custom_declaration() {
        let fix = WidthFix::new([".page .grid"], "  min-height: 100vh; ").unwrap();
        assert_eq!(fix.declaration(), "min-height: 100vh");
        let (output, _) = fix.apply(".page .grid {\n  display: grid;\n}\n");
        assert_eq!(
            output,
            ".page .grid {\n  display: grid;\n    min-height: 100vh;\n}\n"
        );
    }

    #[test]
    fn test_invalid_configuration() {
        assert!(matches!(
            WidthFix::new(["   "], DEFAULT_DECLARATION),
            Err(RewriteError::InvalidSelector { .. })
        ));
        assert!(matches!(
            WidthFix::new(DEFAULT_TARGETS, "width"),
            Err(RewriteError::InvalidDeclaration { .. })
        ));
    }
}
