//! Line-oriented stylesheet fixups for css-scoper.
//!
//! This crate holds the text transformations, with no file I/O:
//! - Line classification by prefix checks (`classify`)
//! - Section location by comment-marker search (`sections`)
//! - Selector namespacing in three scanner modes (`namespace`)
//! - Fallback declaration injection (`width_fix`)
//!
//! It is not a CSS parser. Selectors split over several lines, braces inside
//! strings and other unusual layouts are handled by what their lines look
//! like, not by what they mean.
//!
//! # Example
//!
//! ```
//! use css_rewrite::{namespace_stylesheet, RewriteMode, SectionPlan};
//!
//! let css = ".card {\n}\n/* CART PAGE STYLES */\n.total {\n}\n";
//! let plan = SectionPlan::new(".auth-page").then("/* CART PAGE STYLES", ".cart-page");
//!
//! let result = namespace_stylesheet(css, &plan, RewriteMode::KeyframeAware).unwrap();
//! assert_eq!(
//!     result.text,
//!     ".auth-page .card {\n}\n/* CART PAGE STYLES */\n.cart-page .total {\n}\n"
//! );
//! ```

mod classify;
mod error;
mod line_index;
mod namespace;
mod sections;
mod width_fix;

pub use classify::{classify, is_grouping_rule, is_keyframes_rule, LineKind};
pub use error::{marker_label, RewriteError};
pub use line_index::LineIndex;
pub use namespace::{add_namespace, NamespaceRewriter, RewriteMode, RewriteStats, Rewritten};
pub use sections::{split_sections, Section, SectionBoundary, SectionPlan, SectionSplit};
pub use width_fix::{
    TargetReport, WidthFix, WidthFixReport, DEFAULT_DECLARATION, DEFAULT_TARGETS,
};

/// Per-section outcome of [`namespace_stylesheet`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct SectionReport {
    /// Namespace applied to the section.
    pub namespace: String,
    /// Short form of the section's marker.
    pub label: String,
    /// False when the marker was missing and the section was empty.
    pub found: bool,
    /// 1-indexed line in the input where the section starts.
    pub start_line: usize,
    /// Rewrite counters.
    pub stats: RewriteStats,
}

/// The result of namespacing a whole stylesheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespacedStylesheet {
    /// The rewritten stylesheet.
    pub text: String,
    /// One report per planned section.
    pub sections: Vec<SectionReport>,
    /// Markers that were not found.
    pub missing: Vec<String>,
    /// Markers that occur more than once.
    pub duplicates: Vec<String>,
}

impl NamespacedStylesheet {
    /// Sums the counters of every section.
    pub fn totals(&self) -> RewriteStats {
        let mut totals = RewriteStats::default();
        for section in &self.sections {
            totals += section.stats;
        }
        totals
    }

    /// Number of lines in the rewritten stylesheet.
    pub fn line_count(&self) -> usize {
        LineIndex::new(&self.text).line_count()
    }
}

/// Splits `text` by `plan` and namespaces every section with its own
/// rewriter. Scanner state starts fresh for each section.
///
/// Missing markers are reported, not rejected; call
/// [`SectionSplit::require_all`] or inspect `missing` to be strict.
pub fn namespace_stylesheet(
    text: &str,
    plan: &SectionPlan,
    mode: RewriteMode,
) -> Result<NamespacedStylesheet, RewriteError> {
    let split = split_sections(text, plan)?;
    let line_index = LineIndex::new(text);

    let mut output = String::with_capacity(text.len() + text.len() / 8);
    let mut sections = Vec::with_capacity(split.sections.len());

    for section in &split.sections {
        let rewriter = NamespaceRewriter::new(section.namespace.as_str(), mode)?;
        let rewritten = rewriter.rewrite(section.text(text));
        output.push_str(&rewritten.text);

        sections.push(SectionReport {
            namespace: rewriter.namespace().to_string(),
            label: section.label().to_string(),
            found: section.found,
            start_line: line_index.line_number(section.range.start()),
            stats: rewritten.stats,
        });
    }

    Ok(NamespacedStylesheet {
        text: output,
        sections,
        missing: split.missing,
        duplicates: split.duplicates,
    })
}
