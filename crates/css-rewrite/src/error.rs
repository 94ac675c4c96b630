//! Rewrite error types.

use thiserror::Error;

/// An error raised while preparing or applying a stylesheet rewrite.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RewriteError {
    /// A width-fix target selector could not be turned into a pattern.
    #[error("invalid target selector `{selector}`: {message}")]
    InvalidSelector {
        /// The selector as configured.
        selector: String,
        /// Why the pattern was rejected.
        message: String,
    },

    /// A declaration did not have the `property: value` shape.
    #[error("invalid declaration `{declaration}`: expected `property: value`")]
    InvalidDeclaration {
        /// The declaration as configured.
        declaration: String,
    },

    /// One or more section markers do not occur in the stylesheet.
    #[error("section marker not found: {}", format_markers(.markers))]
    MarkerNotFound {
        /// The markers that were searched for and not found.
        markers: Vec<String>,
    },

    /// A marker occurs before the marker of an earlier section.
    #[error("section marker `{marker}` at offset {offset} precedes the previous section start at {previous}")]
    MarkerOutOfOrder {
        /// The offending marker.
        marker: String,
        /// Where it was found.
        offset: usize,
        /// Where the previous section starts.
        previous: usize,
    },

    /// A section boundary has an empty marker, which would match anywhere.
    #[error("section `{namespace}` has an empty marker")]
    EmptyMarker {
        /// Namespace of the section.
        namespace: String,
    },

    /// A namespace prefix was empty or whitespace.
    #[error("namespace prefix must not be empty")]
    EmptyNamespace,
}

/// Returns the last non-empty line of a marker, trimmed. Markers usually
/// span a banner comment and only that line is worth showing.
pub fn marker_label(marker: &str) -> &str {
    marker
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or(marker)
}

fn format_markers(markers: &[String]) -> String {
    markers
        .iter()
        .map(|m| format!("`{}`", marker_label(m)))
        .collect::<Vec<_>>()
        .join(", ")
}
