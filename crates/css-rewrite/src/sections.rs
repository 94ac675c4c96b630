//! Locating page sections inside a concatenated stylesheet.
//!
//! Sections are found by literal substring search for their marker (usually
//! the banner comment that opens them). The first section has no marker and
//! starts at the top of the file; every other section runs from its marker to
//! the next marker that was found.

use crate::error::{marker_label, RewriteError};
use log::debug;
use text_size::{TextRange, TextSize};

/// Where one section starts and which namespace it gets.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SectionBoundary {
    /// Literal text that opens the section.
    pub marker: String,
    /// Namespace class for the section.
    pub namespace: String,
}

impl SectionBoundary {
    /// Creates a new boundary.
    pub fn new(marker: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
            namespace: namespace.into(),
        }
    }
}

/// The ordered layout of a concatenated stylesheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionPlan {
    /// Namespace of the leading section, which starts at offset 0.
    pub namespace: String,
    /// Boundaries of the following sections, in file order.
    pub boundaries: Vec<SectionBoundary>,
}

impl SectionPlan {
    /// Creates a plan with only a leading section.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            boundaries: Vec::new(),
        }
    }

    /// Appends a section boundary.
    pub fn then(mut self, marker: impl Into<String>, namespace: impl Into<String>) -> Self {
        self.boundaries.push(SectionBoundary::new(marker, namespace));
        self
    }

    /// Returns the number of sections the plan describes.
    pub fn len(&self) -> usize {
        self.boundaries.len() + 1
    }

    /// Always false; a plan has at least its leading section.
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// A located section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Namespace class for the section.
    pub namespace: String,
    /// The marker that opens the section, `None` for the leading section.
    pub marker: Option<String>,
    /// Byte range of the section in the source.
    pub range: TextRange,
    /// False when the marker was not found and the section is empty.
    pub found: bool,
}

impl Section {
    /// Returns the section's text.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.range]
    }

    /// Returns a short label for reports.
    pub fn label(&self) -> &str {
        self.marker.as_deref().map(marker_label).unwrap_or("(start of file)")
    }
}

/// The result of splitting a stylesheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionSplit {
    /// One entry per planned section, in plan order.
    pub sections: Vec<Section>,
    /// Markers that were not found.
    pub missing: Vec<String>,
    /// Markers that occur more than once; only the first occurrence is used.
    pub duplicates: Vec<String>,
}

impl SectionSplit {
    /// Fails if any marker was not found.
    pub fn require_all(&self) -> Result<(), RewriteError> {
        if self.missing.is_empty() {
            Ok(())
        } else {
            Err(RewriteError::MarkerNotFound {
                markers: self.missing.clone(),
            })
        }
    }
}

/// Splits `text` into the sections described by `plan`.
///
/// Concatenating the text of every returned section reproduces `text`. A
/// missing marker produces an empty section and the section before it runs on
/// to the next marker that was found.
pub fn split_sections(text: &str, plan: &SectionPlan) -> Result<SectionSplit, RewriteError> {
    let mut starts: Vec<Option<usize>> = Vec::with_capacity(plan.len());
    starts.push(Some(0));

    let mut missing = Vec::new();
    let mut duplicates = Vec::new();
    let mut previous = 0;

    for boundary in &plan.boundaries {
        if boundary.marker.is_empty() {
            return Err(RewriteError::EmptyMarker {
                namespace: boundary.namespace.clone(),
            });
        }

        match text.find(&boundary.marker) {
            Some(offset) => {
                if offset < previous {
                    return Err(RewriteError::MarkerOutOfOrder {
                        marker: marker_label(&boundary.marker).to_string(),
                        offset,
                        previous,
                    });
                }
                if text[offset + boundary.marker.len()..].contains(&boundary.marker) {
                    duplicates.push(boundary.marker.clone());
                }
                previous = offset;
                starts.push(Some(offset));
            }
            None => {
                debug!("marker not found: {}", marker_label(&boundary.marker));
                missing.push(boundary.marker.clone());
                starts.push(None);
            }
        }
    }

    let namespaces = std::iter::once((&plan.namespace, None))
        .chain(plan.boundaries.iter().map(|b| (&b.namespace, Some(&b.marker))));

    // Walk backwards so each section knows where the next found one starts.
    let mut end = text.len();
    let mut ranges = vec![TextRange::default(); starts.len()];
    for (i, start) in starts.iter().enumerate().rev() {
        ranges[i] = match start {
            Some(start) => {
                let range = TextRange::new(offset(*start), offset(end));
                end = *start;
                range
            }
            None => TextRange::empty(offset(end)),
        };
    }

    let sections = namespaces
        .zip(starts.iter().zip(ranges))
        .map(|((namespace, marker), (start, range))| {
            debug!(
                "section {}: {:?} ({} bytes)",
                namespace,
                range,
                u32::from(range.len())
            );
            Section {
                namespace: namespace.clone(),
                marker: marker.cloned(),
                range,
                found: start.is_some(),
            }
        })
        .collect();

    Ok(SectionSplit {
        sections,
        missing,
        duplicates,
    })
}

fn offset(value: usize) -> TextSize {
    TextSize::from(value as u32)
}
