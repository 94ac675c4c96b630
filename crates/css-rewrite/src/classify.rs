//! Line classification.
//!
//! Every decision the rewriter makes is driven by a cheap prefix check on the
//! trimmed line. There is no tokenizer: a selector list split across several
//! lines, or a brace inside a string, is classified by whatever its line looks
//! like.

use once_cell::sync::Lazy;
use regex::Regex;

/// Matches `@keyframes` and its vendor-prefixed spellings.
static KEYFRAMES_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^@(?:-[a-z]+-)?keyframes\b").unwrap());

/// Matches at-rules whose block contains ordinary style rules.
static GROUPING_RULE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^@(?:media|supports|container|layer|document)\b").unwrap());

/// What a single line of a stylesheet looks like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineKind {
    /// Empty or whitespace only.
    Blank,
    /// Starts with `/*` or `*/`.
    Comment,
    /// Starts with `*` and contains `{`: the inside of a comment block, or a
    /// universal selector rule. Both are left alone.
    CommentBrace,
    /// Starts with `@media`.
    AtMedia,
    /// Starts with `@keyframes`.
    AtKeyframes,
    /// Any other at-rule (`@import`, `@font-face`, `@-webkit-keyframes`, ...).
    AtRule,
    /// Starts with `:root`.
    Root,
    /// `body {`, `body {...` or `body.rtl...`.
    Body,
    /// Exactly `}`.
    LoneClose,
    /// Contains `{` and does not start with `}`.
    Selector,
    /// Declarations, closing braces followed by text, selector continuations.
    Other,
}

impl LineKind {
    /// Returns whether lines of this kind are never rewritten.
    pub fn is_excluded(self) -> bool {
        !matches!(self, LineKind::Selector | LineKind::Other | LineKind::LoneClose)
    }
}

/// Classifies one line (without its trailing newline).
pub fn classify(line: &str) -> LineKind {
    let stripped = line.trim();

    if stripped.is_empty() {
        LineKind::Blank
    } else if stripped.starts_with("/*") || stripped.starts_with("*/") {
        LineKind::Comment
    } else if stripped.starts_with('*') && stripped.contains('{') {
        LineKind::CommentBrace
    } else if stripped.starts_with("@media") {
        LineKind::AtMedia
    } else if stripped.starts_with("@keyframes") {
        LineKind::AtKeyframes
    } else if stripped.starts_with('@') {
        LineKind::AtRule
    } else if stripped.starts_with(":root") {
        LineKind::Root
    } else if stripped.starts_with("body {") || stripped.starts_with("body.rtl") {
        LineKind::Body
    } else if stripped == "}" {
        LineKind::LoneClose
    } else if stripped.contains('{') && !stripped.starts_with('}') {
        LineKind::Selector
    } else {
        LineKind::Other
    }
}

/// Returns whether the line opens a keyframes block, vendor prefixes included.
pub fn is_keyframes_rule(line: &str) -> bool {
    KEYFRAMES_RE.is_match(line.trim_start())
}

/// Returns whether the line opens an at-rule whose body holds style rules.
pub fn is_grouping_rule(line: &str) -> bool {
    GROUPING_RULE_RE.is_match(line.trim_start())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_and_comments() {
        assert_eq!(classify(""), LineKind::Blank);
        assert_eq!(classify("   \t"), LineKind::Blank);
        assert_eq!(classify("/* AUTH PAGE STYLES */"), LineKind::Comment);
        assert_eq!(classify("   */"), LineKind::Comment);
        assert_eq!(classify(" * { box-sizing: border-box; }"), LineKind::CommentBrace);
        assert_eq!(classify(" * note about layout"), LineKind::Other);
    }

    #[test]
    fn test_at_rules() {
        assert_eq!(classify("@media (max-width: 768px) {"), LineKind::AtMedia);
        assert_eq!(classify("@keyframes fadeIn {"), LineKind::AtKeyframes);
        assert_eq!(classify("@import url('base.css');"), LineKind::AtRule);
        assert_eq!(classify("@-webkit-keyframes spin {"), LineKind::AtRule);
    }

    #[test]
    fn test_root_and_body() {
        assert_eq!(classify(":root {"), LineKind::Root);
        assert_eq!(classify("body {"), LineKind::Body);
        assert_eq!(classify("body { margin: 0; }"), LineKind::Body);
        assert_eq!(classify("body.rtl .sidebar {"), LineKind::Body);
        // Only the exact forms are treated as the document body.
        assert_eq!(classify("body{"), LineKind::Selector);
        assert_eq!(classify("body > main {"), LineKind::Selector);
    }

    #[test]
    fn test_selectors_and_other() {
        assert_eq!(classify(".card, .card-header {"), LineKind::Selector);
        assert_eq!(classify("  .btn:hover { color: red; }"), LineKind::Selector);
        assert_eq!(classify("}"), LineKind::LoneClose);
        assert_eq!(classify("  }  "), LineKind::LoneClose);
        assert_eq!(classify("} .next {"), LineKind::Other);
        assert_eq!(classify("  padding: 1rem;"), LineKind::Other);
        assert_eq!(classify(".card,"), LineKind::Other);
    }

    #[test]
    fn test_excluded_kinds() {
        assert!(LineKind::Blank.is_excluded());
        assert!(LineKind::AtMedia.is_excluded());
        assert!(LineKind::Body.is_excluded());
        assert!(!LineKind::Selector.is_excluded());
        assert!(!LineKind::Other.is_excluded());
    }

    #[test]
    fn test_keyframes_and_grouping_rules() {
        assert!(is_keyframes_rule("@keyframes pulse {"));
        assert!(is_keyframes_rule("  @-webkit-keyframes pulse {"));
        assert!(!is_keyframes_rule("@keyframesish {"));
        assert!(is_grouping_rule("@media screen {"));
        assert!(is_grouping_rule("@supports (display: grid) {"));
        assert!(!is_grouping_rule("@font-face {"));
    }
}
