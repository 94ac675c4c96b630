//! Selector namespacing.
//!
//! A [`NamespaceRewriter`] scans one section of a stylesheet line by line and
//! prefixes each selector of every qualifying rule line with the section's
//! namespace class, so `.card, .card-header {` becomes
//! `.auth-page .card, .auth-page .card-header {`.

use crate::classify::{classify, is_grouping_rule, is_keyframes_rule, LineKind};
use crate::error::RewriteError;
use log::debug;
use std::ops::AddAssign;

/// Which scanner decides when a selector line is rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum RewriteMode {
    /// Stateless: every selector line outside the excluded kinds is
    /// prefixed, keyframe steps included, and prefixes may be doubled.
    Plain,
    /// Suspends rewriting between `@keyframes` and the next lone `}` and
    /// skips selectors that already start with the namespace. `@media`
    /// blocks are counted but do not change any decision.
    #[default]
    KeyframeAware,
    /// Tracks brace nesting. Keyframes bodies are skipped until their
    /// closing brace, selectors nested in grouping at-rules are rewritten,
    /// lines nested inside a style rule are not, and indentation is kept.
    BraceDepth,
}

impl RewriteMode {
    /// Returns the mode's name as used in configuration files.
    pub fn as_str(&self) -> &'static str {
        match self {
            RewriteMode::Plain => "plain",
            RewriteMode::KeyframeAware => "keyframe-aware",
            RewriteMode::BraceDepth => "brace-depth",
        }
    }
}

impl std::fmt::Display for RewriteMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Counters collected while rewriting a section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct RewriteStats {
    /// Lines scanned.
    pub lines: usize,
    /// Lines whose text changed.
    pub lines_rewritten: usize,
    /// Selectors that received the namespace.
    pub selectors_prefixed: usize,
    /// Selectors left alone because they already start with the namespace.
    pub already_namespaced: usize,
    /// `@media` lines seen.
    pub media_blocks: usize,
    /// Keyframes blocks entered.
    pub keyframes_blocks: usize,
    /// Lines passed through because they sit inside a keyframes block.
    pub keyframe_lines_skipped: usize,
}

impl AddAssign for RewriteStats {
    fn add_assign(&mut self, other: Self) {
        self.lines += other.lines;
        self.lines_rewritten += other.lines_rewritten;
        self.selectors_prefixed += other.selectors_prefixed;
        self.already_namespaced += other.already_namespaced;
        self.media_blocks += other.media_blocks;
        self.keyframes_blocks += other.keyframes_blocks;
        self.keyframe_lines_skipped += other.keyframe_lines_skipped;
    }
}

/// The result of rewriting one section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewritten {
    /// The rewritten text.
    pub text: String,
    /// What happened along the way.
    pub stats: RewriteStats,
}

/// Prefixes selectors with a namespace class.
#[derive(Debug, Clone)]
pub struct NamespaceRewriter {
    namespace: String,
    mode: RewriteMode,
}

/// How a selector line is rebuilt.
#[derive(Debug, Clone, Copy)]
struct LineStyle {
    /// Leave selectors that already carry the namespace untouched.
    guard: bool,
    /// Keep the line's leading whitespace.
    keep_indent: bool,
}

/// Finds the braces of a line that are real CSS syntax, skipping those in
/// comments and quoted strings. Comments may span lines; strings may not.
#[derive(Debug, Default)]
struct BraceScanner {
    in_comment: bool,
}

impl BraceScanner {
    fn scan(&mut self, line: &str, mut on_brace: impl FnMut(char)) {
        let mut chars = line.chars().peekable();
        let mut quote: Option<char> = None;

        while let Some(c) = chars.next() {
            if self.in_comment {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    self.in_comment = false;
                }
                continue;
            }
            if let Some(q) = quote {
                if c == '\\' {
                    chars.next();
                } else if c == q {
                    quote = None;
                }
                continue;
            }
            match c {
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    self.in_comment = true;
                }
                '"' | '\'' => quote = Some(c),
                '{' | '}' => on_brace(c),
                _ => {}
            }
        }
    }
}

/// Block kinds tracked by the brace-depth scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    /// `@media`, `@supports` and friends: holds style rules.
    Group,
    /// A keyframes block: holds keyframe selectors.
    Keyframes,
    /// A style rule or any other at-rule: holds declarations.
    Rule,
}

impl NamespaceRewriter {
    /// Creates a rewriter for the given namespace class.
    pub fn new(namespace: impl Into<String>, mode: RewriteMode) -> Result<Self, RewriteError> {
        let namespace = namespace.into().trim().to_string();
        if namespace.is_empty() {
            return Err(RewriteError::EmptyNamespace);
        }
        Ok(Self { namespace, mode })
    }

    /// Returns the namespace prefix.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the scanner mode.
    pub fn mode(&self) -> RewriteMode {
        self.mode
    }

    /// Rewrites a section. Lines are split on `\n` and rejoined with `\n`,
    /// so the presence or absence of a trailing newline is preserved.
    pub fn rewrite(&self, text: &str) -> Rewritten {
        let mut stats = RewriteStats::default();
        let lines: Vec<String> = match self.mode {
            RewriteMode::Plain => self.scan_plain(text, &mut stats),
            RewriteMode::KeyframeAware => self.scan_keyframe_aware(text, &mut stats),
            RewriteMode::BraceDepth => self.scan_brace_depth(text, &mut stats),
        };

        stats.lines = lines.len();
        debug!(
            "{} ({}): {} selectors prefixed on {} of {} lines",
            self.namespace, self.mode, stats.selectors_prefixed, stats.lines_rewritten, stats.lines
        );

        Rewritten {
            text: lines.join("\n"),
            stats,
        }
    }

    fn scan_plain(&self, text: &str, stats: &mut RewriteStats) -> Vec<String> {
        let style = LineStyle {
            guard: false,
            keep_indent: false,
        };

        text.split('\n')
            .map(|line| match classify(line) {
                LineKind::Selector => self.rewrite_line(line, style, stats),
                LineKind::AtMedia => {
                    stats.media_blocks += 1;
                    line.to_string()
                }
                _ => line.to_string(),
            })
            .collect()
    }

    fn scan_keyframe_aware(&self, text: &str, stats: &mut RewriteStats) -> Vec<String> {
        let style = LineStyle {
            guard: true,
            keep_indent: false,
        };
        let mut in_keyframes = false;
        let mut result = Vec::new();

        for line in text.split('\n') {
            let kind = classify(line);
            let output = match kind {
                LineKind::AtMedia => {
                    stats.media_blocks += 1;
                    line.to_string()
                }
                LineKind::AtKeyframes => {
                    in_keyframes = true;
                    stats.keyframes_blocks += 1;
                    line.to_string()
                }
                LineKind::LoneClose if in_keyframes => {
                    in_keyframes = false;
                    line.to_string()
                }
                kind if kind.is_excluded() => line.to_string(),
                _ if in_keyframes => {
                    stats.keyframe_lines_skipped += 1;
                    line.to_string()
                }
                LineKind::Selector => self.rewrite_line(line, style, stats),
                _ => line.to_string(),
            };
            result.push(output);
        }

        result
    }

    fn scan_brace_depth(&self, text: &str, stats: &mut RewriteStats) -> Vec<String> {
        let style = LineStyle {
            guard: true,
            keep_indent: true,
        };
        let mut stack: Vec<Block> = Vec::new();
        let mut scanner = BraceScanner::default();
        let mut result = Vec::new();

        for line in text.split('\n') {
            let kind = classify(line);
            let commented = scanner.in_comment;
            let in_keyframes = stack.contains(&Block::Keyframes);
            let holds_rules = matches!(stack.last(), None | Some(Block::Group));

            let opens = if is_keyframes_rule(line) {
                stats.keyframes_blocks += 1;
                Block::Keyframes
            } else if is_grouping_rule(line) {
                if kind == LineKind::AtMedia {
                    stats.media_blocks += 1;
                }
                Block::Group
            } else {
                Block::Rule
            };

            let output = if in_keyframes {
                if matches!(kind, LineKind::Selector | LineKind::Other) {
                    stats.keyframe_lines_skipped += 1;
                }
                line.to_string()
            } else if kind == LineKind::Selector && holds_rules && !commented {
                self.rewrite_line(line, style, stats)
            } else {
                line.to_string()
            };

            scanner.scan(line, |brace| {
                if brace == '{' {
                    stack.push(opens);
                } else {
                    stack.pop();
                }
            });

            result.push(output);
        }

        result
    }

    /// Rebuilds a selector line with each selector prefixed.
    fn rewrite_line(&self, line: &str, style: LineStyle, stats: &mut RewriteStats) -> String {
        let Some((head, rest)) = line.split_once('{') else {
            return line.to_string();
        };

        let mut selectors = Vec::new();
        let mut prefixed = 0;
        let mut kept = 0;
        for selector in head.split(',') {
            let selector = selector.trim();
            if selector.is_empty() {
                continue;
            }
            if style.guard && selector.starts_with(&self.namespace) {
                kept += 1;
                selectors.push(selector.to_string());
            } else {
                prefixed += 1;
                selectors.push(format!("{} {}", self.namespace, selector));
            }
        }

        if selectors.is_empty() {
            return line.to_string();
        }

        stats.selectors_prefixed += prefixed;
        stats.already_namespaced += kept;

        let indent = if style.keep_indent {
            &line[..line.len() - line.trim_start().len()]
        } else {
            ""
        };
        let gap = &head[head.trim_end().len()..];
        let rewritten = format!("{}{}{}{{{}", indent, selectors.join(", "), gap, rest);

        if rewritten != line {
            stats.lines_rewritten += 1;
        }
        rewritten
    }
}

/// Rewrites `text` with a one-off rewriter.
pub fn add_namespace(text: &str, namespace: &str, mode: RewriteMode) -> Result<Rewritten, RewriteError> {
    Ok(NamespaceRewriter::new(namespace, mode)?.rewrite(text))
}
