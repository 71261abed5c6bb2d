/// Core domain types for resource references and their rewrite decisions.
use std::ops::Range;

/// Prefixes that mark a target as already remote or as an in-document anchor.
pub const SKIPPED_TARGET_PREFIXES: [&str; 3] = ["http://", "https://", "#"];

/// A resource reference found in document text by the scanner.
/// `prefix + target + suffix` is always the exact matched text at `span`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference<'t> {
    /// Opening syntax up to and including the delimiter, e.g. `![alt](` or `<img src="`.
    pub prefix: &'t str,
    /// Byte range of the whole match in the scanned text.
    pub span: Range<usize>,
    /// Closing syntax, including any trailing link title.
    pub suffix: &'t str,
    /// Which syntax produced this reference.
    pub syntax: Syntax,
    /// Raw target as written in the document.
    pub target: &'t str,
}

impl Reference<'_> {
    /// Whether the target is an absolute URL or a pure anchor.
    pub fn is_remote_or_anchor(&self) -> bool {
        return has_skipped_prefix(self.target);
    }

    /// The reference rebuilt around a different target.
    pub fn with_target(&self, target: &str) -> String {
        return format!("{}{target}{}", self.prefix, self.suffix);
    }
}

/// Outcome of deciding what to do with one reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rewrite {
    /// The target was uploaded and should point at this URL.
    Replaced(String),
    /// The original text stays as written.
    Unchanged,
}

/// Reference syntax kinds the scanner recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syntax {
    /// `<img ... src="...">`
    HtmlImg,
    /// `[text](target)` or `![alt](target)`
    Markdown,
}

/// Whether `target`, ignoring surrounding whitespace, starts with a skipped prefix.
pub fn has_skipped_prefix(target: &str) -> bool {
    let trimmed = target.trim();
    return SKIPPED_TARGET_PREFIXES
        .iter()
        .any(|prefix| return trimmed.starts_with(prefix));
}
