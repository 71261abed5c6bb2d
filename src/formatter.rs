//! Markdown normalization applied to whole documents before link rewriting.

use crate::error::Error;

/// A pure text-to-text Markdown normalizer.
pub trait Formatter {
    /// Return the canonical form of `text`.
    ///
    /// # Errors
    ///
    /// Implementations return any error describing why the text was rejected;
    /// the corpus reports it as `Error::FormatFailed` with the document path.
    fn normalize(&self, text: &str) -> Result<String, Error>;
}

/// Renders documents back out through comrak's CommonMark writer: `-` list
/// markers, fenced code blocks, no hard wrapping. GFM tables, strikethrough,
/// task lists, and footnotes are parsed so they survive the round trip.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommonMarkFormatter;

impl Formatter for CommonMarkFormatter {
    fn normalize(&self, text: &str) -> Result<String, Error> {
        let mut options = comrak::Options::default();
        options.extension.footnotes = true;
        options.extension.strikethrough = true;
        options.extension.table = true;
        options.extension.tasklist = true;
        return Ok(comrak::markdown_to_commonmark(text, &options));
    }
}
