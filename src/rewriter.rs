//! Resolve scanned references against a document's directory, upload the
//! local ones, and splice the returned URLs back into the text.
//!
//! Failures are absorbed per reference: a missing file or a failed upload
//! leaves that reference exactly as written and the rest of the document is
//! still processed.
//!
//! Targets are joined to the document's directory as written, so absolute
//! paths and `..` segments reach files outside it; anything the process can
//! read is uploaded publicly. Only convert documents you trust.

use std::path::Path;

use tracing::{debug, warn};

use crate::scanner;
use crate::storage::StorageProvider;
use crate::types::{Reference, Rewrite};

/// Decide what happens to one reference.
///
/// 1. Remote (`http://`, `https://`) and anchor (`#`) targets stay unchanged.
/// 2. The trimmed target, joined to `base_dir`, must be an existing file.
/// 3. The file is uploaded once; its URL replaces the target, or the
///    reference stays unchanged if the upload fails.
pub fn resolve_reference(
    reference: &Reference<'_>,
    base_dir: &Path,
    provider: &dyn StorageProvider,
) -> Rewrite {
    if reference.is_remote_or_anchor() {
        return Rewrite::Unchanged;
    }

    let path = base_dir.join(reference.target.trim());
    if !path.is_file() {
        debug!(
            reference = reference.target,
            syntax = ?reference.syntax,
            path = %path.display(),
            "no local file, leaving reference"
        );
        return Rewrite::Unchanged;
    }

    return match provider.upload(&path) {
        Err(err) => {
            warn!(path = %path.display(), error = %err, "upload failed, leaving reference unchanged");
            Rewrite::Unchanged
        },
        Ok(url) => {
            debug!(path = %path.display(), syntax = ?reference.syntax, url = %url, "reference uploaded");
            Rewrite::Replaced(url)
        },
    };
}

/// Rewrite every `<img src="...">` in `text`.
pub fn rewrite_html_image_references(
    text: &str,
    base_dir: &Path,
    provider: &dyn StorageProvider,
) -> String {
    return splice_rewrites(text, scanner::html_image_references(text), base_dir, provider);
}

/// Rewrite every Markdown link and image in `text`.
pub fn rewrite_markdown_references(
    text: &str,
    base_dir: &Path,
    provider: &dyn StorageProvider,
) -> String {
    return splice_rewrites(text, scanner::markdown_references(text), base_dir, provider);
}

/// Run both passes: Markdown syntax first, then HTML tags over the
/// already-rewritten text.
pub fn rewrite_references(text: &str, base_dir: &Path, provider: &dyn StorageProvider) -> String {
    let markdown_pass = rewrite_markdown_references(text, base_dir, provider);
    return rewrite_html_image_references(&markdown_pass, base_dir, provider);
}

/// Copy `text` through, replacing each reference's span with its rewrite.
/// References arrive in document order and never overlap.
fn splice_rewrites<'t>(
    text: &'t str,
    references: impl Iterator<Item = Reference<'t>>,
    base_dir: &Path,
    provider: &dyn StorageProvider,
) -> String {
    let mut output = String::with_capacity(text.len());
    let mut cursor = 0_usize;
    let mut replaced = 0_usize;

    for reference in references {
        let Some(between) = text.get(cursor..reference.span.start) else {
            continue;
        };
        output.push_str(between);
        match resolve_reference(&reference, base_dir, provider) {
            Rewrite::Replaced(url) => {
                output.push_str(&reference.with_target(&url));
                replaced = replaced.saturating_add(1);
            },
            Rewrite::Unchanged => output.push_str(&reference.with_target(reference.target)),
        }
        cursor = reference.span.end;
    }
    output.push_str(text.get(cursor..).unwrap_or_default());

    if replaced > 0 {
        debug!(replaced, "rewrote references");
    }
    return output;
}
