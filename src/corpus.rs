//! Document and directory operations: format and convert markdown files in place.

use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::Error;
use crate::formatter::Formatter;
use crate::rewriter;
use crate::storage::StorageProvider;

/// Drives formatting and link rewriting over single files or directory trees.
/// Files are processed one at a time; a directory operation stops at the
/// first file that fails.
pub struct Corpus {
    /// Path prefixes, relative to a scanned directory, that directory scans skip.
    exclude: Vec<String>,
    /// Normalizer applied before any rewriting.
    formatter: Box<dyn Formatter>,
}

impl Corpus {
    /// Format `path`, then upload its local references and rewrite them to
    /// the returned URLs. Returns the final text, which is also written back.
    ///
    /// # Errors
    ///
    /// Returns `Error::FileNotFound` if `path` does not exist, or the read,
    /// write, or formatting error for this file. Individual references that
    /// fail to resolve or upload are left unchanged and are not errors.
    pub fn convert(&self, path: &Path, provider: &dyn StorageProvider) -> Result<String, Error> {
        self.format(path)?;

        let content = read_document(path)?;
        let base_dir = path.parent().unwrap_or_else(|| return Path::new(""));
        let converted = rewriter::rewrite_references(&content, base_dir, provider);
        write_document(path, &converted)?;

        info!(path = %path.display(), "converted");
        return Ok(converted);
    }

    /// Convert every markdown file under `dir`, at any depth.
    /// Returns the processed paths in traversal order.
    ///
    /// # Errors
    ///
    /// Returns `Error::DirectoryNotFound` if `dir` is not a directory,
    /// `Error::Walk` if traversal fails, or the first per-file error.
    pub fn convert_directory(
        &self,
        dir: &Path,
        provider: &dyn StorageProvider,
    ) -> Result<Vec<PathBuf>, Error> {
        let files = self.markdown_files(dir)?;
        for file in &files {
            self.convert(file, provider)?;
        }
        info!(dir = %dir.display(), count = files.len(), "converted directory");
        return Ok(files);
    }

    /// Replace the formatted file's text with its normalized form and return it.
    ///
    /// # Errors
    ///
    /// Returns `Error::FileNotFound` if `path` does not exist,
    /// `Error::ReadFailed`/`Error::WriteFailed` for I/O failures,
    /// or `Error::FormatFailed` if the formatter rejects the text.
    pub fn format(&self, path: &Path) -> Result<String, Error> {
        if !path.exists() {
            return Err(Error::FileNotFound { path: path.to_path_buf() });
        }

        let content = read_document(path)?;
        let formatted = self.formatter.normalize(&content).map_err(|err| {
            return Error::FormatFailed {
                path: path.to_path_buf(),
                reason: err.to_string(),
            };
        })?;
        write_document(path, &formatted)?;

        debug!(path = %path.display(), "formatted");
        return Ok(formatted);
    }

    /// Format every markdown file under `dir`, at any depth.
    ///
    /// # Errors
    ///
    /// Returns `Error::DirectoryNotFound` if `dir` is not a directory,
    /// `Error::Walk` if traversal fails, or the first per-file error.
    pub fn format_directory(&self, dir: &Path) -> Result<Vec<PathBuf>, Error> {
        let files = self.markdown_files(dir)?;
        for file in &files {
            self.format(file)?;
        }
        info!(dir = %dir.display(), count = files.len(), "formatted directory");
        return Ok(files);
    }

    /// Collect `*.md` files under `dir`, sorted by name within each directory,
    /// minus anything under an excluded prefix.
    ///
    /// # Errors
    ///
    /// Returns `Error::DirectoryNotFound` if `dir` is not a directory,
    /// or `Error::Walk` if an entry cannot be read.
    fn markdown_files(&self, dir: &Path) -> Result<Vec<PathBuf>, Error> {
        if !dir.is_dir() {
            return Err(Error::DirectoryNotFound { path: dir.to_path_buf() });
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry?;
            let path = entry.path();
            if !entry.file_type().is_file() || path.extension().is_none_or(|ext| return ext != "md") {
                continue;
            }

            let relative = path.strip_prefix(dir).unwrap_or(path).to_string_lossy();
            if !self.should_scan(&relative) {
                debug!(path = %path.display(), "excluded");
                continue;
            }
            files.push(path.to_path_buf());
        }
        return Ok(files);
    }

    /// A corpus that normalizes with `formatter` and scans every markdown file.
    pub fn new(formatter: Box<dyn Formatter>) -> Self {
        return Self {
            exclude: Vec::new(),
            formatter,
        };
    }

    /// Whether a path relative to the scanned directory is outside every exclude prefix.
    fn should_scan(&self, relative_path: &str) -> bool {
        return !self
            .exclude
            .iter()
            .any(|prefix| return relative_path.starts_with(prefix.as_str()));
    }

    /// Skip markdown files whose path relative to the scanned directory starts
    /// with any of `exclude`.
    #[must_use]
    pub fn with_exclude(mut self, exclude: Vec<String>) -> Self {
        self.exclude = exclude;
        return self;
    }
}

/// Read a document as UTF-8.
///
/// # Errors
///
/// Returns `Error::ReadFailed` naming the path.
fn read_document(path: &Path) -> Result<String, Error> {
    return std::fs::read_to_string(path).map_err(|source| {
        return Error::ReadFailed {
            path: path.to_path_buf(),
            source,
        };
    });
}

/// Overwrite a document in place.
///
/// # Errors
///
/// Returns `Error::WriteFailed` naming the path.
fn write_document(path: &Path, content: &str) -> Result<(), Error> {
    return std::fs::write(path, content).map_err(|source| {
        return Error::WriteFailed {
            path: path.to_path_buf(),
            source,
        };
    });
}
