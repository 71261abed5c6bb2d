/// Crate-level error types for md-corpus operations.
use std::path::PathBuf;

/// Every error surfaced past the corpus boundary names the file, setting, or
/// object it concerns so the CLI can print it without further context.
/// Per-link upload failures never reach the caller; the rewriter absorbs them.
#[allow(clippy::error_impl_error, reason = "single crate-wide error type")]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A directory operation was pointed at something that is not a directory.
    #[error("directory not found: {}", path.display())]
    DirectoryNotFound {
        /// Path that was expected to be a directory.
        path: PathBuf,
    },

    /// A file operation was pointed at a path that does not exist.
    #[error("file not found: {}", path.display())]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The formatter rejected a document.
    #[error("failed to format file {}: {reason}", path.display())]
    FormatFailed {
        /// Document being formatted.
        path: PathBuf,
        /// Description of the formatter failure.
        reason: String,
    },

    /// Underlying I/O error outside of document reads and writes.
    #[error("io: {0}")]
    Io(
        /// The wrapped I/O error.
        #[from]
        std::io::Error,
    ),

    /// A storage provider could not be built because a required setting is absent.
    #[error("missing required {provider} setting: {setting}")]
    MissingSetting {
        /// Provider being constructed.
        provider: &'static str,
        /// Name of the absent setting.
        setting: &'static str,
    },

    /// A document could not be read.
    #[error("failed to read file {}: {source}", path.display())]
    ReadFailed {
        /// Document that failed to read.
        path: PathBuf,
        /// The wrapped I/O error.
        source: std::io::Error,
    },

    /// The object store client rejected its credentials or bucket settings.
    #[error("storage client: {reason}")]
    StorageClient {
        /// Description of the client construction failure.
        reason: String,
    },

    /// TOML deserialization of `.md-corpus.toml` failed.
    #[error("toml deserialize: {0}")]
    TomlDe(
        /// The wrapped TOML deserialization error.
        #[from]
        toml::de::Error,
    ),

    /// Transferring an object to the backend failed.
    #[error("failed to upload `{key}`: {reason}")]
    UploadFailed {
        /// Object key of the failed upload.
        key: String,
        /// Description of the transfer failure.
        reason: String,
    },

    /// Walking a directory tree failed.
    #[error("walk: {0}")]
    Walk(
        /// The wrapped traversal error.
        #[from]
        walkdir::Error,
    ),

    /// A document could not be written back.
    #[error("failed to write file {}: {source}", path.display())]
    WriteFailed {
        /// Document that failed to write.
        path: PathBuf,
        /// The wrapped I/O error.
        source: std::io::Error,
    },
}
