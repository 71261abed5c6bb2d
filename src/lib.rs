//! Rewrite local resource links in markdown documents to cloud object storage URLs.
//!
//! A conversion formats a document, finds its Markdown links/images and HTML
//! `<img>` tags, uploads every target that names a file next to the
//! document, and writes the document back with those targets replaced by the
//! uploaded objects' public URLs. Remote URLs, anchors, and targets with no
//! matching file are left as written.
//!
//! ```no_run
//! use std::path::Path;
//!
//! use md_corpus::config::{ProviderKind, ProviderSettings};
//! use md_corpus::corpus::Corpus;
//! use md_corpus::formatter::CommonMarkFormatter;
//! use md_corpus::storage;
//!
//! # fn main() -> Result<(), md_corpus::error::Error> {
//! let settings = ProviderSettings {
//!     access_key: Some("key".to_string()),
//!     bucket: Some("docs".to_string()),
//!     region: Some("us-east-1".to_string()),
//!     secret_key: Some("secret".to_string()),
//!     ..ProviderSettings::default()
//! };
//! let provider = storage::connect(ProviderKind::Aws, &settings)?;
//! let corpus = Corpus::new(Box::new(CommonMarkFormatter));
//! let processed = corpus.convert_directory(Path::new("docs"), provider.as_ref())?;
//! println!("{} files converted", processed.len());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod corpus;
pub mod error;
pub mod formatter;
pub mod rewriter;
pub mod scanner;
pub mod storage;
pub mod types;

#[cfg(test)]
mod test_support;

/// Crate version reported by the `version` command.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
