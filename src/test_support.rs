//! In-memory storage doubles and scratch-file helpers shared by unit tests.

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::storage::{StorageProvider, encode_key};

/// Base URL every double serves objects from.
const BASE_URL: &str = "https://example.com/bucket";

/// Fails uploads for one file name and behaves like [`RecordingProvider`] otherwise.
pub struct FailingProvider {
    /// Base name whose uploads fail.
    failing_name: String,
    /// Delegate for every other upload.
    inner: RecordingProvider,
}

/// Records every upload and serves objects from [`BASE_URL`].
pub struct RecordingProvider {
    /// Paths passed to `upload`, in call order.
    uploads: RefCell<Vec<PathBuf>>,
}

impl FailingProvider {
    /// A provider whose uploads of files named `name` fail.
    pub fn failing_on(name: &str) -> Self {
        return Self {
            failing_name: name.to_string(),
            inner: RecordingProvider::new(),
        };
    }
}

impl StorageProvider for FailingProvider {
    fn upload(&self, file: &Path) -> Result<String, Error> {
        if file.file_name().is_some_and(|name| return name == self.failing_name.as_str()) {
            return Err(Error::UploadFailed {
                key: self.failing_name.clone(),
                reason: "connection reset".to_string(),
            });
        }
        return self.inner.upload(file);
    }

    fn url_for(&self, key: &str) -> String {
        return self.inner.url_for(key);
    }
}

impl RecordingProvider {
    /// An empty recorder.
    pub const fn new() -> Self {
        return Self {
            uploads: RefCell::new(Vec::new()),
        };
    }

    /// Every path uploaded so far.
    pub fn uploads(&self) -> Vec<PathBuf> {
        return self.uploads.borrow().clone();
    }
}

impl StorageProvider for RecordingProvider {
    fn upload(&self, file: &Path) -> Result<String, Error> {
        if !file.exists() {
            return Err(Error::FileNotFound { path: file.to_path_buf() });
        }
        self.uploads.borrow_mut().push(file.to_path_buf());
        let key = file
            .file_name()
            .map(|name| return name.to_string_lossy().into_owned())
            .unwrap_or_default();
        return Ok(self.url_for(&key));
    }

    fn url_for(&self, key: &str) -> String {
        return format!("{BASE_URL}/{}", encode_key(key));
    }
}

/// Write `contents` to `root/relative`, creating parent directories.
#[allow(clippy::expect_used, reason = "test fixture setup")]
pub fn write_file(root: &Path, relative: &str, contents: &[u8]) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create fixture directories");
    }
    std::fs::write(&path, contents).expect("write fixture file");
    return path;
}
