//! Storage providers: upload a local file and report the public URL it is served from.
//!
//! Backends are picked once by [`connect`] and used through the
//! [`StorageProvider`] trait. Object keys are the file's base name, so two
//! files named `image.png` in different directories share one key and the
//! later upload replaces the earlier one.

pub mod aliyun;
pub mod aws;

use std::path::Path;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use s3::Bucket;

use crate::config::{ProviderKind, ProviderSettings};
use crate::error::Error;

/// Characters left as-is in object keys when building URLs.
const KEY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'/');

/// Content type sent when the extension gives no hint.
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Canned ACL header that makes uploaded objects world-readable.
const PUBLIC_READ_HEADER: (&str, &str) = ("x-amz-acl", "public-read");

/// A local file read into memory and ready to transfer.
#[derive(Debug)]
pub struct PreparedUpload {
    /// File contents.
    pub body: Vec<u8>,
    /// MIME type guessed from the file extension.
    pub content_type: String,
    /// Object key: the file's base name.
    pub key: String,
}

/// The two operations the rewriter needs from a storage backend.
pub trait StorageProvider {
    /// Upload `file` under its base name, publicly readable, and return its public URL.
    ///
    /// # Errors
    ///
    /// Returns `Error::FileNotFound` if `file` does not exist,
    /// or `Error::UploadFailed` if the transfer fails.
    fn upload(&self, file: &Path) -> Result<String, Error>;

    /// Public URL for an object key. Performs no I/O.
    fn url_for(&self, key: &str) -> String;
}

/// Build the backend selected by `kind` from fully-resolved settings.
///
/// # Errors
///
/// Returns `Error::MissingSetting` if the backend's required settings are absent,
/// or `Error::StorageClient` if the client rejects them.
pub fn connect(
    kind: ProviderKind,
    settings: &ProviderSettings,
) -> Result<Box<dyn StorageProvider>, Error> {
    return match kind {
        ProviderKind::Aliyun => Ok(Box::new(aliyun::AliyunProvider::new(settings)?)),
        ProviderKind::Aws => Ok(Box::new(aws::AwsProvider::new(settings)?)),
    };
}

/// Percent-encode an object key for use in a URL path.
pub fn encode_key(key: &str) -> String {
    return utf8_percent_encode(key, KEY_ENCODE_SET).to_string();
}

/// Strip any scheme and trailing slashes from an endpoint, leaving the host.
pub fn endpoint_host(endpoint: &str) -> &str {
    let without_scheme = endpoint
        .strip_prefix("https://")
        .or_else(|| return endpoint.strip_prefix("http://"))
        .unwrap_or(endpoint);
    return without_scheme.trim_end_matches('/');
}

/// Normalize an endpoint to `scheme://host[:port]`, keeping an explicit
/// `http://` and defaulting to `https://` when no scheme is given.
pub fn endpoint_url(endpoint: &str) -> String {
    let trimmed = endpoint.trim();
    if trimmed.starts_with("http://") {
        return format!("http://{}", endpoint_host(trimmed));
    }
    return format!("https://{}", endpoint_host(trimmed));
}

/// Turn on the public-read ACL for every object written through `bucket`.
pub fn mark_uploads_public(bucket: &mut Bucket) {
    let (name, value) = PUBLIC_READ_HEADER;
    bucket.add_header(name, value);
}

/// Read `file` and work out its key and content type.
///
/// # Errors
///
/// Returns `Error::FileNotFound` if `file` is missing or has no file name,
/// or `Error::UploadFailed` if it cannot be read.
pub fn prepare_upload(file: &Path) -> Result<PreparedUpload, Error> {
    if !file.exists() {
        return Err(Error::FileNotFound { path: file.to_path_buf() });
    }
    let Some(name) = file.file_name() else {
        return Err(Error::FileNotFound { path: file.to_path_buf() });
    };
    let key = name.to_string_lossy().into_owned();

    let body = std::fs::read(file).map_err(|err| {
        return Error::UploadFailed {
            key: key.clone(),
            reason: err.to_string(),
        };
    })?;
    let content_type = mime_guess::from_path(file)
        .first_raw()
        .unwrap_or(FALLBACK_CONTENT_TYPE)
        .to_string();

    return Ok(PreparedUpload { body, content_type, key });
}

/// `https://{cname}/{key}` when a custom domain is set, else `{default_base}/{key}`.
/// `default_base` is a full URL prefix such as `https://bucket.s3.us-east-1.amazonaws.com`.
pub fn public_url(cname: Option<&str>, default_base: &str, key: &str) -> String {
    let encoded = encode_key(key);
    return match cname {
        Some(domain) => format!("https://{}/{encoded}", endpoint_host(domain)),
        None => format!("{}/{encoded}", default_base.trim_end_matches('/')),
    };
}

/// PUT a prepared upload through an S3-compatible bucket handle and check the status.
///
/// # Errors
///
/// Returns `Error::UploadFailed` on transport errors or non-2xx responses.
pub fn put_public_object(bucket: &Bucket, upload: &PreparedUpload) -> Result<(), Error> {
    let response = bucket
        .put_object_with_content_type(&upload.key, &upload.body, &upload.content_type)
        .map_err(|err| {
            return Error::UploadFailed {
                key: upload.key.clone(),
                reason: err.to_string(),
            };
        })?;

    let status = response.status_code();
    if !(200..300).contains(&status) {
        return Err(Error::UploadFailed {
            key: upload.key.clone(),
            reason: format!("HTTP {status}: {}", String::from_utf8_lossy(response.bytes())),
        });
    }
    return Ok(());
}

/// Pull a required setting out of `value` or name it in the error.
///
/// # Errors
///
/// Returns `Error::MissingSetting` if the value is absent or blank.
pub fn required<'s>(
    value: Option<&'s String>,
    provider: ProviderKind,
    setting: &'static str,
) -> Result<&'s str, Error> {
    return value
        .map(String::as_str)
        .filter(|v| return !v.trim().is_empty())
        .ok_or(Error::MissingSetting {
            provider: provider.name(),
            setting,
        });
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, reason = "test assertions")]
mod tests {
    use super::*;

    #[test]
    fn encodes_reserved_characters_in_keys() {
        assert_eq!(encode_key("test space.jpg"), "test%20space.jpg");
        assert_eq!(encode_key("test#hash.jpg"), "test%23hash.jpg");
        assert_eq!(encode_key("dir/a-b_c~d.png"), "dir/a-b_c~d.png");
        assert_eq!(encode_key("图.png"), "%E5%9B%BE.png");
    }

    #[test]
    fn cname_overrides_default_base() {
        assert_eq!(
            public_url(Some("img.example.com"), "https://bucket.s3.amazonaws.com", "a b.png"),
            "https://img.example.com/a%20b.png"
        );
        assert_eq!(
            public_url(Some("https://img.example.com/"), "unused", "a.png"),
            "https://img.example.com/a.png"
        );
        assert_eq!(
            public_url(None, "https://bucket.s3.amazonaws.com", "a.png"),
            "https://bucket.s3.amazonaws.com/a.png"
        );
        assert_eq!(
            public_url(None, "http://127.0.0.1:9000/docs/", "a.png"),
            "http://127.0.0.1:9000/docs/a.png"
        );
    }

    #[test]
    fn endpoint_url_keeps_plain_http() {
        assert_eq!(endpoint_url("http://127.0.0.1:9000/"), "http://127.0.0.1:9000");
        assert_eq!(endpoint_url("https://storage.example.net"), "https://storage.example.net");
        assert_eq!(endpoint_url(" minio.local:9000 "), "https://minio.local:9000");
    }

    #[test]
    fn endpoint_host_strips_scheme_and_slash() {
        assert_eq!(endpoint_host("https://oss-cn-beijing.aliyuncs.com/"), "oss-cn-beijing.aliyuncs.com");
        assert_eq!(endpoint_host("http://minio.local:9000"), "minio.local:9000");
        assert_eq!(endpoint_host("oss-cn-beijing.aliyuncs.com"), "oss-cn-beijing.aliyuncs.com");
    }

    #[test]
    fn prepares_key_from_base_name_only() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("image");
        std::fs::create_dir(&nested).unwrap();
        let file = nested.join("test.jpg");
        std::fs::write(&file, b"fake image data").unwrap();

        let upload = prepare_upload(&file).unwrap();
        assert_eq!(upload.key, "test.jpg");
        assert_eq!(upload.content_type, "image/jpeg");
        assert_eq!(upload.body, b"fake image data");
    }

    #[test]
    fn unknown_extension_falls_back_to_octet_stream() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("blob.zzzunknown");
        std::fs::write(&file, b"x").unwrap();

        assert_eq!(prepare_upload(&file).unwrap().content_type, FALLBACK_CONTENT_TYPE);
    }

    #[test]
    fn missing_file_is_not_found() {
        let result = prepare_upload(Path::new("/definitely/not/here.png"));
        assert!(matches!(result, Err(Error::FileNotFound { .. })));
    }

    #[test]
    fn blank_required_setting_is_missing() {
        let blank = "  ".to_string();
        let err = required(Some(&blank), ProviderKind::Aws, "bucket").unwrap_err();
        assert_eq!(err.to_string(), "missing required AWS S3 setting: bucket");
        assert!(required(None, ProviderKind::Aliyun, "endpoint").is_err());
    }
}
