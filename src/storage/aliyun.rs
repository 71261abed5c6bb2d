//! Aliyun OSS backend, addressed by bucket and endpoint.
//!
//! OSS speaks the S3 protocol, so transfers go through the same client as the
//! S3 backend with the OSS endpoint as a custom region.

use std::path::Path;

use s3::Bucket;
use s3::creds::Credentials;
use s3::region::Region;
use tracing::{debug, info};

use crate::config::{ProviderKind, ProviderSettings};
use crate::error::Error;
use crate::storage::{
    StorageProvider, endpoint_host, mark_uploads_public, prepare_upload, public_url,
    put_public_object, required,
};

/// Suffix OSS appends to a region label to form its internal-network host.
const INTERNAL_SUFFIX: &str = "-internal";

/// Uploads into one OSS bucket. With `internal` set, bytes travel through the
/// region's internal endpoint; published URLs always use the public endpoint.
pub struct AliyunProvider {
    /// Client handle bound to the transfer endpoint.
    bucket: Box<Bucket>,
    /// Bucket name as configured.
    bucket_name: String,
    /// Custom public domain.
    cname: Option<String>,
    /// Public endpoint host, e.g. `oss-cn-beijing.aliyuncs.com`.
    public_endpoint: String,
}

impl AliyunProvider {
    /// Build the provider. Bucket, both credentials, and endpoint are required.
    ///
    /// # Errors
    ///
    /// Returns `Error::MissingSetting` for absent settings,
    /// or `Error::StorageClient` if the client rejects them.
    pub fn new(settings: &ProviderSettings) -> Result<Self, Error> {
        let kind = ProviderKind::Aliyun;
        let bucket_name = required(settings.bucket.as_ref(), kind, "bucket")?;
        let endpoint = required(settings.endpoint.as_ref(), kind, "endpoint")?;
        let access_key = required(settings.access_key.as_ref(), kind, "access key")?;
        let secret_key = required(settings.secret_key.as_ref(), kind, "secret key")?;
        let internal = settings.internal.unwrap_or(false);

        let public_endpoint = public_endpoint_host(endpoint_host(endpoint.trim()));
        let transfer_endpoint = if internal {
            internal_endpoint_host(&public_endpoint)
        } else {
            public_endpoint.clone()
        };

        let credentials = Credentials::new(Some(access_key), Some(secret_key), None, None, None)
            .map_err(|err| return Error::StorageClient { reason: err.to_string() })?;
        let region = Region::Custom {
            endpoint: format!("https://{transfer_endpoint}"),
            region: region_id(&public_endpoint).to_string(),
        };
        let mut bucket = Bucket::new(bucket_name, region, credentials)
            .map_err(|err| return Error::StorageClient { reason: err.to_string() })?;
        mark_uploads_public(&mut bucket);

        debug!(bucket = bucket_name, endpoint = %transfer_endpoint, internal, "configured OSS provider");
        return Ok(Self {
            bucket,
            bucket_name: bucket_name.to_string(),
            cname: settings.cname.clone(),
            public_endpoint,
        });
    }
}

impl StorageProvider for AliyunProvider {
    fn upload(&self, file: &Path) -> Result<String, Error> {
        let upload = prepare_upload(file)?;
        put_public_object(&self.bucket, &upload)?;
        info!(
            bucket = %self.bucket_name,
            key = %upload.key,
            content_type = %upload.content_type,
            "uploaded object to OSS"
        );
        return Ok(self.url_for(&upload.key));
    }

    /// Always the public endpoint, even when `internal` is set: the internal
    /// host only resolves inside Aliyun's network, and readers of the
    /// rewritten documents are outside it.
    fn url_for(&self, key: &str) -> String {
        let default_base = format!("https://{}.{}", self.bucket_name, self.public_endpoint);
        return public_url(self.cname.as_deref(), &default_base, key);
    }
}

/// `oss-cn-beijing.aliyuncs.com` → `oss-cn-beijing-internal.aliyuncs.com`.
fn internal_endpoint_host(public_host: &str) -> String {
    return match public_host.split_once('.') {
        Some((label, rest)) => format!("{label}{INTERNAL_SUFFIX}.{rest}"),
        None => format!("{public_host}{INTERNAL_SUFFIX}"),
    };
}

/// Drop any `-internal` marker from the first label of an endpoint host.
fn public_endpoint_host(host: &str) -> String {
    return match host.split_once('.') {
        Some((label, rest)) => {
            let label = label.strip_suffix(INTERNAL_SUFFIX).unwrap_or(label);
            format!("{label}.{rest}")
        },
        None => host.strip_suffix(INTERNAL_SUFFIX).unwrap_or(host).to_string(),
    };
}

/// Region id used for request signing: the endpoint's first label.
fn region_id(public_host: &str) -> &str {
    return public_host.split('.').next().unwrap_or(public_host);
}
