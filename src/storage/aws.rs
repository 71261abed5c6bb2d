//! Amazon S3 backend, addressed by bucket and region.

use std::path::Path;

use s3::Bucket;
use s3::creds::Credentials;
use s3::region::Region;
use tracing::{debug, info};

use crate::config::{ProviderKind, ProviderSettings};
use crate::error::Error;
use crate::storage::{
    StorageProvider, endpoint_url, mark_uploads_public, prepare_upload, public_url,
    put_public_object, required,
};

/// Uploads into one S3 bucket. Public URLs use the virtual-hosted form
/// `https://{bucket}.s3.{region}.amazonaws.com/{key}` unless a CNAME is set.
/// With an S3-compatible endpoint the bucket is addressed path-style, both
/// for transfers and in URLs: `{endpoint}/{bucket}/{key}`.
pub struct AwsProvider {
    /// Client handle with credentials and the public-read header attached.
    bucket: Box<Bucket>,
    /// Bucket name as configured.
    bucket_name: String,
    /// Custom public domain.
    cname: Option<String>,
    /// URL prefix objects are served from when no CNAME is set.
    public_base: String,
}

impl AwsProvider {
    /// Build the provider. Bucket, both credentials, and region are required;
    /// `endpoint` optionally points at an S3-compatible service instead of AWS.
    ///
    /// # Errors
    ///
    /// Returns `Error::MissingSetting` for absent settings,
    /// or `Error::StorageClient` if the client rejects them.
    pub fn new(settings: &ProviderSettings) -> Result<Self, Error> {
        let kind = ProviderKind::Aws;
        let bucket_name = required(settings.bucket.as_ref(), kind, "bucket")?;
        let access_key = required(settings.access_key.as_ref(), kind, "access key")?;
        let secret_key = required(settings.secret_key.as_ref(), kind, "secret key")?;
        let region = required(settings.region.as_ref(), kind, "region")?;

        let custom_endpoint = settings
            .endpoint
            .as_deref()
            .map(str::trim)
            .filter(|endpoint| return !endpoint.is_empty())
            .map(endpoint_url);
        let (endpoint, public_base) = match &custom_endpoint {
            Some(endpoint) => (endpoint.clone(), format!("{endpoint}/{bucket_name}")),
            None => (
                format!("https://s3.{region}.amazonaws.com"),
                format!("https://{bucket_name}.s3.{region}.amazonaws.com"),
            ),
        };

        let credentials = Credentials::new(Some(access_key), Some(secret_key), None, None, None)
            .map_err(|err| return Error::StorageClient { reason: err.to_string() })?;
        let region_spec = Region::Custom {
            endpoint,
            region: region.to_string(),
        };
        let mut bucket = Bucket::new(bucket_name, region_spec, credentials)
            .map_err(|err| return Error::StorageClient { reason: err.to_string() })?;
        if custom_endpoint.is_some() {
            bucket = bucket.with_path_style();
        }
        mark_uploads_public(&mut bucket);

        debug!(bucket = bucket_name, region, transfer_url = %bucket.url(), "configured S3 provider");
        return Ok(Self {
            bucket,
            bucket_name: bucket_name.to_string(),
            cname: settings.cname.clone(),
            public_base,
        });
    }
}

impl StorageProvider for AwsProvider {
    fn upload(&self, file: &Path) -> Result<String, Error> {
        let upload = prepare_upload(file)?;
        put_public_object(&self.bucket, &upload)?;
        info!(
            bucket = %self.bucket_name,
            key = %upload.key,
            content_type = %upload.content_type,
            "uploaded object to S3"
        );
        return Ok(self.url_for(&upload.key));
    }

    fn url_for(&self, key: &str) -> String {
        return public_url(self.cname.as_deref(), &self.public_base, key);
    }
}
