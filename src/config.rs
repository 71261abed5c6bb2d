use std::path::Path;

use crate::error::Error;

/// Name of the optional project config file, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".md-corpus.toml";

/// Project configuration loaded from `.md-corpus.toml`.
/// `exclude` holds path prefixes, relative to a scanned directory, whose
/// markdown files are skipped by directory operations.
#[derive(Debug, Default)]
pub struct Config {
    /// Path prefixes skipped by directory scans.
    pub exclude: Vec<String>,
    /// Non-secret provider defaults, lowest precedence.
    pub storage: ProviderSettings,
}

/// Raw TOML structure for `.md-corpus.toml`.
#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct MdCorpusTomlConfig {
    /// Path prefixes skipped by directory scans.
    #[serde(default)]
    exclude: Vec<String>,
    /// The `[storage]` table.
    #[serde(default)]
    storage: ProviderSettings,
}

/// Everything a storage backend needs to be built. Each field is optional
/// here; backends decide which ones are required when they are constructed.
/// Credentials are never read from the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderSettings {
    /// Access key id.
    #[serde(skip)]
    pub access_key: Option<String>,
    /// Bucket name.
    pub bucket: Option<String>,
    /// Custom public domain used instead of the backend's default URL.
    pub cname: Option<String>,
    /// OSS endpoint, or an S3-compatible endpoint override.
    pub endpoint: Option<String>,
    /// Transfer over the OSS internal network endpoint.
    pub internal: Option<bool>,
    /// S3 region.
    pub region: Option<String>,
    /// Secret access key.
    #[serde(skip)]
    pub secret_key: Option<String>,
}

/// Storage backends selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ProviderKind {
    /// Aliyun Object Storage Service, addressed by endpoint.
    Aliyun,
    /// Amazon S3, addressed by region.
    Aws,
}

impl Config {
    /// Load config from `.md-corpus.toml` in the given directory.
    /// Returns defaults if the file doesn't exist, and an error if it exists
    /// but is malformed.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if reading fails (other than not-found),
    /// or `Error::TomlDe` if the TOML is malformed.
    pub fn load(root: &Path) -> Result<Self, Error> {
        let path = root.join(CONFIG_FILE_NAME);
        let content = match std::fs::read_to_string(&path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(Error::Io(e)),
            Ok(c) => c,
        };
        return Self::parse(&content);
    }

    /// Parse config from TOML content.
    ///
    /// # Errors
    ///
    /// Returns `Error::TomlDe` if the TOML is malformed or has unknown keys.
    pub fn parse(content: &str) -> Result<Self, Error> {
        let raw: MdCorpusTomlConfig = toml::from_str(content)?;
        return Ok(Self {
            exclude: raw.exclude,
            storage: raw.storage,
        });
    }
}

impl ProviderSettings {
    /// Read the provider's conventional environment variables through `lookup`.
    /// Empty values count as unset.
    pub fn from_env(kind: ProviderKind, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| return lookup(name).filter(|value| return !value.is_empty());
        return match kind {
            ProviderKind::Aliyun => Self {
                access_key: var("ALI_OSS_ACCESS_KEY_ID"),
                bucket: var("ALI_OSS_BUCKET"),
                endpoint: var("ALI_OSS_ENDPOINT"),
                secret_key: var("ALI_OSS_ACCESS_KEY_SECRET"),
                ..Self::default()
            },
            ProviderKind::Aws => Self {
                access_key: var("AWS_ACCESS_KEY_ID"),
                bucket: var("AWS_BUCKET"),
                endpoint: var("AWS_ENDPOINT_URL"),
                region: var("AWS_DEFAULT_REGION").or_else(|| return var("AWS_REGION")),
                secret_key: var("AWS_SECRET_ACCESS_KEY"),
                ..Self::default()
            },
        };
    }

    /// Fill every unset field from `fallback`, keeping the values already set.
    #[must_use]
    pub fn or(self, fallback: Self) -> Self {
        return Self {
            access_key: self.access_key.or(fallback.access_key),
            bucket: self.bucket.or(fallback.bucket),
            cname: self.cname.or(fallback.cname),
            endpoint: self.endpoint.or(fallback.endpoint),
            internal: self.internal.or(fallback.internal),
            region: self.region.or(fallback.region),
            secret_key: self.secret_key.or(fallback.secret_key),
        };
    }
}

impl ProviderKind {
    /// Human-readable backend name used in error messages.
    pub const fn name(self) -> &'static str {
        return match self {
            Self::Aliyun => "Aliyun OSS",
            Self::Aws => "AWS S3",
        };
    }
}
