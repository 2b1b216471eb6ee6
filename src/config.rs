//! Site configuration module.
//!
//! One TOML file describes one site: the domain it answers for, the bucket
//! its albums live in, how photo URLs are rendered, and the albums
//! themselves.
//!
//! ## Configuration Options
//!
//! ```toml
//! domain = "photos.example.com"   # Required
//! canonical_secure = true         # https:// in canonical URLs
//! site_title = "Example Photos"
//! meta_title = "Example Photos"
//! has_album_index = false         # Serve an album index at "/"
//!
//! [storage]
//! backend = "s3"                  # "s3" or "local"
//! bucket = "example-photos"       # s3 only
//! region = "eu-west-1"            # s3 only, optional
//! root = "/srv/photos"            # local only
//!
//! [photos]
//! backend = "imgix"               # "direct" or "imgix"
//! base_url = "https://example.imgix.net/"
//!
//! [cache]
//! ttl_secs = 3600                 # Listing and manifest freshness window
//!
//! [[albums]]
//! path = "/japan/"                # URL path, leading and trailing slash
//! bucket_prefix = "japan/"        # Key prefix inside the bucket
//! album_title = "Japan"
//! meta_title = "Japan, 2019"
//! auth_user = "guest"             # Optional basic-auth pair
//! auth_pass = "secret"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cache::DEFAULT_TTL;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Host name this site answers for.
    pub domain: String,
    /// Use `https` in canonical URLs.
    pub canonical_secure: bool,
    pub site_title: String,
    pub meta_title: String,
    /// Whether `/` renders an index of albums instead of an album.
    pub has_album_index: bool,
    pub storage: StorageConfig,
    pub photos: PhotosConfig,
    pub cache: CacheConfig,
    pub albums: Vec<AlbumConfig>,
}

impl SiteConfig {
    /// Validate cross-field rules that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.domain.trim().is_empty() {
            return Err(ConfigError::Validation("domain is required".into()));
        }
        self.storage.validate()?;
        self.photos.validate()?;
        if self.cache.ttl_secs == 0 {
            return Err(ConfigError::Validation(
                "cache.ttl_secs must be greater than 0".into(),
            ));
        }
        if self.albums.is_empty() {
            return Err(ConfigError::Validation(
                "a site needs at least one album".into(),
            ));
        }

        let mut seen = HashSet::new();
        for album in &self.albums {
            album.validate()?;
            if !seen.insert(album.path.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "album path {} is configured twice",
                    album.path
                )));
            }
            if self.has_album_index && album.path == "/" {
                return Err(ConfigError::Validation(
                    "a site with an album index cannot have an album at /".into(),
                ));
            }
        }
        Ok(())
    }
}

/// Where album objects are listed and fetched from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    S3,
    #[default]
    Local,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Bucket name (s3).
    pub bucket: String,
    /// AWS region (s3). Falls back to the environment when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Directory acting as the bucket (local).
    pub root: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Local,
            bucket: String::new(),
            region: None,
            root: "photos".to_string(),
        }
    }
}

impl StorageConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        match self.backend {
            StorageBackend::S3 if self.bucket.trim().is_empty() => Err(ConfigError::Validation(
                "storage.bucket is required for the s3 backend".into(),
            )),
            StorageBackend::Local if self.root.trim().is_empty() => Err(
                ConfigError::Validation("storage.root is required for the local backend".into()),
            ),
            _ => Ok(()),
        }
    }
}

/// How photo URLs are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhotoBackend {
    #[default]
    Direct,
    Imgix,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PhotosConfig {
    pub backend: PhotoBackend,
    /// Absolute URL keys are resolved against.
    pub base_url: String,
}

impl Default for PhotosConfig {
    fn default() -> Self {
        Self {
            backend: PhotoBackend::Direct,
            base_url: "http://localhost:8080/photos/".to_string(),
        }
    }
}

impl PhotosConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        url::Url::parse(&self.base_url)
            .map(|_| ())
            .map_err(|e| ConfigError::Validation(format!("photos.base_url is invalid: {e}")))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Seconds a cached listing or manifest stays fresh.
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: DEFAULT_TTL.as_secs(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// One album: a URL path mapped onto a bucket prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AlbumConfig {
    pub path: String,
    pub bucket_prefix: String,
    #[serde(default)]
    pub album_title: String,
    #[serde(default)]
    pub meta_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_pass: Option<String>,
}

impl AlbumConfig {
    pub fn new(path: impl Into<String>, bucket_prefix: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            bucket_prefix: bucket_prefix.into(),
            album_title: String::new(),
            meta_title: String::new(),
            auth_user: None,
            auth_pass: None,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.path.starts_with('/') || !self.path.ends_with('/') {
            return Err(ConfigError::Validation(format!(
                "album path {:?} must start and end with /",
                self.path
            )));
        }
        if self.bucket_prefix.is_empty() && self.path != "/" {
            return Err(ConfigError::Validation(format!(
                "album {} needs a bucket_prefix",
                self.path
            )));
        }
        if !self.bucket_prefix.is_empty() && !self.bucket_prefix.ends_with('/') {
            return Err(ConfigError::Validation(format!(
                "album {} bucket_prefix {:?} must end with /",
                self.path, self.bucket_prefix
            )));
        }
        if self.auth_user.is_some() != self.auth_pass.is_some() {
            return Err(ConfigError::Validation(format!(
                "album {} must set both auth_user and auth_pass, or neither",
                self.path
            )));
        }
        Ok(())
    }
}

/// Load and validate a site config file.
pub fn load_config(path: &Path) -> Result<SiteConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: SiteConfig = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Returns a fully-commented stock config with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# fiftymm site configuration
# ==========================
# One file per site. Unknown keys will cause an error.

# Host name this site answers for (required).
domain = "photos.example.com"

# Use https:// in canonical URLs.
canonical_secure = true

site_title = "Example Photos"
meta_title = "Example Photos"

# Serve an index of albums at "/". Cannot be combined with an album at "/".
has_album_index = true

# ---------------------------------------------------------------------------
# Storage: where album objects live
# ---------------------------------------------------------------------------
[storage]
# "s3" or "local" (a directory acting as the bucket).
backend = "local"
# bucket = "example-photos"   # s3
# region = "eu-west-1"        # s3, defaults to AWS_REGION
root = "photos"               # local

# ---------------------------------------------------------------------------
# Photo URLs
# ---------------------------------------------------------------------------
[photos]
# "direct" appends the key to base_url; "imgix" adds resizing parameters.
backend = "direct"
base_url = "http://localhost:8080/photos/"

# ---------------------------------------------------------------------------
# Caching
# ---------------------------------------------------------------------------
[cache]
# Seconds a bucket listing or ordering manifest is served before a
# background refresh is started. Stale values keep being served until the
# refresh succeeds.
ttl_secs = 3600

# ---------------------------------------------------------------------------
# Albums
# ---------------------------------------------------------------------------
# Each album may hold an ordering.yaml next to its photos:
#
#   cover: 010-harbour.jpg
#   thumbnails: [020-market.jpg, 030-temple.jpg]
#   ordering: [010-harbour.jpg, 040-night.jpg]
#
# Entries are resolved relative to the album path.
[[albums]]
path = "/japan/"
bucket_prefix = "japan/"
album_title = "Japan"
meta_title = "Japan, 2019"

[[albums]]
path = "/family/"
bucket_prefix = "family/"
album_title = "Family"
auth_user = "family"
auth_pass = "change-me"
"##
}
