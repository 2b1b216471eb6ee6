//! Per-album ordering manifests.
//!
//! An album may carry an `ordering.yaml` directly under its bucket prefix:
//!
//! ```yaml
//! cover: 010-harbour.jpg
//! thumbnails:
//!   - 020-market.jpg
//!   - 030-temple.jpg
//! ordering:
//!   - 010-harbour.jpg
//!   - 040-night.jpg
//! ```
//!
//! Every field is optional and unknown fields are ignored. Entries are
//! references resolved against the album's URL path (see
//! [`naming::resolve_reference`]) once, when the manifest is fetched, so the
//! merge engine only ever compares bucket keys.
//!
//! [`ManifestFetch`] is the ordering cache's [`Fetch`]: a missing or malformed
//! manifest installs a negative [`OrderingConfig`] so the bucket is not asked
//! again until the entry goes stale; only transport failures leave the cache
//! untouched.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::cache::{Fetch, Fetched};
use crate::naming;
use crate::storage::{ObjectSource, StorageError};
use crate::types::OrderingConfig;

#[derive(Error, Debug)]
pub enum OrderingError {
    #[error("no ordering manifest at {key}")]
    NotFound { key: String },
    #[error("malformed ordering manifest {key}: {message}")]
    Parse { key: String, message: String },
    #[error("unresolvable reference {reference:?} in {key}: {message}")]
    InvalidReference {
        key: String,
        reference: String,
        message: String,
    },
    #[error("could not fetch ordering manifest: {0}")]
    Storage(#[from] StorageError),
}

impl OrderingError {
    /// Whether this error is cached as a negative entry rather than retried.
    pub fn is_negative(&self) -> bool {
        !matches!(self, Self::Storage(_))
    }
}

/// On-storage manifest schema.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ManifestFile {
    cover: Option<String>,
    thumbnails: Vec<String>,
    ordering: Vec<String>,
}

/// Parse a manifest body and resolve its references against `album_path`.
///
/// `manifest_key` only labels errors. An empty body is a valid manifest
/// with no overrides.
pub fn parse_manifest(
    body: &[u8],
    manifest_key: &str,
    album_path: &str,
) -> Result<OrderingConfig, OrderingError> {
    let file: ManifestFile = if body.iter().all(u8::is_ascii_whitespace) {
        ManifestFile::default()
    } else {
        serde_yaml::from_slice(body).map_err(|e| OrderingError::Parse {
            key: manifest_key.to_string(),
            message: e.to_string(),
        })?
    };

    let resolve = |reference: &str| {
        naming::resolve_reference(album_path, reference).map_err(|e| {
            OrderingError::InvalidReference {
                key: manifest_key.to_string(),
                reference: reference.to_string(),
                message: e.to_string(),
            }
        })
    };
    let resolve_all = |references: &[String]| {
        references
            .iter()
            .filter(|r| !r.trim().is_empty())
            .map(|r| resolve(r))
            .collect::<Result<Vec<_>, _>>()
    };

    let cover = match file.cover.as_deref().map(str::trim) {
        Some(c) if !c.is_empty() => Some(resolve(c)?),
        _ => None,
    };
    Ok(OrderingConfig {
        cover,
        thumbnails: resolve_all(&file.thumbnails)?,
        ordering: resolve_all(&file.ordering)?,
        is_negative: false,
    })
}

/// Fetches and parses one album's manifest.
pub struct ManifestFetch {
    source: Arc<dyn ObjectSource>,
    manifest_key: String,
    album_path: String,
    label: String,
}

impl ManifestFetch {
    pub fn new(source: Arc<dyn ObjectSource>, bucket_prefix: &str, album_path: &str) -> Self {
        let manifest_key = naming::manifest_key(bucket_prefix);
        Self {
            source,
            label: format!("ordering:{manifest_key}"),
            manifest_key,
            album_path: album_path.to_string(),
        }
    }

    pub fn manifest_key(&self) -> &str {
        &self.manifest_key
    }
}

#[async_trait]
impl Fetch for ManifestFetch {
    type Value = OrderingConfig;
    type Error = OrderingError;

    fn label(&self) -> &str {
        &self.label
    }

    async fn fetch(&self) -> Fetched<OrderingConfig, OrderingError> {
        let body = match self.source.get(&self.manifest_key).await {
            Ok(body) => body,
            Err(StorageError::NotFound { key }) => {
                return Fetched::negative(OrderingConfig::negative(), OrderingError::NotFound { key });
            }
            Err(err) => return Fetched::Failed(OrderingError::Storage(err)),
        };
        match parse_manifest(&body, &self.manifest_key, &self.album_path) {
            Ok(config) => {
                tracing::info!(
                    manifest = %self.manifest_key,
                    cover = config.cover.is_some(),
                    thumbnails = config.thumbnails.len(),
                    ordering = config.ordering.len(),
                    "loaded ordering manifest"
                );
                Fetched::value(config)
            }
            Err(err) => Fetched::negative(OrderingConfig::negative(), err),
        }
    }
}
