//! Album facade: the entry point the rendering layer talks to.
//!
//! An [`Album`] owns two independent cache slots:
//!
//! - **keys**: the bucket listing under the album prefix ([`KeyListing`]).
//! - **ordering**: the parsed `ordering.yaml` manifest ([`ManifestFetch`]).
//!
//! Every page render reads both, merges them ([`merge::select`]) and turns
//! the chosen keys into photo resources. The slots refresh independently, so
//! a slow listing never holds up a manifest refresh and vice versa.
//!
//! ## Failure Policy
//!
//! | Failure | Effect on the render |
//! |---------|----------------------|
//! | manifest missing or malformed | none; rendered in bucket order |
//! | manifest fetch transport error | none; rendered in bucket order |
//! | listing error, cold cache | the render fails with [`AlbumError::Listing`] |
//! | listing error, warm cache | none; the stale listing is served |
//! | declared key not in the bucket | none; logged as a discrepancy |

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cache::{CacheSlot, Lookup};
use crate::config::AlbumConfig;
use crate::listing::KeyListing;
use crate::merge;
use crate::naming;
use crate::ordering::{ManifestFetch, OrderingError};
use crate::photo::{PhotoFactory, PhotoResource};
use crate::storage::{ObjectSource, StorageError};
use crate::types::{AlbumOrdering, OrderingConfig};

#[derive(Error, Debug)]
pub enum AlbumError {
    #[error("unable to list photos of album {path}: {source}")]
    Listing { path: String, source: StorageError },
    #[error("album {path} has no photos")]
    Empty { path: String },
}

pub struct Album {
    path: String,
    bucket_prefix: String,
    album_title: String,
    meta_title: String,
    auth: Option<(String, String)>,
    canonical_url: String,
    manifest_key: String,
    source: Arc<dyn ObjectSource>,
    photos: Arc<dyn PhotoFactory>,
    keys: CacheSlot<KeyListing>,
    ordering: CacheSlot<ManifestFetch>,
}

impl std::fmt::Debug for Album {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Album")
            .field("path", &self.path)
            .field("bucket_prefix", &self.bucket_prefix)
            .field("keys_cached", &self.keys.is_populated())
            .field("ordering_cached", &self.ordering.is_populated())
            .finish()
    }
}

impl Album {
    /// `site_url` is the site's canonical origin, e.g. `https://photos.example.com`.
    pub fn new(
        config: &AlbumConfig,
        site_url: &str,
        source: Arc<dyn ObjectSource>,
        photos: Arc<dyn PhotoFactory>,
        ttl: Duration,
    ) -> Self {
        let auth = match (&config.auth_user, &config.auth_pass) {
            (Some(user), Some(pass)) => Some((user.clone(), pass.clone())),
            _ => None,
        };
        let prefix = naming::album_prefix(&config.bucket_prefix);
        Self {
            path: config.path.clone(),
            album_title: config.album_title.clone(),
            meta_title: config.meta_title.clone(),
            auth,
            canonical_url: format!("{site_url}{}", config.path),
            manifest_key: naming::manifest_key(&prefix),
            keys: CacheSlot::new(KeyListing::new(Arc::clone(&source), &prefix), ttl),
            ordering: CacheSlot::new(
                ManifestFetch::new(Arc::clone(&source), &prefix, &config.path),
                ttl,
            ),
            bucket_prefix: prefix,
            source,
            photos,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn bucket_prefix(&self) -> &str {
        &self.bucket_prefix
    }

    pub fn album_title(&self) -> &str {
        &self.album_title
    }

    pub fn meta_title(&self) -> &str {
        &self.meta_title
    }

    pub fn canonical_url(&self) -> &str {
        &self.canonical_url
    }

    pub fn has_auth(&self) -> bool {
        self.auth.is_some()
    }

    pub fn auth_user(&self) -> Option<&str> {
        self.auth.as_ref().map(|(user, _)| user.as_str())
    }

    pub fn auth_pass(&self) -> Option<&str> {
        self.auth.as_ref().map(|(_, pass)| pass.as_str())
    }

    // ------------------------------------------------------------------------
    // Caches
    // ------------------------------------------------------------------------

    /// Raw key cache read: every object directly under the prefix, manifest
    /// included.
    pub async fn get_keys(&self) -> Result<Arc<Vec<String>>, StorageError> {
        self.keys.get().await.map(|lookup| lookup.value)
    }

    /// Ordering cache read. `error` is set only for the call whose fetch
    /// installed a negative entry.
    pub async fn get_ordering_config(
        &self,
    ) -> Result<Lookup<OrderingConfig, OrderingError>, OrderingError> {
        self.ordering.get().await
    }

    /// Photo keys of the album in bucket order, manifest excluded.
    pub async fn get_all_image_keys(&self) -> Result<Vec<String>, AlbumError> {
        let keys = self.get_keys().await.map_err(|source| AlbumError::Listing {
            path: self.path.clone(),
            source,
        })?;
        Ok(keys
            .iter()
            .filter(|k| **k != self.manifest_key)
            .cloned()
            .collect())
    }

    /// Ordering config for a render. Never fails: any manifest problem
    /// degrades to "no manifest".
    async fn ordering_for_render(&self) -> Arc<OrderingConfig> {
        match self.get_ordering_config().await {
            Ok(Lookup { value, error: None }) => value,
            Ok(Lookup {
                value,
                error: Some(err),
            }) => {
                if matches!(err, OrderingError::NotFound { .. }) {
                    debug!(album = %self.path, "no ordering manifest");
                } else {
                    warn!(album = %self.path, error = %err, "ignoring ordering manifest");
                }
                value
            }
            Err(err) => {
                warn!(album = %self.path, error = %err, "ordering manifest unavailable, using bucket order");
                Arc::new(OrderingConfig::negative())
            }
        }
    }

    /// Fill both caches ahead of the first render.
    pub async fn warm(&self) {
        let (keys, ordering) = tokio::join!(self.keys.get(), self.ordering.get());
        match keys {
            Ok(lookup) => info!(album = %self.path, keys = lookup.value.len(), "warmed key cache"),
            Err(err) => warn!(album = %self.path, error = %err, "unable to warm key cache"),
        }
        if let Err(err) = ordering {
            warn!(album = %self.path, error = %err, "unable to warm ordering cache");
        }
    }

    // ------------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------------

    /// Cover, thumbnails and full ordering from the current cache snapshots.
    pub async fn get_ordered_photos(&self) -> Result<AlbumOrdering, AlbumError> {
        let config = self.ordering_for_render().await;
        let keys = self.get_all_image_keys().await?;
        let selection = merge::select(&keys, &config);

        for discrepancy in &selection.discrepancies {
            warn!(
                album = %self.path,
                field = %discrepancy.field,
                key = %discrepancy.key,
                "ordering manifest names a photo that is not in the bucket"
            );
        }

        let resource = |key: &String| self.photos.for_key(key);
        Ok(AlbumOrdering {
            cover: selection.cover.as_ref().map(resource),
            thumbnails: selection.thumbnails.iter().map(resource).collect(),
            ordering: selection.ordering.iter().map(resource).collect(),
        })
    }

    pub async fn get_cover_photo(&self) -> Result<PhotoResource, AlbumError> {
        self.get_ordered_photos()
            .await?
            .cover
            .ok_or_else(|| AlbumError::Empty {
                path: self.path.clone(),
            })
    }

    /// Thumbnails for index templates, which have no way to show an error.
    pub async fn get_thumbnail_photos_for_template(&self) -> Vec<PhotoResource> {
        match self.get_ordered_photos().await {
            Ok(ordering) => ordering.thumbnails,
            Err(err) => {
                warn!(album = %self.path, error = %err, "no thumbnails for template");
                Vec::new()
            }
        }
    }

    /// Whether `<bucket_prefix><slug>` exists, asked of the bucket directly.
    pub async fn image_exists(&self, slug: &str) -> bool {
        if slug.is_empty() || slug.contains('/') || slug == naming::MANIFEST_FILENAME {
            return false;
        }
        let key = format!("{}{slug}", self.bucket_prefix);
        match self.source.exists(&key).await {
            Ok(exists) => exists,
            Err(err) => {
                warn!(album = %self.path, key = %key, error = %err, "unable to check image");
                false
            }
        }
    }

    /// Resource for an image page, without consulting any cache.
    pub fn photo_for_slug(&self, slug: &str) -> PhotoResource {
        self.photos.for_key(&format!("{}{slug}", self.bucket_prefix))
    }
}
