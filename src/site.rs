//! A configured site: one domain, one bucket, many albums.
//!
//! [`Site`] is built once at startup and shared by every request. It owns the
//! object source and photo factory and hands both to each [`Album`], so all
//! albums of a site talk to the same bucket through the same client.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::album::Album;
use crate::config::SiteConfig;
use crate::photo::{self, PhotoFactory};
use crate::storage::{self, ObjectSource, StorageError};

#[derive(Error, Debug)]
pub enum SiteError {
    #[error("storage setup failed: {0}")]
    Storage(#[from] StorageError),
    #[error("invalid photos.base_url: {0}")]
    PhotoBaseUrl(#[from] url::ParseError),
    #[error("no album at {path} on {domain}")]
    AlbumNotFound { domain: String, path: String },
}

pub struct Site {
    config: SiteConfig,
    canonical_url: String,
    albums: Vec<Album>,
}

impl Site {
    pub fn new(
        config: SiteConfig,
        source: Arc<dyn ObjectSource>,
        photos: Arc<dyn PhotoFactory>,
    ) -> Self {
        let scheme = if config.canonical_secure { "https" } else { "http" };
        let canonical_url = format!("{scheme}://{}", config.domain);
        let ttl = config.cache.ttl();
        let albums = config
            .albums
            .iter()
            .map(|album| {
                Album::new(
                    album,
                    &canonical_url,
                    Arc::clone(&source),
                    Arc::clone(&photos),
                    ttl,
                )
            })
            .collect();
        Self {
            config,
            canonical_url,
            albums,
        }
    }

    /// Build the storage client and photo factory the config names.
    pub fn from_config(config: SiteConfig) -> Result<Self, SiteError> {
        let source = storage::source_from_config(&config.storage)?;
        let photos = photo::factory_from_config(&config.photos)?;
        info!(
            domain = %config.domain,
            backend = ?config.storage.backend,
            albums = config.albums.len(),
            "site configured"
        );
        Ok(Self::new(config, source, photos))
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    /// `http[s]://<domain>`, without a trailing slash.
    pub fn canonical_url(&self) -> &str {
        &self.canonical_url
    }

    /// The album served at `path`. A missing trailing slash is tolerated.
    pub fn album_for_path(&self, path: &str) -> Result<&Album, SiteError> {
        let wanted = if path.ends_with('/') {
            path.to_string()
        } else {
            format!("{path}/")
        };
        self.albums
            .iter()
            .find(|album| album.path() == wanted)
            .ok_or_else(|| SiteError::AlbumNotFound {
                domain: self.config.domain.clone(),
                path: path.to_string(),
            })
    }

    /// Albums in config order, for the `/` index page. Empty unless the site
    /// has an album index.
    pub fn albums_for_index(&self) -> &[Album] {
        if self.config.has_album_index {
            &self.albums
        } else {
            &[]
        }
    }

    pub fn albums(&self) -> &[Album] {
        &self.albums
    }

    /// Populate every album's caches concurrently.
    pub async fn warm(&self) {
        futures::future::join_all(self.albums.iter().map(Album::warm)).await;
    }
}
