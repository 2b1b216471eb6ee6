//! Shared types passed between the caches, the merge engine and the album
//! facade.

use crate::photo::PhotoResource;

/// Parsed ordering manifest with every key already resolved to bucket form.
///
/// A *negative* config stands for "no usable manifest": the manifest was
/// missing or malformed. It carries no overrides and is cached like any
/// other config, which keeps albums without a manifest from re-fetching it
/// on every render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderingConfig {
    pub cover: Option<String>,
    pub thumbnails: Vec<String>,
    pub ordering: Vec<String>,
    pub is_negative: bool,
}

impl OrderingConfig {
    pub fn negative() -> Self {
        Self {
            is_negative: true,
            ..Self::default()
        }
    }
}

/// Photos of an album in display order, rebuilt on every request from the
/// current cache snapshots.
#[derive(Debug, Clone)]
pub struct AlbumOrdering {
    /// `None` only when the album has no photos.
    pub cover: Option<PhotoResource>,
    /// At most [`MAX_THUMBNAILS`](crate::merge::MAX_THUMBNAILS) photos.
    pub thumbnails: Vec<PhotoResource>,
    /// Every photo of the album.
    pub ordering: Vec<PhotoResource>,
}

impl AlbumOrdering {
    pub fn cover_key(&self) -> Option<&str> {
        self.cover.as_ref().map(|p| p.key())
    }

    pub fn thumbnail_keys(&self) -> Vec<&str> {
        self.thumbnails.iter().map(|p| p.key()).collect()
    }

    pub fn ordering_keys(&self) -> Vec<&str> {
        self.ordering.iter().map(|p| p.key()).collect()
    }
}
