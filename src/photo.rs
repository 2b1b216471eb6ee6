//! Renderable photo resources.
//!
//! The album core hands out keys; templates need URLs. A [`PhotoFactory`]
//! turns a bucket key into a [`PhotoResource`] that can render a display URL
//! for a width and a cropped thumbnail URL for a width × height box.
//!
//! Two factories are built in:
//!
//! - [`DirectPhotos`]: the key appended to a public base URL (a public bucket
//!   or a CDN in front of it). Sizes are ignored.
//! - [`ImgixPhotos`]: an image-resizing service in front of the bucket. Sizes
//!   become `w`/`max-h` query parameters and thumbnails are face-cropped.
//!
//! Signed-URL strategies plug in by implementing [`PhotoFactory`].

use std::fmt;
use std::sync::Arc;

use tracing::warn;
use url::Url;

use crate::config::{PhotoBackend, PhotosConfig};
use crate::naming;

/// Anything a template can turn into an `<img>`.
pub trait Renderable: Send + Sync + fmt::Debug {
    /// Bucket key of the photo.
    fn key(&self) -> &str;

    /// Last path segment of the key, used in image-page URLs.
    fn slug(&self) -> &str {
        naming::slug_for_key(self.key())
    }

    fn photo_for_width(&self, width: u32) -> String;

    fn thumbnail_for(&self, width: u32, height: u32) -> String;
}

pub type PhotoResource = Arc<dyn Renderable>;

/// Key → resource conversion. Must not fail; unrenderable keys yield
/// resources with empty URLs.
pub trait PhotoFactory: Send + Sync {
    fn for_key(&self, key: &str) -> PhotoResource;
}

/// Build the configured photo factory.
pub fn factory_from_config(config: &PhotosConfig) -> Result<Arc<dyn PhotoFactory>, url::ParseError> {
    let base = Url::parse(&config.base_url)?;
    Ok(match config.backend {
        PhotoBackend::Direct => Arc::new(DirectPhotos::new(base)),
        PhotoBackend::Imgix => Arc::new(ImgixPhotos::new(base)),
    })
}

fn join_key(base: &Url, key: &str) -> Option<Url> {
    match base.join(key) {
        Ok(url) => Some(url),
        Err(err) => {
            warn!(key, error = %err, "unable to build photo URL");
            None
        }
    }
}

// ============================================================================
// Direct
// ============================================================================

pub struct DirectPhotos {
    base: Url,
}

impl DirectPhotos {
    pub fn new(base: Url) -> Self {
        Self { base }
    }
}

impl PhotoFactory for DirectPhotos {
    fn for_key(&self, key: &str) -> PhotoResource {
        Arc::new(DirectPhoto {
            key: key.to_string(),
            url: join_key(&self.base, key),
        })
    }
}

#[derive(Debug)]
pub struct DirectPhoto {
    key: String,
    url: Option<Url>,
}

impl Renderable for DirectPhoto {
    fn key(&self) -> &str {
        &self.key
    }

    fn photo_for_width(&self, _width: u32) -> String {
        self.url.as_ref().map(Url::to_string).unwrap_or_default()
    }

    fn thumbnail_for(&self, width: u32, _height: u32) -> String {
        self.photo_for_width(width)
    }
}

// ============================================================================
// Imgix-style resizing service
// ============================================================================

pub struct ImgixPhotos {
    base: Url,
}

impl ImgixPhotos {
    pub fn new(base: Url) -> Self {
        Self { base }
    }
}

impl PhotoFactory for ImgixPhotos {
    fn for_key(&self, key: &str) -> PhotoResource {
        Arc::new(ImgixPhoto {
            key: key.to_string(),
            url: join_key(&self.base, key),
        })
    }
}

#[derive(Debug)]
pub struct ImgixPhoto {
    key: String,
    url: Option<Url>,
}

impl ImgixPhoto {
    /// Render with query parameters, which must already be in key order.
    fn with_query(&self, params: &[(&str, String)]) -> String {
        let Some(url) = &self.url else {
            return String::new();
        };
        let mut url = url.clone();
        {
            let mut query = url.query_pairs_mut();
            for (name, value) in params {
                query.append_pair(name, value);
            }
        }
        url.to_string()
    }
}

impl Renderable for ImgixPhoto {
    fn key(&self) -> &str {
        &self.key
    }

    fn photo_for_width(&self, width: u32) -> String {
        self.with_query(&[("w", width.to_string())])
    }

    fn thumbnail_for(&self, width: u32, height: u32) -> String {
        self.with_query(&[
            ("crop", "faces".to_string()),
            ("fit", "crop".to_string()),
            ("max-h", height.to_string()),
            ("w", width.to_string()),
        ])
    }
}

// ============================================================================
// Placeholder
// ============================================================================

/// Stand-in for templates that must render *something* when the real photo
/// could not be resolved.
#[derive(Debug, Default)]
pub struct ErrorPhoto;

impl Renderable for ErrorPhoto {
    fn key(&self) -> &str {
        ""
    }

    fn photo_for_width(&self, _width: u32) -> String {
        String::new()
    }

    fn thumbnail_for(&self, _width: u32, _height: u32) -> String {
        String::new()
    }
}
