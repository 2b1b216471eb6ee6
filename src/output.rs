//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Check
//!
//! ```text
//! photos.example.com (2 albums)
//!     Canonical: https://photos.example.com
//!     Storage: s3 bucket example-photos
//!     Photos: imgix https://example.imgix.net/
//!     Cache TTL: 3600s
//! Albums
//! 001 Japan → /japan/
//!     Prefix: japan/
//! 002 Family → /family/
//!     Prefix: family/
//!     Auth: family
//! ```
//!
//! ## Show
//!
//! ```text
//! Japan → https://photos.example.com/japan/ (3 photos)
//! Cover
//!     japan/c.jpg
//! Thumbnails
//!     001 japan/b.jpg
//! Ordering
//!     001 japan/c.jpg
//!     002 japan/a.jpg
//!     003 japan/b.jpg
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! no I/O, no cache reads.

use serde::Serialize;

use crate::album::{Album, AlbumError};
use crate::config::{PhotoBackend, SiteConfig, StorageBackend};
use crate::photo::PhotoResource;
use crate::types::AlbumOrdering;

/// Width requested for display URLs in `show` output.
pub const DISPLAY_WIDTH: u32 = 1600;
/// Box requested for thumbnail URLs in `show` output.
pub const THUMBNAIL_SIZE: (u32, u32) = (400, 400);

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn album_title(album: &Album) -> &str {
    if album.album_title().is_empty() {
        album.path()
    } else {
        album.album_title()
    }
}

fn storage_line(config: &SiteConfig) -> String {
    match config.storage.backend {
        StorageBackend::S3 => match &config.storage.region {
            Some(region) => format!("s3 bucket {} ({region})", config.storage.bucket),
            None => format!("s3 bucket {}", config.storage.bucket),
        },
        StorageBackend::Local => format!("local {}", config.storage.root),
    }
}

fn photos_line(config: &SiteConfig) -> String {
    let backend = match config.photos.backend {
        PhotoBackend::Direct => "direct",
        PhotoBackend::Imgix => "imgix",
    };
    format!("{backend} {}", config.photos.base_url)
}

// ============================================================================
// Check
// ============================================================================

/// Format the validated site configuration.
pub fn format_site(config: &SiteConfig) -> Vec<String> {
    let scheme = if config.canonical_secure { "https" } else { "http" };
    let mut lines = vec![
        format!("{} ({} albums)", config.domain, config.albums.len()),
        format!("{}Canonical: {scheme}://{}", indent(1), config.domain),
        format!("{}Storage: {}", indent(1), storage_line(config)),
        format!("{}Photos: {}", indent(1), photos_line(config)),
        format!("{}Cache TTL: {}s", indent(1), config.cache.ttl_secs),
    ];
    if config.has_album_index {
        lines.push(format!("{}Album index: /", indent(1)));
    }

    lines.push("Albums".to_string());
    for (i, album) in config.albums.iter().enumerate() {
        let title = if album.album_title.is_empty() {
            &album.path
        } else {
            &album.album_title
        };
        lines.push(format!(
            "{} {} \u{2192} {}",
            format_index(i + 1),
            title,
            album.path
        ));
        lines.push(format!("{}Prefix: {}", indent(1), album.bucket_prefix));
        if let Some(user) = &album.auth_user {
            lines.push(format!("{}Auth: {user}", indent(1)));
        }
    }
    lines
}

/// Print the site configuration to stdout.
pub fn print_site(config: &SiteConfig) {
    for line in format_site(config) {
        println!("{}", line);
    }
}

/// One line per probed album: photo count, or why the listing failed.
pub fn format_probe(album: &Album, result: &Result<usize, AlbumError>) -> String {
    match result {
        Ok(count) => format!("{} {count} photos", album.path()),
        Err(err) => format!("{} FAILED: {err}", album.path()),
    }
}

// ============================================================================
// Show
// ============================================================================

/// Format an album's cover, thumbnails and full ordering.
pub fn format_ordering(album: &Album, ordering: &AlbumOrdering) -> Vec<String> {
    let mut lines = vec![format!(
        "{} \u{2192} {} ({} photos)",
        album_title(album),
        album.canonical_url(),
        ordering.ordering.len()
    )];

    lines.push("Cover".to_string());
    match ordering.cover_key() {
        Some(key) => lines.push(format!("{}{key}", indent(1))),
        None => lines.push(format!("{}(none)", indent(1))),
    }

    lines.push("Thumbnails".to_string());
    for (i, key) in ordering.thumbnail_keys().into_iter().enumerate() {
        lines.push(format!("{}{} {key}", indent(1), format_index(i + 1)));
    }

    lines.push("Ordering".to_string());
    for (i, key) in ordering.ordering_keys().into_iter().enumerate() {
        lines.push(format!("{}{} {key}", indent(1), format_index(i + 1)));
    }
    lines
}

/// Print an album ordering to stdout.
pub fn print_ordering(album: &Album, ordering: &AlbumOrdering) {
    for line in format_ordering(album, ordering) {
        println!("{}", line);
    }
}

// ============================================================================
// JSON
// ============================================================================

/// A rendered photo as emitted by `show --json`.
#[derive(Debug, Serialize)]
pub struct PhotoView {
    pub key: String,
    pub slug: String,
    pub url: String,
    pub thumbnail_url: String,
}

impl PhotoView {
    fn new(photo: &PhotoResource) -> Self {
        let (width, height) = THUMBNAIL_SIZE;
        Self {
            key: photo.key().to_string(),
            slug: photo.slug().to_string(),
            url: photo.photo_for_width(DISPLAY_WIDTH),
            thumbnail_url: photo.thumbnail_for(width, height),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderingView {
    pub path: String,
    pub title: String,
    pub canonical_url: String,
    pub cover: Option<PhotoView>,
    pub thumbnails: Vec<PhotoView>,
    pub ordering: Vec<PhotoView>,
}

impl OrderingView {
    pub fn new(album: &Album, ordering: &AlbumOrdering) -> Self {
        Self {
            path: album.path().to_string(),
            title: album_title(album).to_string(),
            canonical_url: album.canonical_url().to_string(),
            cover: ordering.cover.as_ref().map(PhotoView::new),
            thumbnails: ordering.thumbnails.iter().map(PhotoView::new).collect(),
            ordering: ordering.ordering.iter().map(PhotoView::new).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AlbumConfig, stock_config_toml};
    use crate::test_helpers::*;
    use std::sync::Arc;

    // =========================================================================
    // Helpers
    // =========================================================================

    #[test]
    fn format_index_zero_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(1000), "1000");
    }

    #[test]
    fn indent_is_four_spaces_per_level() {
        assert_eq!(indent(0), "");
        assert_eq!(indent(2), "        ");
    }

    // =========================================================================
    // Check
    // =========================================================================

    #[test]
    fn site_lists_albums_with_prefix_and_auth() {
        let config: SiteConfig = toml::from_str(stock_config_toml()).unwrap();
        let lines = format_site(&config);

        assert_eq!(lines[0], "photos.example.com (2 albums)");
        assert!(lines.contains(&"    Album index: /".to_string()));
        let albums = lines.iter().position(|l| l == "Albums").unwrap();
        assert_eq!(lines[albums + 1], "001 Japan \u{2192} /japan/");
        assert_eq!(lines[albums + 2], "    Prefix: japan/");
        assert!(lines[albums..].contains(&"    Auth: family".to_string()));
    }

    #[test]
    fn untitled_album_shows_its_path() {
        let config = SiteConfig {
            domain: "example.com".into(),
            albums: vec![AlbumConfig::new("/", "")],
            ..SiteConfig::default()
        };
        let lines = format_site(&config);
        assert!(lines.contains(&"001 / \u{2192} /".to_string()));
        assert!(lines.contains(&"    Storage: local photos".to_string()));
    }

    #[tokio::test]
    async fn probe_lines() {
        let source = Arc::new(CountingSource::with_keys(["a.jpg"]));
        source.fail_listing(true);
        let album = album(&source, "/", "");

        assert_eq!(format_probe(&album, &Ok(3)), "/ 3 photos");
        let err = album.get_ordered_photos().await.unwrap_err();
        assert!(format_probe(&album, &Err(err)).starts_with("/ FAILED: "));
    }

    // =========================================================================
    // Show
    // =========================================================================

    #[tokio::test]
    async fn ordering_lists_cover_thumbnails_and_order() {
        let source = Arc::new(CountingSource::with_keys(["japan/a.jpg", "japan/b.jpg"]));
        source.put("japan/ordering.yaml", "cover: b.jpg\nordering: [b.jpg]\n");
        let album = album(&source, "/japan/", "japan/");
        let ordering = album.get_ordered_photos().await.unwrap();

        assert_eq!(
            format_ordering(&album, &ordering),
            vec![
                "/japan/ \u{2192} https://gallery.test/japan/ (2 photos)",
                "Cover",
                "    japan/b.jpg",
                "Thumbnails",
                "    001 japan/b.jpg",
                "Ordering",
                "    001 japan/b.jpg",
                "    002 japan/a.jpg",
            ]
        );
    }

    #[tokio::test]
    async fn empty_album_shows_no_cover() {
        let source = Arc::new(CountingSource::new());
        let album = album(&source, "/", "");
        let ordering = album.get_ordered_photos().await.unwrap();
        let lines = format_ordering(&album, &ordering);
        assert_eq!(lines[1..3], ["Cover".to_string(), "    (none)".to_string()]);
    }

    #[tokio::test]
    async fn json_view_renders_urls() {
        let source = Arc::new(CountingSource::with_keys(["japan/a.jpg"]));
        let album = album(&source, "/japan/", "japan/");
        let ordering = album.get_ordered_photos().await.unwrap();

        let json = serde_json::to_value(OrderingView::new(&album, &ordering)).unwrap();
        assert_eq!(json["path"], "/japan/");
        assert_eq!(json["cover"]["slug"], "a.jpg");
        assert_eq!(json["cover"]["url"], "https://photos.test/japan/a.jpg");
        assert_eq!(json["ordering"].as_array().unwrap().len(), 1);
        assert!(json["thumbnails"].as_array().unwrap().is_empty());
    }
}
