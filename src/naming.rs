//! Centralized bucket-key conventions.
//!
//! Every component that touches object keys (listing, manifest fetch, merge,
//! photo resources) goes through these helpers so the conventions stay in one
//! place:
//!
//! - Keys ending in `/` are directory markers, never photos.
//! - Keys are compared with one leading `/` stripped.
//! - Each album may carry an `ordering.yaml` manifest directly under its
//!   bucket prefix.
//! - Manifest entries are references resolved against the album's URL path,
//!   the same way a browser resolves a relative link against a page URL.
//!
//! ## Reference Resolution
//!
//! For an album at `/japan/`:
//! - `c.jpg` → `japan/c.jpg`
//! - `./c.jpg` → `japan/c.jpg`
//! - `../italy/rome.jpg` → `italy/rome.jpg`
//! - `/japan/c.jpg` → `japan/c.jpg`

use std::borrow::Cow;
use url::Url;

/// Fixed filename of the per-album ordering manifest.
pub const MANIFEST_FILENAME: &str = "ordering.yaml";

/// Origin used purely as a resolution anchor; it never leaves this module.
const RESOLUTION_ORIGIN: &str = "http://album.invalid/";

/// Bucket key of an album's ordering manifest.
pub fn manifest_key(bucket_prefix: &str) -> String {
    format!("{bucket_prefix}{MANIFEST_FILENAME}")
}

/// Album prefix in listing form: empty for the bucket root, otherwise ending
/// in exactly one `/` so listings and the manifest key agree.
pub fn album_prefix(bucket_prefix: &str) -> String {
    let trimmed = bucket_prefix.trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{trimmed}/")
    }
}

/// Whether a listed key is a directory placeholder rather than an object.
pub fn is_directory_marker(key: &str) -> bool {
    key.ends_with('/')
}

/// Strip exactly one leading `/`.
pub fn strip_leading_slash(key: &str) -> &str {
    key.strip_prefix('/').unwrap_or(key)
}

/// Last path segment of a key (`japan/001.jpg` → `001.jpg`).
pub fn slug_for_key(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

/// Resolve a manifest reference against an album path into a bucket key.
///
/// The result is percent-decoded and has its leading `/` removed, so it can
/// be compared directly with listed keys.
pub fn resolve_reference(album_path: &str, reference: &str) -> Result<String, url::ParseError> {
    let base = Url::parse(RESOLUTION_ORIGIN)?.join(album_path)?;
    let resolved = base.join(reference)?;
    let path = urlencoding::decode(resolved.path()).unwrap_or(Cow::Borrowed(resolved.path()));
    Ok(strip_leading_slash(&path).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_key_sits_under_prefix() {
        assert_eq!(manifest_key("japan/"), "japan/ordering.yaml");
        assert_eq!(manifest_key(""), "ordering.yaml");
    }

    #[test]
    fn album_prefix_ends_with_one_slash() {
        assert_eq!(album_prefix("japan"), "japan/");
        assert_eq!(album_prefix("japan/"), "japan/");
        assert_eq!(album_prefix("travel/japan//"), "travel/japan/");
        assert_eq!(album_prefix(""), "");
        assert_eq!(album_prefix("/"), "");
    }

    #[test]
    fn directory_markers_end_with_slash() {
        assert!(is_directory_marker("japan/"));
        assert!(is_directory_marker("japan/raw/"));
        assert!(!is_directory_marker("japan/001.jpg"));
    }

    #[test]
    fn strips_only_one_leading_slash() {
        assert_eq!(strip_leading_slash("/a.jpg"), "a.jpg");
        assert_eq!(strip_leading_slash("//a.jpg"), "/a.jpg");
        assert_eq!(strip_leading_slash("a.jpg"), "a.jpg");
    }

    #[test]
    fn slug_is_last_segment() {
        assert_eq!(slug_for_key("japan/tokyo/001.jpg"), "001.jpg");
        assert_eq!(slug_for_key("001.jpg"), "001.jpg");
    }

    // =========================================================================
    // Reference resolution
    // =========================================================================

    #[test]
    fn relative_reference_lands_under_album() {
        assert_eq!(resolve_reference("/japan/", "c.jpg").unwrap(), "japan/c.jpg");
        assert_eq!(resolve_reference("/japan/", "./c.jpg").unwrap(), "japan/c.jpg");
    }

    #[test]
    fn root_album_reference_is_bare_key() {
        assert_eq!(resolve_reference("/", "c.jpg").unwrap(), "c.jpg");
    }

    #[test]
    fn parent_reference_leaves_album() {
        assert_eq!(
            resolve_reference("/japan/", "../italy/rome.jpg").unwrap(),
            "italy/rome.jpg"
        );
    }

    #[test]
    fn absolute_reference_ignores_album() {
        assert_eq!(
            resolve_reference("/japan/", "/italy/rome.jpg").unwrap(),
            "italy/rome.jpg"
        );
    }

    #[test]
    fn album_path_without_trailing_slash_resolves_as_sibling() {
        assert_eq!(resolve_reference("/japan", "c.jpg").unwrap(), "c.jpg");
    }

    #[test]
    fn resolved_key_is_percent_decoded() {
        assert_eq!(
            resolve_reference("/japan/", "mount fuji.jpg").unwrap(),
            "japan/mount fuji.jpg"
        );
    }
}
