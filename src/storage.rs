//! Object sources: where album keys and manifests come from.
//!
//! The album core only needs three round-trips against a bucket, captured by
//! [`ObjectSource`]:
//!
//! | Call | Used by |
//! |------|---------|
//! | [`list`](ObjectSource::list) | key cache (one level under the album prefix, `/` delimiter) |
//! | [`get`](ObjectSource::get) | ordering cache (the `ordering.yaml` manifest) |
//! | [`exists`](ObjectSource::exists) | image-page lookups, bypassing every cache |
//!
//! Two implementations ship with the crate:
//!
//! - [`ObjectStoreSource`] wraps any `object_store` backend (S3, local
//!   filesystem, in-memory). S3 and the local filesystem are what a
//!   configured site uses.
//! - [`MemorySource`] is a plain in-process map with S3-style delimiter
//!   listing, used by tests and embedders that want full control.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use object_store::path::Path as ObjectPath;
use object_store::{GetOptions, ObjectStore};
use parking_lot::RwLock;
use thiserror::Error;

use crate::config::{StorageBackend, StorageConfig};
use crate::naming;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("object not found: {key}")]
    NotFound { key: String },
    #[error("invalid object key {key:?}: {message}")]
    InvalidKey { key: String, message: String },
    #[error("storage request failed: {message}")]
    Transport { message: String },
    #[error("storage backend misconfigured: {message}")]
    Backend { message: String },
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    fn transport(err: object_store::Error) -> Self {
        Self::Transport {
            message: err.to_string(),
        }
    }

    fn from_object_store(err: object_store::Error, key: &str) -> Self {
        match err {
            object_store::Error::NotFound { .. } => Self::NotFound {
                key: key.to_string(),
            },
            other => Self::transport(other),
        }
    }
}

/// One entry of a delimited listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedObject {
    pub key: String,
    /// True for common prefixes and zero-byte `folder/` placeholders.
    pub is_directory: bool,
}

impl ListedObject {
    pub fn object(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            is_directory: false,
        }
    }

    pub fn directory(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            is_directory: true,
        }
    }
}

/// A bucket, already bound to its name and credentials.
#[async_trait]
pub trait ObjectSource: Send + Sync {
    /// List keys one level below `prefix`, in bucket (lexicographic) order.
    async fn list(&self, prefix: &str) -> Result<Vec<ListedObject>, StorageError>;

    /// Fetch an object body. Missing objects are [`StorageError::NotFound`].
    async fn get(&self, key: &str) -> Result<Bytes, StorageError>;

    /// Whether an object exists, without fetching its body.
    async fn exists(&self, key: &str) -> Result<bool, StorageError>;
}

/// Build the configured object source.
pub fn source_from_config(config: &StorageConfig) -> Result<Arc<dyn ObjectSource>, StorageError> {
    let store: Arc<dyn ObjectStore> = match config.backend {
        StorageBackend::S3 => {
            let mut builder = object_store::aws::AmazonS3Builder::from_env()
                .with_bucket_name(&config.bucket)
                .with_allow_http(false);
            if let Some(region) = &config.region {
                builder = builder.with_region(region);
            }
            Arc::new(builder.build().map_err(|e| StorageError::Backend {
                message: format!("failed to create S3 client: {e}"),
            })?)
        }
        StorageBackend::Local => Arc::new(
            object_store::local::LocalFileSystem::new_with_prefix(&config.root).map_err(|e| {
                StorageError::Backend {
                    message: format!("failed to open local store at {}: {e}", config.root),
                }
            })?,
        ),
    };
    Ok(Arc::new(ObjectStoreSource::new(store)))
}

// ============================================================================
// object_store adapter
// ============================================================================

/// [`ObjectSource`] over any `object_store` backend.
pub struct ObjectStoreSource {
    inner: Arc<dyn ObjectStore>,
}

impl ObjectStoreSource {
    pub fn new(inner: Arc<dyn ObjectStore>) -> Self {
        Self { inner }
    }

    pub fn memory() -> Self {
        Self::new(Arc::new(object_store::memory::InMemory::new()))
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.inner
    }
}

fn object_path(key: &str) -> Result<ObjectPath, StorageError> {
    ObjectPath::parse(key).map_err(|e| StorageError::InvalidKey {
        key: key.to_string(),
        message: e.to_string(),
    })
}

#[async_trait]
impl ObjectSource for ObjectStoreSource {
    async fn list(&self, prefix: &str) -> Result<Vec<ListedObject>, StorageError> {
        let prefix_path = if prefix.trim_matches('/').is_empty() {
            None
        } else {
            Some(object_path(prefix)?)
        };
        let listing = self
            .inner
            .list_with_delimiter(prefix_path.as_ref())
            .await
            .map_err(StorageError::transport)?;

        let mut objects: Vec<ListedObject> = listing
            .objects
            .into_iter()
            .map(|meta| ListedObject::object(meta.location.to_string()))
            .collect();
        // LocalFileSystem yields directory order, not key order
        objects.sort_by(|a, b| a.key.cmp(&b.key));
        objects.extend(
            listing
                .common_prefixes
                .into_iter()
                .map(|p| ListedObject::directory(format!("{p}/"))),
        );
        Ok(objects)
    }

    async fn get(&self, key: &str) -> Result<Bytes, StorageError> {
        let path = object_path(key)?;
        let result = self
            .inner
            .get_opts(&path, GetOptions::default())
            .await
            .map_err(|e| StorageError::from_object_store(e, key))?;
        result
            .bytes()
            .await
            .map_err(|e| StorageError::from_object_store(e, key))
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let path = object_path(key)?;
        let options = GetOptions {
            head: true,
            ..Default::default()
        };
        match self.inner.get_opts(&path, options).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::transport(e)),
        }
    }
}

// ============================================================================
// In-process source
// ============================================================================

/// Map-backed [`ObjectSource`] with S3 delimiter semantics.
#[derive(Debug, Default)]
pub struct MemorySource {
    objects: RwLock<BTreeMap<String, Bytes>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a source holding `keys`, each with an empty body.
    pub fn with_keys<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        let source = Self::new();
        for key in keys {
            source.put(key, Bytes::new());
        }
        source
    }

    pub fn put(&self, key: impl Into<String>, body: impl Into<Bytes>) {
        self.objects.write().insert(key.into(), body.into());
    }

    pub fn remove(&self, key: &str) -> Option<Bytes> {
        self.objects.write().remove(key)
    }

    /// Synchronous form of [`ObjectSource::list`].
    pub fn list_now(&self, prefix: &str) -> Vec<ListedObject> {
        let objects = self.objects.read();
        let mut listed = Vec::new();
        let mut directories: Vec<String> = Vec::new();
        for key in objects.keys() {
            let Some(rest) = key.strip_prefix(prefix) else {
                continue;
            };
            match rest.find('/') {
                Some(pos) => directories.push(format!("{prefix}{}", &rest[..=pos])),
                None if naming::is_directory_marker(key) => {
                    listed.push(ListedObject::directory(key.clone()))
                }
                None => listed.push(ListedObject::object(key.clone())),
            }
        }
        // sorted keys keep each common prefix contiguous
        directories.dedup();
        listed.extend(directories.into_iter().map(ListedObject::directory));
        listed
    }
}

#[async_trait]
impl ObjectSource for MemorySource {
    async fn list(&self, prefix: &str) -> Result<Vec<ListedObject>, StorageError> {
        Ok(self.list_now(prefix))
    }

    async fn get(&self, key: &str) -> Result<Bytes, StorageError> {
        self.objects
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound {
                key: key.to_string(),
            })
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.objects.read().contains_key(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use object_store::{PutOptions, PutPayload};
    use tempfile::TempDir;

    fn keys(listed: &[ListedObject]) -> Vec<(&str, bool)> {
        listed
            .iter()
            .map(|o| (o.key.as_str(), o.is_directory))
            .collect()
    }

    // =========================================================================
    // MemorySource
    // =========================================================================

    #[tokio::test]
    async fn memory_lists_one_level_in_key_order() {
        let source = MemorySource::with_keys([
            "japan/b.jpg",
            "japan/a.jpg",
            "japan/raw/001.cr2",
            "japan/raw/002.cr2",
            "italy/rome.jpg",
        ]);
        let listed = source.list("japan/").await.unwrap();
        assert_eq!(
            keys(&listed),
            vec![
                ("japan/a.jpg", false),
                ("japan/b.jpg", false),
                ("japan/raw/", true),
            ]
        );
    }

    #[tokio::test]
    async fn memory_folder_placeholder_is_directory() {
        let source = MemorySource::with_keys(["japan/", "japan/a.jpg"]);
        let listed = source.list("japan/").await.unwrap();
        assert_eq!(keys(&listed), vec![("japan/", true), ("japan/a.jpg", false)]);
    }

    #[tokio::test]
    async fn memory_root_prefix_lists_top_level() {
        let source = MemorySource::with_keys(["a.jpg", "japan/b.jpg"]);
        let listed = source.list("").await.unwrap();
        assert_eq!(keys(&listed), vec![("a.jpg", false), ("japan/", true)]);
    }

    #[tokio::test]
    async fn memory_get_missing_is_not_found() {
        let source = MemorySource::new();
        let err = source.get("japan/ordering.yaml").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn memory_get_and_exists() {
        let source = MemorySource::new();
        source.put("a.jpg", "body");
        assert_eq!(source.get("a.jpg").await.unwrap(), Bytes::from("body"));
        assert!(source.exists("a.jpg").await.unwrap());
        assert!(!source.exists("b.jpg").await.unwrap());

        source.remove("a.jpg");
        assert!(!source.exists("a.jpg").await.unwrap());
    }

    // =========================================================================
    // ObjectStoreSource
    // =========================================================================

    async fn put(source: &ObjectStoreSource, key: &str, body: &'static [u8]) {
        source
            .store()
            .put_opts(
                &ObjectPath::parse(key).unwrap(),
                PutPayload::from_bytes(Bytes::from_static(body)),
                PutOptions::default(),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn object_store_lists_objects_and_prefixes() {
        let source = ObjectStoreSource::memory();
        put(&source, "japan/b.jpg", b"b").await;
        put(&source, "japan/a.jpg", b"a").await;
        put(&source, "japan/raw/001.cr2", b"r").await;
        put(&source, "italy/rome.jpg", b"r").await;

        let listed = source.list("japan/").await.unwrap();
        assert_eq!(
            keys(&listed),
            vec![
                ("japan/a.jpg", false),
                ("japan/b.jpg", false),
                ("japan/raw/", true),
            ]
        );
    }

    #[tokio::test]
    async fn object_store_empty_prefix_lists_root() {
        let source = ObjectStoreSource::memory();
        put(&source, "a.jpg", b"a").await;
        put(&source, "japan/b.jpg", b"b").await;

        let listed = source.list("").await.unwrap();
        assert_eq!(keys(&listed), vec![("a.jpg", false), ("japan/", true)]);
    }

    #[tokio::test]
    async fn object_store_get_maps_not_found() {
        let source = ObjectStoreSource::memory();
        let err = source.get("japan/ordering.yaml").await.unwrap_err();
        assert_eq!(
            err,
            StorageError::NotFound {
                key: "japan/ordering.yaml".into()
            }
        );
    }

    #[tokio::test]
    async fn object_store_get_and_exists() {
        let source = ObjectStoreSource::memory();
        put(&source, "japan/ordering.yaml", b"cover: a.jpg").await;

        let body = source.get("japan/ordering.yaml").await.unwrap();
        assert_eq!(body, Bytes::from_static(b"cover: a.jpg"));
        assert!(source.exists("japan/ordering.yaml").await.unwrap());
        assert!(!source.exists("japan/missing.jpg").await.unwrap());
    }

    #[tokio::test]
    async fn local_backend_lists_in_key_order() {
        let tmp = TempDir::new().unwrap();
        let album = tmp.path().join("japan");
        std::fs::create_dir_all(album.join("raw")).unwrap();
        for name in ["c.jpg", "a.jpg", "b.jpg"] {
            std::fs::write(album.join(name), name).unwrap();
        }

        let config = StorageConfig {
            backend: StorageBackend::Local,
            root: tmp.path().to_string_lossy().into_owned(),
            ..StorageConfig::default()
        };
        let source = source_from_config(&config).unwrap();
        let listed = source.list("japan/").await.unwrap();
        let files: Vec<&str> = listed
            .iter()
            .filter(|o| !o.is_directory)
            .map(|o| o.key.as_str())
            .collect();
        assert_eq!(files, vec!["japan/a.jpg", "japan/b.jpg", "japan/c.jpg"]);
    }
}
