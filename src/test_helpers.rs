//! Shared test utilities for the fiftymm test suite.
//!
//! Provides an instrumented object source and album builders so cache and
//! facade tests can assert on round-trip counts.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let source = Arc::new(CountingSource::with_keys(["a.jpg", "b.jpg"]));
//! let album = album(&source, "/", "");
//!
//! album.get_ordered_photos().await.unwrap();
//! album.get_ordered_photos().await.unwrap();
//! assert_eq!(source.list_calls(), 1);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use url::Url;

use crate::album::Album;
use crate::cache::DEFAULT_TTL;
use crate::config::AlbumConfig;
use crate::photo::{DirectPhotos, PhotoFactory};
use crate::storage::{ListedObject, MemorySource, ObjectSource, StorageError};

// =========================================================================
// Instrumented source
// =========================================================================

/// [`MemorySource`] that counts round-trips and can be told to fail or lag.
#[derive(Default)]
pub struct CountingSource {
    inner: MemorySource,
    list_calls: AtomicUsize,
    get_calls: AtomicUsize,
    exists_calls: AtomicUsize,
    fail_list: AtomicBool,
    fail_get: AtomicBool,
    latency: Duration,
}

impl CountingSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_keys<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Self {
            inner: MemorySource::with_keys(keys),
            ..Self::default()
        }
    }

    /// Every round-trip sleeps for `latency` before answering.
    pub fn slow(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn put(&self, key: impl Into<String>, body: impl Into<Bytes>) {
        self.inner.put(key, body);
    }

    pub fn remove(&self, key: &str) {
        self.inner.remove(key);
    }

    pub fn fail_listing(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }

    pub fn fail_gets(&self, fail: bool) {
        self.fail_get.store(fail, Ordering::SeqCst);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn exists_calls(&self) -> usize {
        self.exists_calls.load(Ordering::SeqCst)
    }

    async fn lag(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    fn outage() -> StorageError {
        StorageError::Transport {
            message: "connection reset by peer".into(),
        }
    }
}

#[async_trait]
impl ObjectSource for CountingSource {
    async fn list(&self, prefix: &str) -> Result<Vec<ListedObject>, StorageError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.lag().await;
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(Self::outage());
        }
        self.inner.list(prefix).await
    }

    async fn get(&self, key: &str) -> Result<Bytes, StorageError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.lag().await;
        if self.fail_get.load(Ordering::SeqCst) {
            return Err(Self::outage());
        }
        self.inner.get(key).await
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        self.exists_calls.fetch_add(1, Ordering::SeqCst);
        self.lag().await;
        if self.fail_get.load(Ordering::SeqCst) {
            return Err(Self::outage());
        }
        self.inner.exists(key).await
    }
}

// =========================================================================
// Album builders
// =========================================================================

pub const PHOTO_BASE: &str = "https://photos.test/";

pub fn photos() -> Arc<dyn PhotoFactory> {
    Arc::new(DirectPhotos::new(Url::parse(PHOTO_BASE).unwrap()))
}

/// Album over `source` with the default one-hour TTL.
pub fn album(source: &Arc<CountingSource>, path: &str, prefix: &str) -> Album {
    album_with_ttl(source, path, prefix, DEFAULT_TTL)
}

pub fn album_with_ttl(
    source: &Arc<CountingSource>,
    path: &str,
    prefix: &str,
    ttl: Duration,
) -> Album {
    Album::new(
        &AlbumConfig::new(path, prefix),
        "https://gallery.test",
        source.clone(),
        photos(),
        ttl,
    )
}

// =========================================================================
// Async polling
// =========================================================================

/// Poll `condition` until it holds. Panics after two seconds.
pub async fn wait_until(condition: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while !condition() {
        assert!(
            Instant::now() < deadline,
            "condition not reached within two seconds"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
