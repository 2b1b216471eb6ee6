//! Time-bounded, stale-serving cache slots.
//!
//! Listing a bucket or fetching a manifest costs a storage round-trip, and
//! every album page render needs both. Each album therefore keeps one
//! [`CacheSlot`] per remote resource, and page renders read the slot instead
//! of the bucket.
//!
//! # Read Policy
//!
//! | Slot state | Reader | Fetch |
//! |------------|--------|-------|
//! | empty (cold) | waits for the fetch | performed by the first reader; later readers wait on it |
//! | fresh | gets the cached value | none |
//! | stale | gets the cached value immediately | at most one background refresh |
//!
//! A value is stale once it is older than the slot's TTL. Stale values stay
//! servable for as long as refreshes keep failing.
//!
//! # Coordination
//!
//! Each slot owns a refresh gate (an async mutex). A cold read takes the gate,
//! re-checks whether someone else already populated the slot, and only then
//! fetches. Stale reads `try_lock` the gate: the winner spawns the refresh and
//! holds the gate until it finishes, losers return without spawning. The
//! spawned refresh re-checks staleness under the gate, so a contender that
//! arrives right after a refresh published performs no work.
//!
//! Published values are `Arc` snapshots swapped under a short, synchronous
//! write lock. Readers never see a half-built value and the lock is never
//! held across an await.
//!
//! # Fetch Outcomes
//!
//! A [`Fetch`] implementation decides what gets cached:
//!
//! - [`Fetched::Install`] with `error: None`: a normal value.
//! - [`Fetched::Install`] with `error: Some(_)`: a *negative* entry. The value
//!   is cached for the full TTL and the error is returned to the one reader
//!   that triggered the fetch.
//! - [`Fetched::Failed`]: a transient failure. Nothing is cached; a cold reader
//!   receives the error, a background refresh logs it and keeps the old value.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Default time a cached listing or manifest stays fresh.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

/// Result of one round-trip against the remote resource.
#[derive(Debug)]
pub enum Fetched<T, E> {
    Install { value: T, error: Option<E> },
    Failed(E),
}

impl<T, E> Fetched<T, E> {
    pub fn value(value: T) -> Self {
        Self::Install { value, error: None }
    }

    pub fn negative(value: T, error: E) -> Self {
        Self::Install {
            value,
            error: Some(error),
        }
    }
}

/// The remote resource behind a [`CacheSlot`].
#[async_trait]
pub trait Fetch: Send + Sync + 'static {
    type Value: Send + Sync + 'static;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Short name used in log events.
    fn label(&self) -> &str;

    async fn fetch(&self) -> Fetched<Self::Value, Self::Error>;
}

/// What a reader gets back: the cached value, plus the fetch error when this
/// reader's own fetch installed a negative entry.
#[derive(Debug)]
pub struct Lookup<T, E> {
    pub value: Arc<T>,
    pub error: Option<E>,
}

impl<T, E> Lookup<T, E> {
    fn hit(value: Arc<T>) -> Self {
        Self { value, error: None }
    }
}

struct Snapshot<T> {
    value: Arc<T>,
    updated: Instant,
}

impl<T> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
            updated: self.updated,
        }
    }
}

struct Inner<F: Fetch> {
    fetcher: F,
    ttl: Duration,
    current: RwLock<Option<Snapshot<F::Value>>>,
    gate: Arc<Mutex<()>>,
}

impl<F: Fetch> Inner<F> {
    fn snapshot(&self) -> Option<Snapshot<F::Value>> {
        self.current.read().clone()
    }

    fn is_stale(&self) -> bool {
        self.current
            .read()
            .as_ref()
            .is_none_or(|s| s.updated.elapsed() > self.ttl)
    }

    fn install(&self, value: F::Value) -> Arc<F::Value> {
        let value = Arc::new(value);
        *self.current.write() = Some(Snapshot {
            value: Arc::clone(&value),
            updated: Instant::now(),
        });
        value
    }
}

/// A single cached value with TTL-driven background refresh.
///
/// Cloning is cheap and yields a handle to the same slot.
pub struct CacheSlot<F: Fetch> {
    inner: Arc<Inner<F>>,
}

impl<F: Fetch> Clone for CacheSlot<F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<F: Fetch> CacheSlot<F> {
    pub fn new(fetcher: F, ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                fetcher,
                ttl,
                current: RwLock::new(None),
                gate: Arc::new(Mutex::new(())),
            }),
        }
    }

    pub fn fetcher(&self) -> &F {
        &self.inner.fetcher
    }

    pub fn ttl(&self) -> Duration {
        self.inner.ttl
    }

    /// Whether a value (positive or negative) has been installed.
    pub fn is_populated(&self) -> bool {
        self.inner.current.read().is_some()
    }

    /// Current value without any fetch or refresh.
    pub fn peek(&self) -> Option<Arc<F::Value>> {
        self.inner.snapshot().map(|s| s.value)
    }

    /// Read the slot, fetching on a cold slot and scheduling a refresh on a
    /// stale one.
    ///
    /// Errors only when the slot is cold and the fetch failed transiently.
    pub async fn get(&self) -> Result<Lookup<F::Value, F::Error>, F::Error> {
        if let Some(snapshot) = self.inner.snapshot() {
            if snapshot.updated.elapsed() > self.inner.ttl {
                self.spawn_refresh();
            } else {
                debug!(slot = self.inner.fetcher.label(), "cache hit");
            }
            return Ok(Lookup::hit(snapshot.value));
        }

        let _gate = self.inner.gate.lock().await;
        if let Some(snapshot) = self.inner.snapshot() {
            debug!(
                slot = self.inner.fetcher.label(),
                "populated by a concurrent reader"
            );
            return Ok(Lookup::hit(snapshot.value));
        }

        debug!(slot = self.inner.fetcher.label(), "cold cache, fetching");
        match self.inner.fetcher.fetch().await {
            Fetched::Install { value, error } => Ok(Lookup {
                value: self.inner.install(value),
                error,
            }),
            Fetched::Failed(err) => Err(err),
        }
    }

    fn spawn_refresh(&self) {
        let Ok(gate) = Arc::clone(&self.inner.gate).try_lock_owned() else {
            debug!(slot = self.inner.fetcher.label(), "refresh already running");
            return;
        };
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let _gate = gate;
            if !inner.is_stale() {
                return;
            }
            debug!(slot = inner.fetcher.label(), "refreshing stale entry");
            match inner.fetcher.fetch().await {
                Fetched::Install { value, error } => {
                    if let Some(err) = error {
                        debug!(slot = inner.fetcher.label(), error = %err, "refreshed to a negative entry");
                    }
                    inner.install(value);
                }
                Fetched::Failed(err) => {
                    warn!(slot = inner.fetcher.label(), error = %err, "background refresh failed, keeping stale entry");
                }
            }
        });
    }
}
