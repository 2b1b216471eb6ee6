//! # fiftymm
//!
//! The album core of a photo site served straight out of object storage.
//! Each album is a key prefix in a bucket; an optional `ordering.yaml` under
//! that prefix picks the cover, the thumbnails and the display order.
//!
//! # Architecture: Two Caches and a Merge
//!
//! Every album page needs the bucket listing and the manifest. Both are
//! storage round-trips, so each album caches them separately and every render
//! merges the two cached snapshots:
//!
//! ```text
//! key cache       list <prefix>                  ─┐
//!                                                 ├─ merge ─ photo resources
//! ordering cache  get <prefix>ordering.yaml       ─┘
//! ```
//!
//! The listing decides which photos exist; the manifest only decides where
//! they go. A manifest can never hide a photo or invent one.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`cache`] | TTL cache slot with stale-serving background refresh and negative entries |
//! | [`listing`] | Key cache fetcher: bucket listing under an album prefix |
//! | [`ordering`] | Ordering cache fetcher: `ordering.yaml` fetch, parse and reference resolution |
//! | [`merge`] | Pure merge of declared keys against listed keys |
//! | [`album`] | Album facade consumed by the rendering layer |
//! | [`site`] | Albums of one configured domain sharing one storage client |
//! | [`storage`] | `ObjectSource` trait over `object_store` backends and an in-memory source |
//! | [`photo`] | Key → renderable photo URL factories |
//! | [`config`] | Site TOML loading and validation |
//! | [`types`] | Ordering config and album ordering types |
//! | [`naming`] | Manifest key, slugs and reference resolution |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Stale Beats Slow
//!
//! Once a slot has a value, reads never wait on storage. A stale value is
//! returned immediately and a single background refresh replaces it. A failed
//! refresh keeps the old value, so a storage outage degrades to "photos as of
//! the last successful listing" instead of an error page.
//!
//! ## Missing Manifests Are Cached
//!
//! Most albums never get an `ordering.yaml`. A missing or malformed manifest
//! is cached as an empty, negative config for the full TTL, so those albums
//! cost one manifest request per hour rather than one per render.
//!
//! ## One Cold Fetch
//!
//! Concurrent first readers of an empty slot queue on the slot's refresh gate
//! and the first one fetches. Later readers find the installed value when they
//! get the gate.

pub mod album;
pub mod cache;
pub mod config;
pub mod listing;
pub mod merge;
pub mod naming;
pub mod ordering;
pub mod output;
pub mod photo;
pub mod site;
pub mod storage;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
