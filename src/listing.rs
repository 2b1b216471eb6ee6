//! Bucket listing for the key cache.

use std::sync::Arc;

use async_trait::async_trait;

use crate::cache::{Fetch, Fetched};
use crate::naming;
use crate::storage::{ListedObject, ObjectSource, StorageError};

/// Lists the object keys directly under one album prefix.
pub struct KeyListing {
    source: Arc<dyn ObjectSource>,
    prefix: String,
    label: String,
}

impl KeyListing {
    pub fn new(source: Arc<dyn ObjectSource>, bucket_prefix: &str) -> Self {
        Self {
            source,
            prefix: bucket_prefix.to_string(),
            label: format!("keys:{bucket_prefix}"),
        }
    }
}

/// Keys of real objects, in listing order. Directory markers never reach the
/// cache.
pub fn object_keys(listed: Vec<ListedObject>) -> Vec<String> {
    listed
        .into_iter()
        .filter(|o| !o.is_directory && !naming::is_directory_marker(&o.key))
        .map(|o| o.key)
        .collect()
}

#[async_trait]
impl Fetch for KeyListing {
    type Value = Vec<String>;
    type Error = StorageError;

    fn label(&self) -> &str {
        &self.label
    }

    async fn fetch(&self) -> Fetched<Vec<String>, StorageError> {
        match self.source.list(&self.prefix).await {
            Ok(listed) => {
                let keys = object_keys(listed);
                tracing::info!(prefix = %self.prefix, keys = keys.len(), "listed album keys");
                Fetched::value(keys)
            }
            Err(err) => Fetched::Failed(err),
        }
    }
}
