//! Merge engine: reconcile a declared ordering with what the bucket holds.
//!
//! Pure functions over keys. The bucket listing is the source of truth for
//! *which* photos exist; the manifest only decides *where* they go.
//!
//! ## `merge_list`
//!
//! 1. Declared keys that exist in the bucket come first, in declared order.
//! 2. Every remaining bucket key follows, in bucket order.
//! 3. Declared keys missing from the bucket are dropped and reported.
//!
//! The output is always a permutation of the bucket keys, so a stale or
//! sloppy manifest can reorder photos but never hide or invent one.
//!
//! ## Selections
//!
//! | Field | Declared | Not declared |
//! |-------|----------|--------------|
//! | cover | the declared key if listed, else the first key | the first key |
//! | thumbnails | `merge_list` over the declared list, first 5 | keys 2..=6 (the first is the implicit cover) |
//! | ordering | `merge_list` over the declared list | bucket order |

use std::collections::HashMap;
use std::fmt;

use crate::naming::strip_leading_slash;
use crate::types::OrderingConfig;

/// Upper bound on thumbnails shown for an album.
pub const MAX_THUMBNAILS: usize = 5;

/// Which manifest field a discrepancy came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Cover,
    Thumbnails,
    Ordering,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Field::Cover => "cover",
            Field::Thumbnails => "thumbnails",
            Field::Ordering => "ordering",
        })
    }
}

/// A declared key that is not in the current bucket listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discrepancy {
    pub field: Field,
    pub key: String,
}

/// Output of [`merge_list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Merged {
    pub keys: Vec<String>,
    /// Declared keys dropped because the bucket does not list them.
    pub missing: Vec<String>,
}

/// Put `declared` keys first, then the rest of `bucket_keys` in bucket order.
pub fn merge_list(bucket_keys: &[String], declared: &[String]) -> Merged {
    let mut index: HashMap<&str, usize> = HashMap::with_capacity(bucket_keys.len());
    for (i, key) in bucket_keys.iter().enumerate() {
        index.entry(strip_leading_slash(key)).or_insert(i);
    }

    let mut emitted = vec![false; bucket_keys.len()];
    let mut keys = Vec::with_capacity(bucket_keys.len());
    let mut missing = Vec::new();

    for key in declared {
        match index.get(strip_leading_slash(key)) {
            Some(&i) if !emitted[i] => {
                emitted[i] = true;
                keys.push(bucket_keys[i].clone());
            }
            // declared twice
            Some(_) => {}
            None => missing.push(key.clone()),
        }
    }
    keys.extend(
        bucket_keys
            .iter()
            .zip(&emitted)
            .filter(|(_, done)| !**done)
            .map(|(key, _)| key.clone()),
    );

    Merged { keys, missing }
}

/// Keys chosen for an album page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// `None` when the bucket lists no photos.
    pub cover: Option<String>,
    pub thumbnails: Vec<String>,
    pub ordering: Vec<String>,
    pub discrepancies: Vec<Discrepancy>,
}

/// Choose cover, thumbnails and full ordering.
///
/// `keys` must already exclude the manifest itself.
pub fn select(keys: &[String], config: &OrderingConfig) -> Selection {
    let mut discrepancies = Vec::new();
    let mut report = |field: Field, missing: Vec<String>| {
        discrepancies.extend(missing.into_iter().map(|key| Discrepancy { field, key }));
    };

    let cover = select_cover(keys, config.cover.as_deref()).map(|(key, missing)| {
        if let Some(missing) = missing {
            report(Field::Cover, vec![missing]);
        }
        key
    });

    let thumbnails = if config.thumbnails.is_empty() {
        keys.iter().skip(1).take(MAX_THUMBNAILS).cloned().collect()
    } else {
        let mut merged = merge_list(keys, &config.thumbnails);
        report(Field::Thumbnails, merged.missing);
        merged.keys.truncate(MAX_THUMBNAILS);
        merged.keys
    };

    let merged = merge_list(keys, &config.ordering);
    report(Field::Ordering, merged.missing);

    Selection {
        cover,
        thumbnails,
        ordering: merged.keys,
        discrepancies,
    }
}

/// The chosen cover plus the declared key when it had to be replaced.
/// `None` for an empty album.
fn select_cover(keys: &[String], declared: Option<&str>) -> Option<(String, Option<String>)> {
    let first = keys.first()?;
    let chosen = match declared {
        Some(cover) if !cover.is_empty() => {
            match keys
                .iter()
                .find(|k| strip_leading_slash(k) == strip_leading_slash(cover))
            {
                Some(found) => (found.clone(), None),
                None => (first.clone(), Some(cover.to_string())),
            }
        }
        _ => (first.clone(), None),
    };
    Some(chosen)
}
