//! Added/removed computation between two declared states

use serde::Serialize;
use std::collections::HashSet;
use std::hash::Hash;

/// Items to add and remove to get from a previous to a current state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Changes<T> {
    /// In current but not previous, in current order
    pub added: Vec<T>,
    /// In previous but not current, in previous order
    pub removed: Vec<T>,
}

impl<T> Default for Changes<T> {
    fn default() -> Self {
        Self {
            added: Vec::new(),
            removed: Vec::new(),
        }
    }
}

impl<T> Changes<T> {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Names added and removed between two lists. Empty names are ignored and
/// each name is reported at most once.
pub fn diff(current: &[String], previous: &[String]) -> Changes<String> {
    let current: Vec<String> = current.iter().filter(|n| !n.is_empty()).cloned().collect();
    let previous: Vec<String> = previous.iter().filter(|n| !n.is_empty()).cloned().collect();
    diff_by(&current, &previous, String::clone)
}

/// Items added and removed between two lists, compared by `key`.
pub fn diff_by<T, K, F>(current: &[T], previous: &[T], key: F) -> Changes<T>
where
    T: Clone,
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    Changes {
        added: missing_from(current, previous, &key),
        removed: missing_from(previous, current, &key),
    }
}

/// Items of `scan` whose key is not in `other`, deduplicated, in scan order.
fn missing_from<T, K, F>(scan: &[T], other: &[T], key: &F) -> Vec<T>
where
    T: Clone,
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let other: HashSet<K> = other.iter().map(key).collect();
    let mut seen = HashSet::new();
    scan.iter()
        .filter(|item| {
            let k = key(*item);
            !other.contains(&k) && seen.insert(k)
        })
        .cloned()
        .collect()
}
