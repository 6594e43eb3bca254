//! Memoization primitives

use std::fmt;
use std::sync::Arc;

/// A shared value compared by address instead of by content.
///
/// Collections in the state are replaced wholesale, never mutated in place
/// while shared, so an unchanged address means unchanged content.
pub struct ByAddress<T>(pub Arc<T>);

impl<T> ByAddress<T> {
    /// Borrow the shared value
    #[must_use]
    pub fn get(&self) -> &T {
        &self.0
    }
}

impl<T> Clone for ByAddress<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T> PartialEq for ByAddress<T> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<T> Eq for ByAddress<T> {}

impl<T> From<&Arc<T>> for ByAddress<T> {
    fn from(value: &Arc<T>) -> Self {
        Self(Arc::clone(value))
    }
}

impl<T> fmt::Debug for ByAddress<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ByAddress({:p})", Arc::as_ptr(&self.0))
    }
}

/// Single-entry cache: remembers the last key and the value computed for it.
#[derive(Debug)]
pub struct Memo<K, V> {
    slot: Option<(K, Arc<V>)>,
}

impl<K, V> Default for Memo<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Memo<K, V> {
    /// An empty cache
    #[must_use]
    pub const fn new() -> Self {
        Self { slot: None }
    }

    /// Drop the cached value
    pub fn clear(&mut self) {
        self.slot = None;
    }
}

impl<K: PartialEq, V> Memo<K, V> {
    /// The cached value when `key` equals the last key, otherwise
    /// `compute(&key)`, cached under `key`.
    pub fn get_or_compute(&mut self, key: K, compute: impl FnOnce(&K) -> V) -> Arc<V> {
        if let Some((cached, value)) = &self.slot {
            if *cached == key {
                return Arc::clone(value);
            }
        }

        let value = Arc::new(compute(&key));
        self.slot = Some((key, Arc::clone(&value)));
        value
    }
}
