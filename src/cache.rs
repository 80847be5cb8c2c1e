use std::collections::HashMap;
use std::hash::Hash;

/// Values one loader has loaded during its request.
///
/// A cache lives exactly as long as the worker that owns it, which in turn lives as long as one
/// request context. There is no eviction and no TTL.
///
/// Every key the batch function was asked for is recorded, including the ones storage did not
/// return, so a not-found key is answered from here instead of being fetched again. Lookups
/// therefore have three outcomes: `None` (never loaded), `Some(None)` (loaded, not found) and
/// `Some(Some(v))`.
#[derive(Debug)]
pub struct Cache<K, V> {
    entries: HashMap<K, Option<V>>,
}

impl<K, V> Default for Cache<K, V> {
    fn default() -> Self {
        Self { entries: HashMap::new() }
    }
}

impl<K, V> Cache<K, V>
where
    K: Eq + Hash + Copy,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the entries for `keys`, in order.
    pub fn get_many(&self, keys: &[K]) -> Vec<Option<&Option<V>>> {
        keys.iter().map(|k| self.entries.get(k)).collect()
    }

    /// Returns the keys of `keys` that have never been loaded, in request order.
    pub fn missing(&self, keys: &[K]) -> Vec<K> {
        keys.iter().filter(|k| !self.entries.contains_key(*k)).copied().collect()
    }

    /// Records a value obtained outside of a batch load.
    pub fn prime(&mut self, key: K, value: V) {
        self.entries.insert(key, Some(value));
    }

    /// Records the outcome of one batch: `values[i]` is the result for `keys[i]`.
    pub fn store_batch(&mut self, keys: &[K], values: Vec<Option<V>>) {
        self.entries.extend(keys.iter().copied().zip(values));
    }

    pub fn remove(&mut self, keys: &[K]) {
        for key in keys {
            self.entries.remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cached_miss_is_distinct_from_absent() {
        let mut cache = Cache::new();
        cache.store_batch(&[1, 2], vec![None, Some("two")]);

        assert_eq!(cache.get_many(&[1, 2, 3]), vec![Some(&None), Some(&Some("two")), None]);
        assert_eq!(cache.missing(&[3, 1, 4]), vec![3, 4]);
    }

    #[test]
    fn remove_forgets_keys() {
        let mut cache = Cache::new();
        cache.prime(1, "one");
        cache.prime(2, "two");
        cache.remove(&[1]);

        assert_eq!(cache.missing(&[1, 2]), vec![1]);
        assert_eq!(cache.get_many(&[2]), vec![Some(&Some("two"))]);
    }
}
