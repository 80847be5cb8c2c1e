//! Maps batch query results back onto the keys that were requested.
//!
//! Storage is free to return rows in any order and to omit keys it does not know about, so
//! results are always matched by key, never by position.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// Returns one entry per requested key, in request order.
///
/// Position `i` holds the row returned for `keys[i]`, or `None` if storage returned nothing for
/// it. Duplicate keys each get a copy of the same row. If storage returns several rows for one
/// key the last one wins.
pub fn reindex<K, V>(keys: &[K], rows: impl IntoIterator<Item = (K, V)>) -> Vec<Option<V>>
where
    K: Eq + Hash,
    V: Clone,
{
    let by_key = rows.into_iter().collect::<HashMap<_, _>>();
    keys.iter().map(|k| by_key.get(k).cloned()).collect()
}

/// Groups one-to-many rows by the key they were matched on.
///
/// The output has one `(key, rows)` pair per distinct requested key, in first-requested order.
/// Keys with no rows get an empty `Vec`. Rows tagged with a key that was not requested are
/// dropped. Row order within a group follows storage order.
pub fn group<K, V>(keys: &[K], rows: impl IntoIterator<Item = (K, V)>) -> Vec<(K, Vec<V>)>
where
    K: Copy + Eq + Hash,
{
    let mut grouped: HashMap<K, Vec<V>> = HashMap::with_capacity(keys.len());
    for (key, row) in rows {
        grouped.entry(key).or_default().push(row);
    }
    let mut emitted = HashSet::with_capacity(keys.len());
    let mut out = Vec::with_capacity(keys.len());
    for key in keys {
        if emitted.insert(*key) {
            out.push((*key, grouped.remove(key).unwrap_or_default()));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reindex_follows_request_order_not_storage_order() {
        let rows = vec![("b", 2), ("a", 1)];
        assert_eq!(reindex(&["a", "b"], rows), vec![Some(1), Some(2)]);
    }

    #[test]
    fn reindex_fills_missing_and_repeats_duplicates() {
        let rows = vec![("a", 1)];
        assert_eq!(reindex(&["z", "a", "a"], rows), vec![None, Some(1), Some(1)]);
    }

    #[test]
    fn group_pads_keys_without_rows() {
        let rows = vec![(1, "p1"), (3, "p3"), (1, "p2"), (9, "stray")];
        assert_eq!(group(&[1, 2, 3], rows), vec![(1, vec!["p1", "p2"]), (2, vec![]), (3, vec!["p3"])]);
    }

    #[test]
    fn group_emits_each_key_once() {
        let rows = vec![(1, "p1")];
        assert_eq!(group(&[1, 1, 2, 2], rows), vec![(1, vec!["p1"]), (2, vec![])]);
    }
}
