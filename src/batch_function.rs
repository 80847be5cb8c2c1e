use async_trait::async_trait;

use crate::error::LoadResult;

/// A `BatchFunction` defines the method through which some `Loader` may fetch
/// batched data from some resource. The `BatchFunction` receives a slice of distinct keys
/// that have been requested during the `Loader`'s most recent execution frame, and some user
/// defined context struct.
///
/// The BatchFunction is not required to return a result for all keys that were provided, nor to
/// return them in the order they were requested. It can return any set of loaded key value pairs;
/// the loader re-indexes them by key. Requesters of keys whose values are not returned will
/// receive a `None`.
///
/// Returning an `Err` fails every request waiting on this batch. Nothing is cached for those
/// keys, so they are fetched again the next time they are requested.
///
/// Multiple `BatchFunctions` (and therefore loaders) can share the same context (likely through an
/// `Arc`).
#[async_trait]
pub trait BatchFunction<K, V> {
    type Context;
    async fn load(keys: &[K], context: &Self::Context) -> LoadResult<Vec<(K, V)>>;
}

/// Batch function for one-to-many relations.
///
/// Each returned pair is a row tagged with the foreign key it was matched on; a key may appear in
/// any number of pairs, or in none. Wrap the implementor in [`Grouped`] to obtain a
/// `BatchFunction<K, Vec<V>>`.
#[async_trait]
pub trait GroupedBatchFunction<K, V> {
    type Context;
    async fn load(keys: &[K], context: &Self::Context) -> LoadResult<Vec<(K, V)>>;
}

/// Adapts a [`GroupedBatchFunction`] into a [`BatchFunction`] that yields one `Vec` per key.
///
/// Every requested key gets an entry, so keys without rows resolve to an empty list rather than
/// `None`.
pub struct Grouped<F>(pub F);

#[async_trait]
impl<K, V, F> BatchFunction<K, Vec<V>> for Grouped<F>
where
    K: 'static + Copy + Eq + std::hash::Hash + Send + Sync,
    V: 'static + Send,
    F: 'static + GroupedBatchFunction<K, V> + Send,
    F::Context: Sync,
{
    type Context = F::Context;

    async fn load(keys: &[K], context: &Self::Context) -> LoadResult<Vec<(K, Vec<V>)>> {
        let rows = F::load(keys, context).await?;
        Ok(crate::demux::group(keys, rows))
    }
}
