use std::fmt::Debug;
use std::hash::Hash;
use std::ops::Drop;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{mpsc, oneshot};
use tracing_futures::Instrument;

use crate::{
    batch_function::{BatchFunction, Grouped, GroupedBatchFunction},
    config::LoaderConfig,
    error::{LoadError, LoadResult},
    loader_op::{LoadRequest, LoaderOp},
    loader_worker::LoaderWorker,
};

/// Batch loads values from some expensive resource, primarily intended for mitigating GraphQL's
/// N+1 problem.
///
/// Users can call [`Loader::load`] and [`Loader::load_many`] to fetch values from the underlying resource or
/// cache. The cache can be cleared with calls to [`Loader::clear`] and [`Loader::clear_many`], and values can be
/// added to the cache out-of-band through the use of [`Loader::prime`] and [`Loader::prime_many`].
///
/// The `Loader` struct acts as an intermediary between the async domain in which `load` calls are
/// invoked and the pseudo-single-threaded domain of the `LoaderWorker`. Callers can invoke the
/// `Loader` from multiple concurrent tasks, and the loader will enqueue the requested operations on
/// the request queue for processing by its `LoaderWorker`. The worker processes the requests
/// sequentially and provides results via response oneshot channels back to the Loader.
///
/// A `Loader` belongs to one request. Its cache is never shared, and once the loader is closed
/// (see [`Loader::close`]) or dropped every further call fails with [`LoadError::Closed`].
pub struct Loader<K, V>
where
    K: 'static + Eq + Debug + Copy + Send,
    V: 'static + Send + Debug + Clone,
{
    request_tx: mpsc::UnboundedSender<LoaderOp<K, V>>,
    load_task_handle: tokio::task::JoinHandle<()>,
    closed: AtomicBool,
}

impl<K, V> Drop for Loader<K, V>
where
    K: 'static + Eq + Debug + Copy + Send,
    V: 'static + Send + Debug + Clone,
{
    fn drop(&mut self) {
        self.load_task_handle.abort();
    }
}

impl<K, V> Loader<K, V>
where
    K: 'static + Eq + Debug + Ord + Copy + Hash + Send + Sync,
    V: 'static + Send + Debug + Clone,
{
    /// Creates a new Loader for the provided BatchFunction and Context type.
    ///
    /// Note: the batch function is passed in as a marker for type inference.
    pub fn new<F, ContextT>(f: F, context: ContextT) -> Self
    where
        ContextT: Send + Sync + 'static,
        F: 'static + BatchFunction<K, V, Context = ContextT> + Send,
    {
        Self::with_config(f, context, LoaderConfig::default())
    }

    /// Creates a new Loader with non-default batching behaviour.
    pub fn with_config<F, ContextT>(_: F, context: ContextT, config: LoaderConfig) -> Self
    where
        ContextT: Send + Sync + 'static,
        F: 'static + BatchFunction<K, V, Context = ContextT> + Send,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let span = tracing::trace_span!("LoaderWorker", batch_fn = std::any::type_name::<F>());
        let worker = LoaderWorker::<K, V, F, ContextT>::new(rx, context, config);
        Self {
            request_tx: tx,
            load_task_handle: tokio::task::spawn(worker.start().instrument(span)),
            closed: AtomicBool::new(false),
        }
    }
}

impl<K, V> Loader<K, V>
where
    K: 'static + Eq + Debug + Ord + Copy + Send + Sync,
    V: 'static + Send + Debug + Clone,
{
    /// Loads a value from the underlying resource.
    ///
    /// Returns `Ok(None)` if the BatchFunction did not return the key. Returns the batch
    /// function's error if the batch this key was part of failed.
    ///
    /// If the value is already in the loader cache, it is returned as soon as it is processed.
    /// Otherwise, the requested key is enqueued for batch loading in the next loader execution
    /// frame.
    pub async fn load(&self, key: K) -> LoadResult<Option<V>> {
        let (response_tx, response_rx) = oneshot::channel();
        self.send(LoaderOp::Load(LoadRequest::One(key, response_tx)))?;
        response_rx.await.map_err(|_| LoadError::Closed)?
    }

    /// Loads many values at once.
    ///
    /// The result is aligned with `keys`: one entry per key, `None` for values that could not be
    /// loaded by the BatchFunction.
    ///
    /// If all the values are already present in the loader cache, they are returned as soon as the
    /// request is processed by the worker. Otherwise, the keys are enqueued for batch loading in the
    /// next loader execution frame.
    pub async fn load_many(&self, keys: Vec<K>) -> LoadResult<Vec<Option<V>>> {
        if self.is_closed() {
            return Err(LoadError::Closed);
        }
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let (response_tx, response_rx) = oneshot::channel();
        self.send(LoaderOp::Load(LoadRequest::Many(keys, response_tx)))?;
        response_rx.await.map_err(|_| LoadError::Closed)?
    }

    /// Adds a value to the cache.
    pub fn prime(&self, key: K, value: V) -> LoadResult<()> {
        self.send(LoaderOp::Prime(key, value))
    }

    /// Adds many values to the cache at once.
    pub fn prime_many(&self, key_vals: Vec<(K, V)>) -> LoadResult<()> {
        self.send(LoaderOp::PrimeMany(key_vals))
    }

    /// Removes a value from the cache.
    ///
    /// This key will be reloaded when it is next requested.
    pub fn clear(&self, key: K) -> LoadResult<()> {
        self.send(LoaderOp::Clear(key))
    }

    /// Removes multiple values from the cache at once.
    ///
    /// These keys will be reloaded when requested.
    pub fn clear_many(&self, keys: Vec<K>) -> LoadResult<()> {
        self.send(LoaderOp::ClearMany(keys))
    }

    /// Stops the worker. Requests still waiting on it, and any later call, fail with
    /// [`LoadError::Closed`].
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.load_task_handle.abort();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn send(&self, op: LoaderOp<K, V>) -> LoadResult<()> {
        if self.is_closed() {
            return Err(LoadError::Closed);
        }
        self.request_tx.send(op).map_err(|_| LoadError::Closed)
    }
}

/// A loader for one-to-many relations: each key resolves to a list of rows.
///
/// A key with no matching rows resolves to an empty list, never to `None`.
pub struct GroupLoader<K, V>
where
    K: 'static + Eq + Debug + Copy + Send,
    V: 'static + Send + Debug + Clone,
{
    inner: Loader<K, Vec<V>>,
}

impl<K, V> GroupLoader<K, V>
where
    K: 'static + Eq + Debug + Ord + Copy + Hash + Send + Sync,
    V: 'static + Send + Debug + Clone,
{
    pub fn new<F, ContextT>(f: F, context: ContextT) -> Self
    where
        ContextT: Send + Sync + 'static,
        F: 'static + GroupedBatchFunction<K, V, Context = ContextT> + Send,
    {
        Self::with_config(f, context, LoaderConfig::default())
    }

    pub fn with_config<F, ContextT>(f: F, context: ContextT, config: LoaderConfig) -> Self
    where
        ContextT: Send + Sync + 'static,
        F: 'static + GroupedBatchFunction<K, V, Context = ContextT> + Send,
    {
        Self { inner: Loader::with_config(Grouped(f), context, config) }
    }

    pub async fn load(&self, key: K) -> LoadResult<Vec<V>> {
        Ok(self.inner.load(key).await?.unwrap_or_default())
    }

    pub async fn load_many(&self, keys: Vec<K>) -> LoadResult<Vec<Vec<V>>> {
        let values = self.inner.load_many(keys).await?;
        Ok(values.into_iter().map(Option::unwrap_or_default).collect())
    }

    pub fn prime(&self, key: K, values: Vec<V>) -> LoadResult<()> {
        self.inner.prime(key, values)
    }

    pub fn clear(&self, key: K) -> LoadResult<()> {
        self.inner.clear(key)
    }

    pub fn close(&self) {
        self.inner.close();
    }
}
