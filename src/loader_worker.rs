use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::marker::PhantomData;
use std::slice;

use futures::future::FutureExt;
use tokio::sync::mpsc;

#[cfg(feature = "stats")]
use crate::worker_stats::WorkerStats;
use crate::{
    batch_function::BatchFunction,
    cache::Cache,
    config::LoaderConfig,
    demux,
    error::LoadError,
    loader_op::{LoadRequest, LoaderOp},
};

/// A `LoaderWorker` is the "single-thread" worker task that actually does the loading work.
///
/// Once started, it runs in a loop until the parent Loader aborts it's `JoinHandle` or drops the
/// request queue tx channel.
///
/// The worker can be in one of three states during its lifetime:
///
/// 1. Waiting for requests
/// 2. Flushing the request queue and staging keys for loading.
/// 3. Executing its load batch function.
///
/// One cycle through this loop may be called an "execution frame".
///
/// In state (1), the worker awaits any messages on the request queue channel, idling until work
/// arrives. When the first request needs a fetch, the worker yields to the scheduler once so that
/// every resolver polled in the same pass gets to enqueue its keys.
///
/// In state (2), the worker will synchronously pull request from the queue until it receives a NoneType indicating that
/// there are no more pending requests. Prime and Clear requests are resolved immediately by
/// synchronously issuing requests to the cache. For Load requests, the worker checks if the
/// request can be resolved immediately from the cache. If so, it immediately sends the value on
/// the load request's response channel, otherwise it determines which keys are missing from the
/// cache and stages them for loading.
///
/// In state (3), the loader invokes its `BatchFunction` with the distinct keys that it collected
/// in (2). The returned rows are re-indexed by key and every staged key is cached, with `None` for
/// the keys storage did not return. Outstanding Load requests are then resolved from the cache.
/// If the `BatchFunction` fails, the requests waiting on it receive the error and nothing is
/// cached for its keys.
///
/// Requests that arrive during state (3) stay queued until the fetch returns. They are then
/// drained before the next frame: keys fetched successfully are served from the cache, and keys
/// whose batch failed are answered with that same error. Only requests made after that backlog
/// has been drained fetch a failed key again. A key is therefore never fetched twice while in
/// flight.
pub struct LoaderWorker<K, V, F, ContextT>
where
    K: 'static + Eq + Hash + Debug + Ord + Copy + Send + Sync,
    V: 'static + Send + Debug + Clone,
    F: 'static + BatchFunction<K, V, Context = ContextT> + Send,
    ContextT: Send + Sync + 'static,
{
    cache: Cache<K, V>,
    request_rx: mpsc::UnboundedReceiver<LoaderOp<K, V>>,
    keys_to_load: Vec<K>,
    pending_request: Vec<LoadRequest<K, V>>,
    /// Errors of the batches in the current frame, kept until the backlog queued during the
    /// fetch has been answered.
    failed: HashMap<K, LoadError>,
    context: ContextT,
    config: LoaderConfig,
    phantom_batch_function: PhantomData<F>,
    #[cfg(feature = "stats")]
    stats: WorkerStats,
}

impl<K, V, F, ContextT> LoaderWorker<K, V, F, ContextT>
where
    K: 'static + Eq + Hash + Debug + Copy + Ord + Send + Sync,
    V: 'static + Send + Debug + Clone,
    F: 'static + BatchFunction<K, V, Context = ContextT> + Send,
    ContextT: Send + Sync + 'static,
{
    pub fn new(
        request_rx: mpsc::UnboundedReceiver<LoaderOp<K, V>>,
        context: ContextT,
        config: LoaderConfig,
    ) -> Self {
        Self {
            cache: Cache::new(),
            request_rx,
            keys_to_load: Vec::new(),
            pending_request: Vec::new(),
            failed: HashMap::new(),
            context,
            config,
            phantom_batch_function: PhantomData,
            #[cfg(feature = "stats")]
            stats: WorkerStats::new(std::any::type_name::<F>()),
        }
    }

    pub async fn start(mut self) {
        loop {
            // Async await until we receive the first op.
            match self.request_rx.recv().await {
                None => {
                    tracing::info!("Tx channel closed. Terminating LoaderWorker.");
                    return;
                }
                Some(op) => self.mux_op(op),
            }
            // Let the rest of this tick's loads reach the queue.
            if self.config.yield_before_dispatch && !self.pending_request.is_empty() {
                tokio::task::yield_now().await;
            }
            // Flush remainder of the op queue before executing load.
            self.drain_queue();
            while !self.pending_request.is_empty() {
                self.execute_load().await;
                // Answer what queued up while the batch was in flight, failures included.
                self.drain_queue();
                self.failed.clear();
            }
        }
    }

    fn drain_queue(&mut self) {
        while let Some(Some(op)) = self.request_rx.recv().now_or_never() {
            self.mux_op(op);
        }
    }

    #[tracing::instrument(skip(self))]
    fn mux_op(&mut self, op: LoaderOp<K, V>) {
        match op {
            LoaderOp::Load(request) => {
                if let Some(error) = request.keys().iter().find_map(|k| self.failed.get(k)) {
                    tracing::debug!(requested_keys = ?request.keys(), "key failed while in flight");
                    request.send_error(error.clone());
                    return;
                }
                let keys_to_load = self.cache.missing(request.keys());
                tracing::debug!(requested_keys = ?request.keys(), ?keys_to_load);
                #[cfg(feature = "stats")]
                {
                    let requested = request.keys().len() as u32;
                    self.stats.record_load_request(requested);
                    self.stats.record_cache_hits(requested - keys_to_load.len() as u32);
                }
                if keys_to_load.is_empty() {
                    let values = self.cache.get_many(request.keys());
                    request.send_response(values);
                } else {
                    self.keys_to_load.extend(keys_to_load);
                    self.pending_request.push(request);
                }
            }
            LoaderOp::Prime(key, value) => self.cache.prime(key, value),
            LoaderOp::PrimeMany(key_vals) => {
                for (key, value) in key_vals {
                    self.cache.prime(key, value);
                }
            }
            LoaderOp::Clear(key) => self.cache.remove(slice::from_ref(&key)),
            LoaderOp::ClearMany(keys) => self.cache.remove(&keys),
        }
    }

    #[tracing::instrument(skip(self))]
    async fn execute_load(&mut self) {
        self.keys_to_load.sort();
        self.keys_to_load.dedup();
        let keys = std::mem::take(&mut self.keys_to_load);

        for batch in keys.chunks(self.config.chunk_size(keys.len())) {
            #[cfg(feature = "stats")]
            self.stats.record_load_exec(batch.len() as u32);
            match F::load(batch, &self.context).await {
                Ok(loaded_keyvals) => {
                    tracing::debug!(?loaded_keyvals);
                    #[cfg(feature = "stats")]
                    self.stats.record_load_exec_completed(loaded_keyvals.len() as u32);
                    self.cache.store_batch(batch, demux::reindex(batch, loaded_keyvals));
                }
                Err(error) => {
                    tracing::warn!(%error, keys = ?batch, "batch load failed");
                    #[cfg(feature = "stats")]
                    self.stats.record_load_exec_failed();
                    self.failed.extend(batch.iter().map(|k| (*k, error.clone())));
                }
            }
        }

        for request in self.pending_request.drain(..) {
            match request.keys().iter().find_map(|k| self.failed.get(k)) {
                Some(error) => request.send_error(error.clone()),
                None => {
                    let values = self.cache.get_many(request.keys());
                    request.send_response(values);
                }
            }
        }
    }
}
