/// Batching counters for one loader worker, logged when the worker shuts down.
///
/// Only compiled with the `stats` feature.
#[derive(Debug, Default)]
pub struct WorkerStats {
    /// Human readable name used to identify this worker stats when it is reported.
    tag: &'static str,
    /// Number of `LoaderOp::Load` that were received by the worker.
    load_requests: u32,
    /// The total number of keys that were requested for loading (not necessarily unique).
    items_requested: u32,
    /// The number of keys that were immediately found in the loader cache.
    cache_hits: u32,
    /// Number of batch function calls made by this worker.
    loads: u32,
    /// Number of batch function calls that returned an error.
    failed_loads: u32,
    /// The average number of unique keys passed to a batch function call.
    average_batch_size: f32,
    /// The max number of unique keys passed to a single batch function call.
    max_batch_size: u32,
    /// The min number of unique keys passed to a single batch function call.
    min_batch_size: u32,
    /// The total number of rows the batch function actually returned.
    items_loaded: u32,
}

impl WorkerStats {
    pub fn new(tag: &'static str) -> Self {
        Self { tag, min_batch_size: u32::MAX, ..Default::default() }
    }

    pub fn record_load_request(&mut self, items_requested: u32) {
        self.load_requests += 1;
        self.items_requested += items_requested;
    }

    pub fn record_cache_hits(&mut self, hits: u32) {
        self.cache_hits += hits;
    }

    pub fn record_load_exec(&mut self, batch_size: u32) {
        let new_total_load = self.loads + 1;
        self.average_batch_size = (((self.average_batch_size as f64 * self.loads as f64)
            + batch_size as f64)
            / new_total_load as f64) as f32;
        self.loads = new_total_load;
        self.max_batch_size = self.max_batch_size.max(batch_size);
        self.min_batch_size = self.min_batch_size.min(batch_size);
    }

    pub fn record_load_exec_completed(&mut self, loaded_item_count: u32) {
        self.items_loaded += loaded_item_count;
    }

    pub fn record_load_exec_failed(&mut self) {
        self.failed_loads += 1;
    }
}

impl Drop for WorkerStats {
    fn drop(&mut self) {
        tracing::debug!(tag = self.tag, worker_stats = ?self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_size_bounds_track_extremes() {
        let mut stats = WorkerStats::new("test");
        stats.record_load_exec(4);
        stats.record_load_exec(2);
        stats.record_load_exec(6);

        assert_eq!(stats.loads, 3);
        assert_eq!(stats.max_batch_size, 6);
        assert_eq!(stats.min_batch_size, 2);
        assert!((stats.average_batch_size - 4.0).abs() < f32::EPSILON);
    }
}
