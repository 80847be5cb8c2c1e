/// Tuning knobs for a [`crate::Loader`].
///
/// The defaults dispatch one batch per execution frame with no size limit, which is what
/// request-scoped GraphQL loaders want.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Largest number of distinct keys handed to the batch function in one call. A frame with
    /// more keys is split into consecutive calls. `None` means unbounded.
    pub max_batch_size: Option<usize>,
    /// Yield to the scheduler once after the first request of a frame arrives, so sibling
    /// resolvers polled in the same pass can enqueue their keys before the batch is cut.
    pub yield_before_dispatch: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self { max_batch_size: None, yield_before_dispatch: true }
    }
}

impl LoaderConfig {
    /// Caps the number of keys per batch function call. A size of zero is treated as one.
    #[must_use]
    pub fn max_batch_size(self, max_batch_size: usize) -> Self {
        Self { max_batch_size: Some(max_batch_size.max(1)), ..self }
    }

    #[must_use]
    pub fn yield_before_dispatch(self, yield_before_dispatch: bool) -> Self {
        Self { yield_before_dispatch, ..self }
    }

    pub(crate) fn chunk_size(&self, total: usize) -> usize {
        self.max_batch_size.unwrap_or(total).max(1)
    }
}
