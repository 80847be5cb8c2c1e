use thiserror::Error;

/// Errors surfaced to callers of [`crate::Loader::load`].
///
/// A key that does not exist in storage is not an error; single-entity loaders report it as
/// `None` and grouping loaders as an empty list.
///
/// The error is `Clone` because a failed batch is reported to every request that was waiting on
/// it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// The storage backend could not be reached.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
    /// The storage backend was reached but the batch query failed.
    #[error("query failed: {0}")]
    QueryFailed(String),
    /// The loader was used after its request context was torn down.
    #[error("loader is closed; its request context has been torn down")]
    Closed,
}

pub type LoadResult<T> = Result<T, LoadError>;
