use std::slice;

use tokio::sync::oneshot;

use crate::error::{LoadError, LoadResult};

/// Set of possible requests that can be sent to the [`LoaderWorker`]
///
/// The three categories of commands are Load, Prime, and Clear; each of which has a single and
/// many variant for convenience.
///
/// [`LoaderWorker`]: crate::loader_worker::LoaderWorker
#[derive(Debug)]
pub enum LoaderOp<K, V> {
    /// Fetch data from the resource wrapped by this data loader (or the cache).
    Load(LoadRequest<K, V>),
    /// Add values to the cache that were fetched from elsewhere.
    Prime(K, V),
    PrimeMany(Vec<(K, V)>),
    /// Remove values from the cache so that they will be reloaded when they are next requested.
    Clear(K),
    ClearMany(Vec<K>),
}

/// A pending load with its own response slot.
///
/// Two requests for the same key in one frame are two `LoadRequest`s; both are answered from the
/// single fetch of that key.
#[derive(Debug)]
pub enum LoadRequest<K, V> {
    One(K, oneshot::Sender<LoadResult<Option<V>>>),
    Many(Vec<K>, oneshot::Sender<LoadResult<Vec<Option<V>>>>),
}

impl<K, V> LoadRequest<K, V>
where
    V: Send + Clone + std::fmt::Debug,
{
    pub fn keys(&self) -> &[K] {
        match self {
            LoadRequest::One(ref key, _) => slice::from_ref(key),
            LoadRequest::Many(ref keys, _) => keys,
        }
    }

    /// Answers the request with cache entries aligned to [`LoadRequest::keys`].
    ///
    /// An entry is `None` when the key is not cached and `Some(None)` when it is cached as not
    /// found; both are reported to the caller as `None`.
    pub fn send_response<'a, I>(self, values: I)
    where
        I: IntoIterator<Item = Option<&'a Option<V>>>,
        V: 'a,
    {
        match self {
            LoadRequest::One(_, response_tx) => {
                let response = values.into_iter().next().flatten().cloned().flatten();
                if let Err(e) = response_tx.send(Ok(response)) {
                    tracing::error!(?e, "receiver dropped");
                }
            }
            LoadRequest::Many(_, response_tx) => {
                let response =
                    values.into_iter().map(|opt| opt.cloned().flatten()).collect::<Vec<_>>();
                if let Err(e) = response_tx.send(Ok(response)) {
                    tracing::error!(?e, "receiver dropped");
                }
            }
        }
    }

    /// Fails the request with the error of the batch it was waiting on.
    pub fn send_error(self, error: LoadError) {
        let sent = match self {
            LoadRequest::One(_, response_tx) => response_tx.send(Err(error)).is_ok(),
            LoadRequest::Many(_, response_tx) => response_tx.send(Err(error)).is_ok(),
        };
        if !sent {
            tracing::error!("receiver dropped");
        }
    }
}
