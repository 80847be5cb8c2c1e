mod batch_function;
mod cache;
mod config;
pub mod demux;
mod error;
mod loader;
mod loader_op;
mod loader_worker;
pub mod loaders;
pub mod model;
mod registry;
pub mod store;
#[cfg(feature = "stats")]
mod worker_stats;

pub use batch_function::{BatchFunction, Grouped, GroupedBatchFunction};
pub use config::LoaderConfig;
pub use error::{LoadError, LoadResult};
pub use loader::{GroupLoader, Loader};
pub use registry::{Loaders, RequestContext};
