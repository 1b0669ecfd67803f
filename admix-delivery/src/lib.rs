pub mod service;

pub use service::DeliveryService;

use admix_core::{CacheError, CoreError};

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("no ad networks stored in cache")]
    EmptyStore,
    #[error("cache operation failed")]
    Cache(#[source] CacheError),
    #[error("retry budget exhausted")]
    RetriesExhausted(#[source] CacheError),
    #[error(transparent)]
    Core(#[from] CoreError),
}
