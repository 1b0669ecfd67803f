pub mod cache;
pub mod models;
pub mod request;

pub use cache::{CacheError, NetworkCache};
pub use models::{to_country_map, AdNetwork, NetworkFeed, Sdk, SlotKind};
pub use request::AdRequest;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("duplicate country code in batch: {0}")]
    DuplicateCountry(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
