use async_trait::async_trait;
use std::collections::HashMap;

use crate::models::AdNetwork;

pub type CacheError = Box<dyn std::error::Error + Send + Sync>;

/// Gateway contract for the country-keyed network cache.
///
/// Implementations live in `admix-store`; the delivery layer only consumes
/// this trait.
#[async_trait]
pub trait NetworkCache: Send + Sync {
    /// Fetch the network stored under a country code. `None` is a genuine
    /// cache miss, distinct from an operational error.
    async fn get(&self, country: &str) -> Result<Option<AdNetwork>, CacheError>;

    /// Fetch an arbitrarily selected stored network. Errors when the store
    /// holds no records.
    async fn get_random(&self) -> Result<AdNetwork, CacheError>;

    /// Atomically replace stored records with `networks`, optionally wiping
    /// everything first. Per-entry serialization failures are skipped
    /// best-effort; a failed commit of the batch itself is an error.
    /// Returns the number of entries written.
    async fn replace_all(
        &self,
        networks: HashMap<String, AdNetwork>,
        wipe: bool,
    ) -> Result<usize, CacheError>;

    /// Number of stored records.
    async fn count(&self) -> Result<usize, CacheError>;
}
