use async_trait::async_trait;
use rand::seq::IteratorRandom;
use std::collections::HashMap;
use std::sync::RwLock;

use admix_core::{AdNetwork, CacheError, NetworkCache};

use crate::StoreError;

/// Map-backed cache gateway for tests and local runs. Same contract as
/// `RedisCache`, no external process required.
#[derive(Default)]
pub struct MemoryCache {
    inner: RwLock<HashMap<String, AdNetwork>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_networks(networks: HashMap<String, AdNetwork>) -> Self {
        Self {
            inner: RwLock::new(networks),
        }
    }
}

#[async_trait]
impl NetworkCache for MemoryCache {
    async fn get(&self, country: &str) -> Result<Option<AdNetwork>, CacheError> {
        let guard = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(guard.get(country).cloned())
    }

    async fn get_random(&self) -> Result<AdNetwork, CacheError> {
        let guard = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        let network = guard
            .values()
            .choose(&mut rand::thread_rng())
            .ok_or(StoreError::EmptyStore)?;
        Ok(network.clone())
    }

    async fn replace_all(
        &self,
        networks: HashMap<String, AdNetwork>,
        wipe: bool,
    ) -> Result<usize, CacheError> {
        let mut guard = self.inner.write().map_err(|_| StoreError::LockPoisoned)?;
        if wipe {
            guard.clear();
        }
        let written = networks.len();
        guard.extend(networks);
        Ok(written)
    }

    async fn count(&self) -> Result<usize, CacheError> {
        let guard = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(guard.len())
    }
}
