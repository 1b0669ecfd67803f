use std::sync::Arc;

use tracing::{error, info, warn};

use admix_core::{to_country_map, AdNetwork, AdRequest, NetworkCache};
use admix_filter::FilterEngine;

use crate::DeliveryError;

/// Request-time orchestration: cache lookup, post-filter, and the bounded
/// random-substitute retry loop. Also owns the ingestion path.
pub struct DeliveryService {
    cache: Arc<dyn NetworkCache>,
    engine: Arc<FilterEngine>,
    retry_attempts: u32,
}

impl DeliveryService {
    pub fn new(cache: Arc<dyn NetworkCache>, engine: Arc<FilterEngine>, retry_attempts: u32) -> Self {
        Self {
            cache,
            engine,
            retry_attempts,
        }
    }

    /// Serves the ranked network for one request. A cache miss or an empty
    /// post-filter result falls back to random stored records, relabelled
    /// to the requested country, up to `retry_attempts` times.
    pub async fn serve(&self, request: &AdRequest) -> Result<AdNetwork, DeliveryError> {
        // an empty store can never produce an answer
        if self.cache.count().await.map_err(DeliveryError::Cache)? == 0 {
            return Err(DeliveryError::EmptyStore);
        }

        let mut candidate = match self
            .cache
            .get(&request.country_code)
            .await
            .map_err(DeliveryError::Cache)?
        {
            Some(network) => self.engine.postfilter(network, request).await,
            None => {
                warn!(country = %request.country_code, "cache miss, substituting random network");
                let substitute = self
                    .cache
                    .get_random()
                    .await
                    .map_err(DeliveryError::Cache)?;
                self.substitute(substitute, request).await
            }
        };

        if !candidate.has_empty_slot() {
            return Ok(candidate);
        }

        let mut last_error = None;
        for attempt in 1..=self.retry_attempts {
            last_error = None;
            match self.cache.get_random().await {
                Ok(network) => {
                    candidate = self.substitute(network, request).await;
                    if !candidate.has_empty_slot() {
                        info!(country = %request.country_code, attempt, "retry produced a full network");
                        break;
                    }
                }
                // keep the previous candidate, keep retrying
                Err(err) => {
                    error!(country = %request.country_code, attempt, %err, "retry fetch failed");
                    last_error = Some(err);
                }
            }
        }

        if candidate.has_empty_slot() {
            if let Some(err) = last_error {
                return Err(DeliveryError::RetriesExhausted(err));
            }
            // best-effort bound reached without an error: hand back the
            // last candidate, flagged
            warn!(country = %request.country_code, "retry budget exhausted, returning network with an empty slot");
        }

        Ok(candidate)
    }

    /// Ingests a raw batch: pre-filter everything, re-key by country
    /// (duplicates abort before any write), then atomically replace the
    /// stored set. Returns the number of entries written.
    pub async fn ingest(
        &self,
        networks: Vec<AdNetwork>,
        wipe: bool,
    ) -> Result<usize, DeliveryError> {
        let filtered = self.engine.clone().prefilter_all(networks).await;
        let map = to_country_map(filtered)?;
        let written = self
            .cache
            .replace_all(map, wipe)
            .await
            .map_err(DeliveryError::Cache)?;
        info!(written, wipe, "ingested network batch");
        Ok(written)
    }

    /// A substitute record impersonates the requested market: relabel,
    /// then run the full pre-filter pass and the request post-filter.
    async fn substitute(&self, mut network: AdNetwork, request: &AdRequest) -> AdNetwork {
        network.country = request.country_code.clone();
        let network = self.engine.prefilter_one(network).await;
        self.engine.postfilter(network, request).await
    }
}
