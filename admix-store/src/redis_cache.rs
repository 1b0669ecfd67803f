use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use std::collections::HashMap;
use tracing::{error, info};

use admix_core::{AdNetwork, CacheError, NetworkCache};

use crate::StoreError;

/// Production cache gateway over Redis. Networks live as JSON strings keyed
/// by country code, no TTL — stale data beats absent data.
#[derive(Clone)]
pub struct RedisCache {
    client: redis::Client,
}

impl RedisCache {
    pub fn new(connection_string: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(connection_string)?;
        Ok(Self { client })
    }

    async fn conn(&self) -> Result<MultiplexedConnection, redis::RedisError> {
        self.client.get_multiplexed_async_connection().await
    }
}

#[async_trait]
impl NetworkCache for RedisCache {
    async fn get(&self, country: &str) -> Result<Option<AdNetwork>, CacheError> {
        let mut conn = self.conn().await?;
        let raw: Option<String> = conn.get(country).await?;
        match raw {
            Some(body) => Ok(Some(serde_json::from_str(&body)?)),
            None => Ok(None),
        }
    }

    async fn get_random(&self) -> Result<AdNetwork, CacheError> {
        let mut conn = self.conn().await?;
        let key: Option<String> = redis::cmd("RANDOMKEY").query_async(&mut conn).await?;
        let key = key.ok_or(StoreError::EmptyStore)?;

        // the key can expire between RANDOMKEY and GET
        let raw: Option<String> = conn.get(&key).await?;
        let body = raw.ok_or_else(|| StoreError::MissingKey(key.clone()))?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn replace_all(
        &self,
        networks: HashMap<String, AdNetwork>,
        wipe: bool,
    ) -> Result<usize, CacheError> {
        let mut pipe = redis::pipe();
        pipe.atomic();

        if wipe {
            pipe.cmd("FLUSHDB").ignore();
        }

        let written = queue_networks(&mut pipe, &networks);

        let mut conn = self.conn().await?;
        pipe.query_async::<()>(&mut conn).await?;
        info!(written, wipe, "replaced cached networks");
        Ok(written)
    }

    async fn count(&self) -> Result<usize, CacheError> {
        let mut conn = self.conn().await?;
        let size: usize = redis::cmd("DBSIZE").query_async(&mut conn).await?;
        Ok(size)
    }
}

/// Queues one SET per entry onto the pipeline. Entries that fail to
/// serialize are logged and skipped best-effort; the batch still commits.
/// Returns the number queued.
fn queue_networks<T: serde::Serialize>(
    pipe: &mut redis::Pipeline,
    networks: &HashMap<String, T>,
) -> usize {
    let mut written = 0;
    for (country, network) in networks {
        match serde_json::to_string(network) {
            Ok(body) => {
                pipe.set(country, body).ignore();
                written += 1;
            }
            Err(err) => error!(%country, %err, "skipping unserializable network"),
        }
    }
    written
}
