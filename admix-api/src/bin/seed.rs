//! Seeds the cache from the configured feed file: pre-filter, re-key by
//! country, then an atomic wipe-and-replace.

use std::sync::Arc;

use admix_core::NetworkFeed;
use admix_delivery::DeliveryService;
use admix_filter::FilterEngine;
use admix_store::RedisCache;
use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "admix_seed=info,admix_delivery=info,admix_store=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = admix_store::Config::load().context("failed to load config")?;

    let prefilter = admix_filter::load_prefilter(&config.rules.prefilter)?;
    let postfilter = admix_filter::load_postfilter(&config.rules.postfilter)?;
    let engine = Arc::new(FilterEngine::new(prefilter, postfilter));

    let cache = Arc::new(RedisCache::new(&config.redis.url).context("failed to open Redis client")?);
    let delivery = DeliveryService::new(cache, engine, config.delivery.retry_attempts);

    let raw = std::fs::read_to_string(&config.feed.path)
        .with_context(|| format!("failed to read feed file {}", config.feed.path))?;
    let feed: NetworkFeed = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse feed file {}", config.feed.path))?;

    tracing::info!(networks = feed.data.len(), "seeding cache from feed");
    let stored = delivery.ingest(feed.data, true).await?;
    tracing::info!(stored, "cache seeded");
    Ok(())
}
