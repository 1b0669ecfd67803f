use std::net::SocketAddr;
use std::sync::Arc;

use admix_api::state::{AppState, AuthConfig, Credentials};
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
                "admix_api=debug,admix_delivery=debug,admix_filter=debug,admix_store=debug,tower_http=debug"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = admix_store::Config::load().context("failed to load config")?;
    tracing::info!("Starting Admix API on port {}", config.server.port);

    // Rule documents are fatal at startup when unreadable or malformed.
    let prefilter = admix_filter::load_prefilter(&config.rules.prefilter)?;
    let postfilter = admix_filter::load_postfilter(&config.rules.postfilter)?;
    let engine = Arc::new(FilterEngine::new(prefilter, postfilter));

    let cache = Arc::new(RedisCache::new(&config.redis.url).context("failed to open Redis client")?);

    let delivery = Arc::new(DeliveryService::new(
        cache,
        engine,
        config.delivery.retry_attempts,
    ));

    let app_state = AppState {
        delivery,
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
        },
        credentials: Credentials {
            admin_user: config.auth.admin_user.clone(),
            admin_pass: config.auth.admin_pass.clone(),
            client_user: config.auth.client_user.clone(),
            client_pass: config.auth.client_pass.clone(),
        },
    };

    let app = admix_api::app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
