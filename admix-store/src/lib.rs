pub mod app_config;
pub mod memory;
pub mod redis_cache;

pub use app_config::Config;
pub use memory::MemoryCache;
pub use redis_cache::RedisCache;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("cache holds no records")]
    EmptyStore,
    #[error("random key {0} vanished before read")]
    MissingKey(String),
    #[error("cache lock poisoned")]
    LockPoisoned,
    #[error(transparent)]
    Redis(#[from] redis::RedisError),
}
