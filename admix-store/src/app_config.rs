use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub redis: RedisConfig,
    #[serde(default)]
    pub rules: RulesConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub delivery: DeliveryConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    #[serde(default = "default_redis_url")]
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RulesConfig {
    #[serde(default = "default_prefilter")]
    pub prefilter: String,
    #[serde(default = "default_postfilter")]
    pub postfilter: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedConfig {
    #[serde(default = "default_feed")]
    pub path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DeliveryConfig {
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    #[serde(default = "default_jwt_expiration")]
    pub jwt_expiration_seconds: u64,
    #[serde(default = "default_admin_user")]
    pub admin_user: String,
    #[serde(default = "default_admin_pass")]
    pub admin_pass: String,
    #[serde(default = "default_client_user")]
    pub client_user: String,
    #[serde(default = "default_client_pass")]
    pub client_pass: String,
}

fn default_port() -> u16 {
    8080
}
fn default_redis_url() -> String {
    "redis://127.0.0.1:6379/0".to_string()
}
fn default_prefilter() -> String {
    "rules/prefilter.json".to_string()
}
fn default_postfilter() -> String {
    "rules/postfilter.json".to_string()
}
fn default_feed() -> String {
    "data/feed.json".to_string()
}
fn default_retry_attempts() -> u32 {
    3
}
fn default_jwt_secret() -> String {
    "development-secret-change-me".to_string()
}
fn default_jwt_expiration() -> u64 {
    3600
}
fn default_admin_user() -> String {
    "admin".to_string()
}
fn default_admin_pass() -> String {
    "admin".to_string()
}
fn default_client_user() -> String {
    "client".to_string()
}
fn default_client_pass() -> String {
    "client".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
        }
    }
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            prefilter: default_prefilter(),
            postfilter: default_postfilter(),
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            path: default_feed(),
        }
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            retry_attempts: default_retry_attempts(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            jwt_expiration_seconds: default_jwt_expiration(),
            admin_user: default_admin_user(),
            admin_pass: default_admin_pass(),
            client_user: default_client_user(),
            client_pass: default_client_pass(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default").required(false))
            // Add in the current environment file
            // Default to 'development' env
            // Note that this file is _optional_
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add in a local configuration file
            // This file shouldn't be checked in to git
            .add_source(config::File::with_name("config/local").required(false))
            // Add in settings from the environment (with a prefix of ADMIX)
            // Eg.. `ADMIX__SERVER__PORT=9090` would set `server.port`
            .add_source(config::Environment::with_prefix("ADMIX").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
