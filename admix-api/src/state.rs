use std::sync::Arc;

use admix_delivery::DeliveryService;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

/// Credentials for the two-role token exchange.
#[derive(Clone)]
pub struct Credentials {
    pub admin_user: String,
    pub admin_pass: String,
    pub client_user: String,
    pub client_pass: String,
}

#[derive(Clone)]
pub struct AppState {
    pub delivery: Arc<DeliveryService>,
    pub auth: AuthConfig,
    pub credentials: Credentials,
}
