use axum::{extract::State, routing::post, Json, Router};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use crate::{
    error::AppError,
    middleware::auth::{Claims, ROLE_ADMIN, ROLE_CLIENT},
    state::AppState,
};

#[derive(Debug, Deserialize)]
struct TokenRequest {
    username: String,
    password: String,
}

#[derive(Debug, Serialize)]
struct AuthResponse {
    token: String,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/token", post(issue_token))
}

/// Exchanges configured credentials for a role-carrying bearer token.
async fn issue_token(
    State(state): State<AppState>,
    Json(req): Json<TokenRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let creds = &state.credentials;
    let role = if req.username == creds.admin_user && req.password == creds.admin_pass {
        ROLE_ADMIN
    } else if req.username == creds.client_user && req.password == creds.client_pass {
        ROLE_CLIENT
    } else {
        return Err(AppError::AuthenticationError(
            "invalid credentials".to_string(),
        ));
    };

    let claims = Claims {
        sub: req.username,
        role: role.to_string(),
        exp: (Utc::now() + Duration::seconds(state.auth.expiration as i64)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(state.auth.secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(format!("Token encoding failed: {}", e)))?;

    Ok(Json(AuthResponse { token }))
}
