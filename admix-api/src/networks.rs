use axum::{
    extract::{Query, State},
    routing::get,
    Extension, Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use admix_core::{AdRequest, NetworkFeed};

use crate::{
    error::AppError,
    middleware::auth::{Claims, ROLE_ADMIN},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new().route("/networks", get(list_networks).post(update_networks))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListParams {
    country_code: Option<String>,
    platform: Option<String>,
    os_version: Option<String>,
    device: Option<String>,
}

fn required(value: Option<String>, name: &str) -> Result<String, AppError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AppError::ValidationError(format!(
            "missing required argument {name:?}"
        ))),
    }
}

/// The retrieval entry point. Any authenticated role.
async fn list_networks(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    Query(params): Query<ListParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    let request = AdRequest {
        country_code: required(params.country_code, "countryCode")?,
        platform: required(params.platform, "platform")?,
        os_version: required(params.os_version, "osVersion")?,
        device: required(params.device, "device")?,
    };

    let network = state.delivery.serve(&request).await?;
    Ok(Json(json!({ "network": network })))
}

#[derive(Debug, Deserialize)]
struct UpdateParams {
    #[serde(default)]
    wipe: bool,
}

/// The bulk update entry point. ADMIN only.
async fn update_networks(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<UpdateParams>,
    Json(feed): Json<NetworkFeed>,
) -> Result<Json<serde_json::Value>, AppError> {
    if claims.role != ROLE_ADMIN {
        return Err(AppError::AuthorizationError(
            "admin role required".to_string(),
        ));
    }

    let stored = state.delivery.ingest(feed.data, params.wipe).await?;
    Ok(Json(json!({ "stored": stored })))
}
