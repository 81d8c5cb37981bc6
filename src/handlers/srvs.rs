use super::common::{created_response, map_service_error, success_response};
use crate::{errors::ApiError, handlers::AppState, services::srvs::SrvRequest};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde_json::json;
use tracing::info;

/// Store a stores receipt voucher
pub async fn ingest_srv(
    State(state): State<AppState>,
    Json(payload): Json<SrvRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let document = state
        .services
        .srvs
        .ingest(payload)
        .await
        .map_err(map_service_error)?;

    info!(
        "SRV ingested: {} (po_found={})",
        document.header.srv_number, document.header.po_found
    );
    Ok(created_response(document))
}

/// Check an SRV without storing it
pub async fn validate_srv(
    State(state): State<AppState>,
    Json(payload): Json<SrvRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .srvs
        .validate(&payload)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(json!({ "valid": true })))
}

pub async fn get_srv(
    State(state): State<AppState>,
    Path(srv_number): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let document = state
        .services
        .srvs
        .get(&srv_number)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(document))
}

/// Soft-deactivate an SRV so it drops out of the ledger
pub async fn deactivate_srv(
    State(state): State<AppState>,
    Path(srv_number): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let document = state
        .services
        .srvs
        .deactivate(&srv_number)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(document))
}

pub fn srv_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(ingest_srv))
        .route("/validate", post(validate_srv))
        .route("/:srv_number", get(get_srv))
        .route("/:srv_number/deactivate", post(deactivate_srv))
}
