use super::common::{
    created_response, map_service_error, no_content_response, success_response, validate_input,
};
use crate::{
    errors::ApiError,
    handlers::AppState,
    services::delivery_challans::{DeliveryChallanHeader, DispatchLine},
};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct DeliveryChallanRequest {
    #[serde(flatten)]
    pub header: DeliveryChallanHeader,
    #[validate(length(min = 1, message = "At least one item is required"))]
    pub items: Vec<DispatchLine>,
}

/// Create a delivery challan
pub async fn create_delivery_challan(
    State(state): State<AppState>,
    Json(payload): Json<DeliveryChallanRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let document = state
        .services
        .delivery_challans
        .create(payload.header, payload.items)
        .await
        .map_err(map_service_error)?;

    info!("Delivery challan created: {}", document.header.dc_number);
    Ok(created_response(document))
}

/// Get a delivery challan with its items
pub async fn get_delivery_challan(
    State(state): State<AppState>,
    Path(dc_number): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let document = state
        .services
        .delivery_challans
        .get(&dc_number)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(document))
}

/// Replace an open delivery challan
pub async fn update_delivery_challan(
    State(state): State<AppState>,
    Path(dc_number): Path<String>,
    Json(payload): Json<DeliveryChallanRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let document = state
        .services
        .delivery_challans
        .update(&dc_number, payload.header, payload.items)
        .await
        .map_err(map_service_error)?;

    info!("Delivery challan updated: {}", dc_number);
    Ok(success_response(document))
}

/// Delete an open delivery challan
pub async fn delete_delivery_challan(
    State(state): State<AppState>,
    Path(dc_number): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .delivery_challans
        .delete(&dc_number)
        .await
        .map_err(map_service_error)?;

    info!("Delivery challan deleted: {}", dc_number);
    Ok(no_content_response())
}

pub fn delivery_challan_routes() -> Router<AppState> {
    Router::new().route("/", post(create_delivery_challan)).route(
        "/:dc_number",
        get(get_delivery_challan)
            .put(update_delivery_challan)
            .delete(delete_delivery_challan),
    )
}
