use super::common::{map_service_error, success_response, validate_input};
use crate::{
    errors::ApiError,
    handlers::AppState,
    services::{
        preflight::DraftLine,
        purchase_orders::{PurchaseOrderHeader, PurchaseOrderItemInput},
    },
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
pub struct UpsertPurchaseOrderRequest {
    #[serde(flatten)]
    #[validate]
    pub header: PurchaseOrderHeader,
    #[serde(default)]
    pub items: Vec<PurchaseOrderItemInput>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct DispatchPreviewRequest {
    #[validate(length(min = 1, message = "At least one draft line is required"))]
    pub lines: Vec<DraftLine>,
}

/// Create or refresh a purchase order from an ingestion snapshot
pub async fn upsert_purchase_order(
    State(state): State<AppState>,
    Json(payload): Json<UpsertPurchaseOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let outcome = state
        .services
        .purchase_orders
        .upsert_purchase_order(payload.header, payload.items)
        .await
        .map_err(map_service_error)?;

    info!("Purchase order upserted: {}", outcome.po_number);
    Ok(success_response(outcome))
}

/// Get a purchase order with items and lots
pub async fn get_purchase_order(
    State(state): State<AppState>,
    Path(po_number): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let po = state
        .services
        .purchase_orders
        .get_purchase_order(po_number)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(po))
}

/// Ledger projection for every item of a purchase order
pub async fn reconcile_purchase_order(
    State(state): State<AppState>,
    Path(po_number): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let report = state
        .services
        .reconciliation
        .reconcile(po_number)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(report))
}

/// Delivery challans raised against a purchase order
pub async fn list_delivery_challans(
    State(state): State<AppState>,
    Path(po_number): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let dcs = state
        .services
        .delivery_challans
        .list_for_po(po_number)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(dcs))
}

/// Dry run of a dispatch from free-text lines
pub async fn preview_dispatch(
    State(state): State<AppState>,
    Path(po_number): Path<i64>,
    Json(payload): Json<DispatchPreviewRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let preview = state
        .services
        .preflight
        .preview_dispatch(po_number, payload.lines)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(preview))
}

/// Re-run orphan SRV linking for a purchase order
pub async fn link_orphan_srvs(
    State(state): State<AppState>,
    Path(po_number): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state
        .services
        .srvs
        .link_on_po_arrival(po_number)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(outcome))
}

pub fn purchase_order_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(upsert_purchase_order))
        .route("/:po_number", get(get_purchase_order))
        .route("/:po_number/reconciliation", get(reconcile_purchase_order))
        .route("/:po_number/delivery-challans", get(list_delivery_challans))
        .route("/:po_number/dispatch-preview", post(preview_dispatch))
        .route("/:po_number/link-srvs", post(link_orphan_srvs))
}
