use super::common::{map_service_error, success_response};
use crate::{errors::ApiError, handlers::AppState};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
    Router,
};

/// Ledger and dispatch history for one PO item
pub async fn reconcile_item(
    State(state): State<AppState>,
    Path(po_item_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let report = state
        .services
        .reconciliation
        .reconcile_item(po_item_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(report))
}

pub fn po_item_routes() -> Router<AppState> {
    Router::new().route("/:po_item_id/reconciliation", get(reconcile_item))
}
