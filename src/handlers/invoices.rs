use super::common::{created_response, map_service_error, success_response};
use crate::{
    errors::ApiError, handlers::AppState, services::invoices::CreateInvoiceRequest,
};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use tracing::info;

/// Bill a delivery challan
pub async fn create_invoice(
    State(state): State<AppState>,
    Json(payload): Json<CreateInvoiceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let document = state
        .services
        .invoices
        .create(payload)
        .await
        .map_err(map_service_error)?;

    info!("Invoice created: {}", document.header.invoice_number);
    Ok(created_response(document))
}

/// Get an invoice. Invoice numbers contain slashes, hence the wildcard.
pub async fn get_invoice(
    State(state): State<AppState>,
    Path(invoice_number): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let invoice_number = invoice_number.trim_start_matches('/');
    let document = state
        .services
        .invoices
        .get(invoice_number)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(document))
}

pub fn invoice_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_invoice))
        .route("/*invoice_number", get(get_invoice))
}
