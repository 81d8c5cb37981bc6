//! Purchase order fulfillment ledger
//!
//! Tracks what has been ordered, dispatched under delivery challans, billed
//! on GST invoices and received on stores receipt vouchers, and refuses any
//! write that would break the quantity ledger.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod services;

use axum::{response::Json, routing::get, Router};
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};
use std::{sync::Arc, time::Duration};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use uuid::Uuid;

use crate::services::tax::TaxRates;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
}

impl AppState {
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: config::AppConfig,
        event_sender: events::EventSender,
    ) -> Self {
        let rates = TaxRates::from(&config);
        let services =
            handlers::AppServices::new(db.clone(), Arc::new(event_sender.clone()), rates);
        Self {
            db,
            config,
            event_sender,
            services,
        }
    }
}

pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .route("/status", get(api_status))
        .merge(handlers::health::health_routes())
        .nest(
            "/purchase-orders",
            handlers::purchase_orders::purchase_order_routes(),
        )
        .nest("/po-items", handlers::reconciliation::po_item_routes())
        .nest(
            "/delivery-challans",
            handlers::delivery_challans::delivery_challan_routes(),
        )
        .nest("/invoices", handlers::invoices::invoice_routes())
        .nest("/srvs", handlers::srvs::srv_routes())
}

/// Full application router with HTTP middleware applied.
pub fn build_router(state: AppState) -> Router {
    let timeout = Duration::from_secs(state.config.request_timeout_secs);
    Router::new()
        .route("/", get(|| async { "po-fulfillment up" }))
        .nest("/api/v1", api_v1_routes())
        .layer(axum::middleware::from_fn(request_logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(timeout))
        .with_state(state)
}

async fn api_status() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "po-fulfillment",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

// Request logging middleware
async fn request_logging_middleware(
    request: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let request_id = Uuid::new_v4();
    let start = std::time::Instant::now();

    tracing::info!(method = %method, uri = %uri, %request_id, "Incoming request");

    let mut response = next.run(request).await;

    let status = response.status();
    tracing::info!(
        method = %method,
        uri = %uri,
        %request_id,
        status = status.as_u16(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Request completed"
    );

    if let Ok(value) = axum::http::HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert("x-request-id", value);
    }
    response
}

pub mod prelude {
    pub use crate::db::*;
    pub use crate::errors::*;
    pub use crate::events::*;
    pub use crate::services::*;
}
