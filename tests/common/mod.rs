#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::NaiveDate;
use po_fulfillment::{
    config::AppConfig,
    db::{self, DbPool},
    events,
    services::{
        delivery_challans::{DeliveryChallanDocument, DeliveryChallanHeader, DispatchLine},
        invoices::CreateInvoiceRequest,
        purchase_orders::{DeliveryLotInput, PurchaseOrderHeader, PurchaseOrderItemInput},
        srvs::{SrvLine, SrvRequest},
    },
    AppState,
};
use rust_decimal::Decimal;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

/// Application state backed by a throwaway SQLite file.
pub struct TestApp {
    pub state: AppState,
    router: Router,
    _dir: TempDir,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("fulfillment_test.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", path.display()),
            "test".to_string(),
        );
        cfg.db_max_connections = 4;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let (event_sender, event_rx) = events::channel(256);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let state = AppState::new(Arc::new(pool), cfg, event_sender);
        let router = po_fulfillment::build_router(state.clone());

        Self {
            state,
            router,
            _dir: dir,
            _event_task: event_task,
        }
    }

    pub fn db(&self) -> &DbPool {
        self.state.db.as_ref()
    }

    pub async fn seed_po(&self, po_number: i64, items: Vec<PurchaseOrderItemInput>) {
        self.state
            .services
            .purchase_orders
            .upsert_purchase_order(po_header(po_number), items)
            .await
            .expect("seed purchase order");
    }

    pub async fn create_dc(
        &self,
        po_number: i64,
        lines: Vec<DispatchLine>,
    ) -> Result<DeliveryChallanDocument, po_fulfillment::errors::ServiceError> {
        self.state
            .services
            .delivery_challans
            .create(dc_header(po_number), lines)
            .await
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router response");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("response body");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, value)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub fn po_header(po_number: i64) -> PurchaseOrderHeader {
    PurchaseOrderHeader {
        po_number,
        po_date: Some(date(2026, 4, 1)),
        supplier_name: Some("Shakti Engineering Works".into()),
        buyer_name: Some("Eastern Power Distribution".into()),
        ..Default::default()
    }
}

pub fn po_item(
    po_item_no: i32,
    ordered_quantity: Decimal,
    rate: Decimal,
) -> PurchaseOrderItemInput {
    PurchaseOrderItemInput {
        po_item_no,
        material_code: Some(format!("MAT-{}", po_item_no)),
        description: Some(format!("Item {}", po_item_no)),
        unit: Some("NOS".into()),
        hsn_code: Some("8546".into()),
        rate,
        ordered_quantity,
        lots: Vec::new(),
    }
}

pub fn with_lots(
    mut item: PurchaseOrderItemInput,
    lots: &[(i32, Decimal)],
) -> PurchaseOrderItemInput {
    item.lots = lots
        .iter()
        .map(|(lot_no, scheduled_quantity)| DeliveryLotInput {
            lot_no: *lot_no,
            scheduled_quantity: *scheduled_quantity,
            delivery_date: None,
        })
        .collect();
    item
}

pub fn dc_header(po_number: i64) -> DeliveryChallanHeader {
    DeliveryChallanHeader {
        po_number,
        dc_date: Some(date(2026, 10, 1)),
        consignee_name: Some("Eastern Power Distribution".into()),
        vehicle_number: Some("OD-02-AB-1234".into()),
        ..Default::default()
    }
}

pub fn dispatch(po_item_no: i32, lot_no: Option<i32>, dispatch_quantity: Decimal) -> DispatchLine {
    DispatchLine {
        po_item_no,
        lot_no,
        description: None,
        dispatch_quantity,
    }
}

pub fn invoice_request(dc_number: &str) -> CreateInvoiceRequest {
    CreateInvoiceRequest {
        invoice_number: None,
        dc_number: dc_number.to_string(),
        invoice_date: Some(date(2026, 10, 2)),
        buyer_name: Some("Eastern Power Distribution".into()),
        buyer_gstin: Some("21AAACE1234F1Z5".into()),
        buyer_address: None,
        place_of_supply: Some("Odisha".into()),
        overrides: Vec::new(),
    }
}

pub fn srv_request(srv_number: &str, po_number: i64, items: Vec<SrvLine>) -> SrvRequest {
    SrvRequest {
        srv_number: srv_number.to_string(),
        po_number,
        srv_date: Some(date(2026, 10, 5)),
        received_by: Some("Stores".into()),
        items,
    }
}

pub fn receipt(po_item_no: i32, received: Decimal, rejected: Decimal) -> SrvLine {
    SrvLine {
        po_item_no,
        lot_no: None,
        received_quantity: received,
        accepted_quantity: None,
        rejected_quantity: rejected,
    }
}
