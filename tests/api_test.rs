mod common;

use std::str::FromStr;

use axum::http::{Method, StatusCode};
use common::TestApp;
use rust_decimal::Decimal;
use serde_json::{json, Value};

const PO: i64 = 4500055501;

fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).expect("decimal string"),
        other => Decimal::from_str(&other.to_string()).expect("decimal number"),
    }
}

async fn seed_via_api(app: &TestApp) {
    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/purchase-orders",
            Some(json!({
                "po_number": PO,
                "po_date": "2026-04-01",
                "buyer_name": "Eastern Power Distribution",
                "items": [
                    {
                        "po_item_no": 10,
                        "description": "Insulator Disc 120kN",
                        "hsn_code": "8546",
                        "rate": 125.5,
                        "ordered_quantity": 100,
                        "lots": [{ "lot_no": 1, "scheduled_quantity": 100 }]
                    }
                ]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["created"], true);
}

#[tokio::test]
async fn health_reports_database_up() {
    let app = TestApp::new().await;
    let (status, body) = app.request(Method::GET, "/api/v1/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], "up");
}

#[tokio::test]
async fn dispatch_and_bill_over_http() {
    let app = TestApp::new().await;
    seed_via_api(&app).await;

    let (status, dc) = app
        .request(
            Method::POST,
            "/api/v1/delivery-challans",
            Some(json!({
                "po_number": PO,
                "dc_date": "2026-10-01",
                "items": [{ "po_item_no": 10, "lot_no": 1, "dispatch_quantity": 30 }]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{dc}");
    let dc_number = dc["dc_number"].as_str().unwrap().to_string();
    assert_eq!(dc_number, format!("{}-DC-01", PO));

    let (status, invoice) = app
        .request(
            Method::POST,
            "/api/v1/invoices",
            Some(json!({
                "dc_number": dc_number,
                "invoice_date": "2026-10-02",
                "buyer_name": "Eastern Power Distribution"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{invoice}");
    assert_eq!(decimal(&invoice["total_amount"]), Decimal::from_str("4442.70").unwrap());

    let invoice_number = invoice["invoice_number"].as_str().unwrap();
    let (status, fetched) = app
        .request(
            Method::GET,
            &format!("/api/v1/invoices/{}", invoice_number),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{fetched}");
    assert_eq!(fetched["dc_number"], dc_number.as_str());

    let (status, frozen) = app
        .request(
            Method::DELETE,
            &format!("/api/v1/delivery-challans/{}", dc_number),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT, "{frozen}");
    assert_eq!(frozen["kind"], "ImmutableDocument");

    let (status, dup) = app
        .request(
            Method::POST,
            "/api/v1/invoices",
            Some(json!({
                "dc_number": dc_number,
                "invoice_date": "2026-10-02",
                "buyer_name": "Eastern Power Distribution"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(dup["kind"], "DuplicateDCInvoice");
}

#[tokio::test]
async fn over_dispatch_is_unprocessable() {
    let app = TestApp::new().await;
    seed_via_api(&app).await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/delivery-challans",
            Some(json!({
                "po_number": PO,
                "dc_date": "2026-10-01",
                "items": [{ "po_item_no": 10, "dispatch_quantity": 101 }]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["kind"], "GlobalOverDispatch");

    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/delivery-challans",
            Some(json!({ "po_number": PO, "dc_date": "2026-10-01", "items": [] })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
}

#[tokio::test]
async fn reconciliation_endpoints() {
    let app = TestApp::new().await;
    seed_via_api(&app).await;

    let (status, _) = app
        .request(
            Method::POST,
            "/api/v1/delivery-challans",
            Some(json!({
                "po_number": PO,
                "dc_date": "2026-10-01",
                "items": [{ "po_item_no": 10, "dispatch_quantity": 100 }]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, report) = app
        .request(
            Method::GET,
            &format!("/api/v1/purchase-orders/{}/reconciliation", PO),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["items"][0]["status"], "complete");
    assert_eq!(decimal(&report["fulfillment_rate"]), Decimal::from(100));

    let (status, listed) = app
        .request(
            Method::GET,
            &format!("/api/v1/purchase-orders/{}/delivery-challans", PO),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().map(Vec::len), Some(1));

    let (status, _) = app
        .request(Method::GET, "/api/v1/purchase-orders/1", None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn srv_lifecycle_over_http() {
    let app = TestApp::new().await;

    let srv = json!({
        "srv_number": "SRV-9001",
        "po_number": PO,
        "srv_date": "2026-10-05",
        "items": [{ "po_item_no": 10, "received_quantity": 12, "rejected_quantity": 2 }]
    });

    let (status, body) = app
        .request(Method::POST, "/api/v1/srvs/validate", Some(srv.clone()))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["valid"], true);

    let (status, body) = app
        .request(Method::POST, "/api/v1/srvs", Some(srv.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["po_found"], false);

    let (status, body) = app.request(Method::POST, "/api/v1/srvs", Some(srv)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "DuplicateSRVNumber");

    seed_via_api(&app).await;
    let (_, body) = app.request(Method::GET, "/api/v1/srvs/SRV-9001", None).await;
    assert_eq!(body["po_found"], true);

    let (status, body) = app
        .request(Method::POST, "/api/v1/srvs/SRV-9001/deactivate", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "deactivated");
}
