mod common;

use assert_matches::assert_matches;
use common::*;
use po_fulfillment::{errors::ServiceError, services::ledger};
use rust_decimal_macros::dec;

const PO: i64 = 4500088001;

#[tokio::test]
async fn upsert_creates_then_refreshes() {
    let app = TestApp::new().await;
    let service = &app.state.services.purchase_orders;

    let created = service
        .upsert_purchase_order(
            po_header(PO),
            vec![
                with_lots(po_item(10, dec!(100), dec!(12)), &[(1, dec!(60)), (2, dec!(40))]),
                po_item(20, dec!(50), dec!(8)),
            ],
        )
        .await
        .unwrap();
    assert!(created.created);
    assert_eq!(created.items_upserted, 2);
    assert_eq!(created.lots_upserted, 2);

    let mut header = po_header(PO);
    header.status = Some("amended".into());
    let refreshed = service
        .upsert_purchase_order(header, vec![po_item(10, dec!(120), dec!(12.5))])
        .await
        .unwrap();
    assert!(!refreshed.created);

    let view = service.get_purchase_order(PO).await.unwrap();
    assert_eq!(view.header.status.as_deref(), Some("amended"));
    assert_eq!(view.items.len(), 2, "items missing from a snapshot are kept");
    let item_10 = view.items.iter().find(|i| i.item.po_item_no == 10).unwrap();
    assert_eq!(item_10.item.ordered_quantity, dec!(120));
    assert_eq!(item_10.item.rate, dec!(12.5));
    assert_eq!(item_10.lots.len(), 2);
}

#[tokio::test]
async fn item_ids_survive_re_ingestion() {
    let app = TestApp::new().await;
    app.seed_po(PO, vec![po_item(10, dec!(100), dec!(12))]).await;
    app.create_dc(PO, vec![dispatch(10, None, dec!(30))])
        .await
        .unwrap();

    app.seed_po(PO, vec![po_item(10, dec!(100), dec!(12))]).await;

    let ledgers = ledger::po_ledger(app.db(), PO).await.unwrap();
    assert_eq!(ledgers.len(), 1);
    assert_eq!(ledgers[0].total_delivered_qty, dec!(30));
}

#[tokio::test]
async fn lowering_ordered_quantity_tightens_capacity() {
    let app = TestApp::new().await;
    app.seed_po(PO, vec![po_item(10, dec!(100), dec!(12))]).await;
    app.create_dc(PO, vec![dispatch(10, None, dec!(50))])
        .await
        .unwrap();

    app.seed_po(PO, vec![po_item(10, dec!(60), dec!(12))]).await;

    let err = app
        .create_dc(PO, vec![dispatch(10, None, dec!(11))])
        .await
        .unwrap_err();
    assert!(err.kind().is_some());
    app.create_dc(PO, vec![dispatch(10, None, dec!(10))])
        .await
        .expect("remaining is recomputed from the new order");
}

#[tokio::test]
async fn invalid_snapshots_are_rejected() {
    let app = TestApp::new().await;
    let service = &app.state.services.purchase_orders;

    let err = service
        .upsert_purchase_order(
            po_header(PO),
            vec![po_item(10, dec!(1), dec!(1)), po_item(10, dec!(2), dec!(1))],
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));

    let err = service
        .upsert_purchase_order(po_header(0), vec![])
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));

    let mut header = po_header(PO);
    header.buyer_gstin = Some("TOO-SHORT".into());
    let err = service
        .upsert_purchase_order(header, vec![])
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));
}

#[tokio::test]
async fn missing_po_is_not_found() {
    let app = TestApp::new().await;
    let err = app
        .state
        .services
        .purchase_orders
        .get_purchase_order(PO)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}
