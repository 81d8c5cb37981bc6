mod common;

use assert_matches::assert_matches;
use common::*;
use po_fulfillment::{
    errors::{ServiceError, ViolationKind},
    services::ledger,
};
use rust_decimal_macros::dec;

const PO: i64 = 4500012345;

async fn app_with_single_item() -> TestApp {
    let app = TestApp::new().await;
    app.seed_po(PO, vec![po_item(10, dec!(100), dec!(125.50))]).await;
    app
}

#[tokio::test]
async fn global_capacity_is_enforced_across_challans() {
    let app = app_with_single_item().await;

    let first = app
        .create_dc(PO, vec![dispatch(10, None, dec!(60))])
        .await
        .expect("first dispatch");
    assert_eq!(first.total_quantity(), dec!(60));

    let err = app
        .create_dc(PO, vec![dispatch(10, None, dec!(50))])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), Some(ViolationKind::GlobalOverDispatch));

    app.create_dc(PO, vec![dispatch(10, None, dec!(40))])
        .await
        .expect("dispatch up to the ordered quantity");

    let ledgers = ledger::po_ledger(app.db(), PO).await.unwrap();
    assert_eq!(ledgers[0].total_delivered_qty, dec!(100));
    assert_eq!(ledgers[0].pending_quantity(), dec!(0));
}

#[tokio::test]
async fn lot_capacity_is_enforced() {
    let app = TestApp::new().await;
    app.seed_po(
        PO,
        vec![with_lots(
            po_item(10, dec!(100), dec!(40)),
            &[(1, dec!(20)), (2, dec!(80))],
        )],
    )
    .await;

    app.create_dc(PO, vec![dispatch(10, Some(1), dec!(15))])
        .await
        .expect("seed lot dispatch");

    let err = app
        .create_dc(PO, vec![dispatch(10, Some(1), dec!(6))])
        .await
        .unwrap_err();
    assert_matches!(
        err,
        ServiceError::BusinessRuleViolation {
            kind: ViolationKind::LotOverDispatch,
            ..
        }
    );

    app.create_dc(PO, vec![dispatch(10, Some(1), dec!(5))])
        .await
        .expect("lot filled exactly");
}

#[tokio::test]
async fn lines_in_one_request_are_aggregated() {
    let app = app_with_single_item().await;

    let err = app
        .create_dc(
            PO,
            vec![dispatch(10, None, dec!(60)), dispatch(10, None, dec!(41))],
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), Some(ViolationKind::GlobalOverDispatch));

    let ledgers = ledger::po_ledger(app.db(), PO).await.unwrap();
    assert_eq!(ledgers[0].total_delivered_qty, dec!(0));
}

#[tokio::test]
async fn update_excludes_its_own_prior_quantity() {
    let app = TestApp::new().await;
    app.seed_po(PO, vec![po_item(10, dec!(75), dec!(125.50))]).await;

    app.create_dc(PO, vec![dispatch(10, None, dec!(30))])
        .await
        .unwrap();
    let dc = app
        .create_dc(PO, vec![dispatch(10, None, dec!(30))])
        .await
        .unwrap();
    let dc_number = dc.header.dc_number.clone();
    let service = &app.state.services.delivery_challans;

    let err = service
        .update(&dc_number, dc_header(PO), vec![dispatch(10, None, dec!(46))])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), Some(ViolationKind::GlobalOverDispatch));

    let updated = service
        .update(&dc_number, dc_header(PO), vec![dispatch(10, None, dec!(45))])
        .await
        .expect("remaining capacity is exactly 45");
    assert_eq!(updated.items.len(), 1);
    assert_eq!(updated.items[0].dispatch_quantity, dec!(45));

    let ledgers = ledger::po_ledger(app.db(), PO).await.unwrap();
    assert_eq!(ledgers[0].total_delivered_qty, dec!(75));
    assert_eq!(ledgers[0].pending_quantity(), dec!(0));
}

#[tokio::test]
async fn failed_update_leaves_previous_items() {
    let app = app_with_single_item().await;
    let dc = app
        .create_dc(PO, vec![dispatch(10, None, dec!(30))])
        .await
        .unwrap();
    let service = &app.state.services.delivery_challans;

    service
        .update(
            &dc.header.dc_number,
            dc_header(PO),
            vec![dispatch(10, None, dec!(101))],
        )
        .await
        .unwrap_err();

    let reloaded = service.get(&dc.header.dc_number).await.unwrap();
    assert_eq!(reloaded.total_quantity(), dec!(30));
}

#[tokio::test]
async fn dc_numbers_are_generated_per_po() {
    let app = app_with_single_item().await;

    let first = app
        .create_dc(PO, vec![dispatch(10, None, dec!(1))])
        .await
        .unwrap();
    let second = app
        .create_dc(PO, vec![dispatch(10, None, dec!(1))])
        .await
        .unwrap();

    assert_eq!(first.header.dc_number, format!("{}-DC-01", PO));
    assert_eq!(second.header.dc_number, format!("{}-DC-02", PO));

    let listed = app
        .state
        .services
        .delivery_challans
        .list_for_po(PO)
        .await
        .unwrap();
    assert_eq!(listed.len(), 2);
}

#[tokio::test]
async fn supplied_dc_number_must_be_unique() {
    let app = app_with_single_item().await;
    let service = &app.state.services.delivery_challans;

    let mut header = dc_header(PO);
    header.dc_number = Some("SEW/DC/118".into());
    service
        .create(header.clone(), vec![dispatch(10, None, dec!(10))])
        .await
        .expect("first use of the number");

    let err = service
        .create(header, vec![dispatch(10, None, dec!(10))])
        .await
        .unwrap_err();
    assert_matches!(
        err,
        ServiceError::Conflict {
            kind: ViolationKind::DuplicateDCNumber,
            ..
        }
    );
}

#[tokio::test]
async fn invoiced_dc_is_frozen() {
    let app = app_with_single_item().await;
    let dc = app
        .create_dc(PO, vec![dispatch(10, None, dec!(30))])
        .await
        .unwrap();
    let dc_number = dc.header.dc_number.clone();

    app.state
        .services
        .invoices
        .create(invoice_request(&dc_number))
        .await
        .expect("invoice");

    let service = &app.state.services.delivery_challans;
    let err = service
        .update(&dc_number, dc_header(PO), vec![dispatch(10, None, dec!(20))])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), Some(ViolationKind::ImmutableDocument));

    let err = service.delete(&dc_number).await.unwrap_err();
    assert_eq!(err.kind(), Some(ViolationKind::ImmutableDocument));

    let reloaded = service.get(&dc_number).await.unwrap();
    assert!(reloaded.is_invoiced());
    assert_eq!(reloaded.total_quantity(), dec!(30));
}

#[tokio::test]
async fn deleting_open_dc_releases_capacity() {
    let app = app_with_single_item().await;
    let dc = app
        .create_dc(PO, vec![dispatch(10, None, dec!(100))])
        .await
        .unwrap();

    app.state
        .services
        .delivery_challans
        .delete(&dc.header.dc_number)
        .await
        .expect("open DC can be deleted");

    let err = app
        .state
        .services
        .delivery_challans
        .get(&dc.header.dc_number)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));

    app.create_dc(PO, vec![dispatch(10, None, dec!(100))])
        .await
        .expect("capacity is free again");
}

#[tokio::test]
async fn unknown_references_are_not_found() {
    let app = app_with_single_item().await;

    let err = app
        .create_dc(PO + 1, vec![dispatch(10, None, dec!(1))])
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));

    let err = app
        .create_dc(PO, vec![dispatch(99, None, dec!(1))])
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));

    let err = app
        .create_dc(PO, vec![dispatch(10, Some(7), dec!(1))])
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn dc_cannot_move_to_another_po() {
    let app = app_with_single_item().await;
    app.seed_po(PO + 1, vec![po_item(10, dec!(100), dec!(1))]).await;
    let dc = app
        .create_dc(PO, vec![dispatch(10, None, dec!(5))])
        .await
        .unwrap();

    let err = app
        .state
        .services
        .delivery_challans
        .update(
            &dc.header.dc_number,
            dc_header(PO + 1),
            vec![dispatch(10, None, dec!(5))],
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));
}

#[tokio::test]
async fn shape_errors_are_rejected_before_writing() {
    let app = app_with_single_item().await;

    let err = app.create_dc(PO, vec![]).await.unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));

    let err = app
        .create_dc(PO, vec![dispatch(10, None, dec!(0))])
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));

    let mut header = dc_header(PO);
    header.dc_date = None;
    let err = app
        .state
        .services
        .delivery_challans
        .create(header, vec![dispatch(10, None, dec!(1))])
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));
}
