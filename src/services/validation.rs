//! Validation engine for dispatch and billing writes.
//!
//! The capacity rules are pure functions over numbers the ledger produced.
//! The async resolvers read through [`crate::services::ledger`] on whatever
//! connection they are given; document services call them on the open write
//! transaction so the check and the insert that consumes the capacity see the
//! same state.

use crate::{
    entities::{
        delivery_challan::{self, Entity as DeliveryChallan},
        delivery_challan_item::{self, Entity as DeliveryChallanItem},
        gst_invoice::Entity as GstInvoice,
        invoice_dc_link::{self, Entity as InvoiceDcLink},
        purchase_order::Entity as PurchaseOrder,
        purchase_order_item::{self, Entity as PurchaseOrderItem},
        purchase_order_lot::{self, Entity as PurchaseOrderLot},
    },
    errors::{ServiceError, ViolationKind},
    services::{
        delivery_challans::{DeliveryChallanHeader, DispatchLine},
        invoices::CreateInvoiceRequest,
        ledger::{self, QTY_TOLERANCE},
    },
};
use rust_decimal::Decimal;
use sea_orm::{entity::prelude::*, ConnectionTrait, QueryOrder};
use serde::Serialize;
use std::collections::BTreeMap;

/// Requested lot dispatch against what the lot schedules.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LotCapacity {
    pub lot_no: i32,
    pub requested: Decimal,
    pub scheduled: Decimal,
    pub dispatched: Decimal,
}

impl LotCapacity {
    pub fn remaining(&self) -> Decimal {
        self.scheduled - self.dispatched
    }
}

/// Requested dispatch for one PO item, aggregated over a whole request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapacityCheck {
    pub po_item_no: i32,
    pub requested: Decimal,
    pub ordered: Decimal,
    pub delivered: Decimal,
    pub lots: Vec<LotCapacity>,
}

impl CapacityCheck {
    pub fn remaining(&self) -> Decimal {
        self.ordered - self.delivered
    }
}

/// Lot checks run first, then the global PO item check. Both allow
/// [`QTY_TOLERANCE`] of overshoot.
pub fn check_capacity(check: &CapacityCheck) -> Result<(), ServiceError> {
    for lot in &check.lots {
        if lot.requested > lot.remaining() + QTY_TOLERANCE {
            return Err(ServiceError::violation(
                ViolationKind::LotOverDispatch,
                format!(
                    "PO item {} lot {}: requested {} but only {} of {} scheduled remains",
                    check.po_item_no,
                    lot.lot_no,
                    lot.requested,
                    lot.remaining(),
                    lot.scheduled
                ),
            ));
        }
    }

    if check.requested > check.remaining() + QTY_TOLERANCE {
        return Err(ServiceError::violation(
            ViolationKind::GlobalOverDispatch,
            format!(
                "PO item {}: requested {} but only {} of {} ordered remains",
                check.po_item_no,
                check.requested,
                check.remaining(),
                check.ordered
            ),
        ));
    }

    Ok(())
}

/// Header and line shape checks, run before anything touches the ledger.
pub fn validate_dc_header(
    header: &DeliveryChallanHeader,
    lines: &[DispatchLine],
) -> Result<(), ServiceError> {
    if let Some(number) = &header.dc_number {
        if number.trim().is_empty() {
            return Err(ServiceError::validation("DC number must not be blank"));
        }
    }
    if header.po_number <= 0 {
        return Err(ServiceError::validation("PO number is required"));
    }
    if header.dc_date.is_none() {
        return Err(ServiceError::validation("DC date is required"));
    }
    if lines.is_empty() {
        return Err(ServiceError::validation(
            "Delivery challan must have at least one item",
        ));
    }
    for line in lines {
        if line.dispatch_quantity <= Decimal::ZERO {
            return Err(ServiceError::validation(format!(
                "Dispatch quantity for PO item {} must be positive",
                line.po_item_no
            )));
        }
    }
    Ok(())
}

/// A dispatch line bound to the PO item it draws from.
#[derive(Debug, Clone)]
pub struct ResolvedLine {
    pub item: purchase_order_item::Model,
    pub line: DispatchLine,
}

/// Resolves every line to its PO item and lot, then checks the aggregated
/// request against the ledger. Rows of `exclude_dc` are ignored so an edit
/// does not count what it is about to replace.
pub async fn validate_dispatch_lines<C: ConnectionTrait>(
    conn: &C,
    po_number: i64,
    lines: &[DispatchLine],
    exclude_dc: Option<&str>,
) -> Result<Vec<ResolvedLine>, ServiceError> {
    PurchaseOrder::find_by_id(po_number)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::not_found(format!("PO {} not found", po_number)))?;

    let items: BTreeMap<i32, purchase_order_item::Model> = PurchaseOrderItem::find()
        .filter(purchase_order_item::Column::PoNumber.eq(po_number))
        .all(conn)
        .await?
        .into_iter()
        .map(|item| (item.po_item_no, item))
        .collect();

    let mut resolved = Vec::with_capacity(lines.len());
    for line in lines {
        let item = items.get(&line.po_item_no).ok_or_else(|| {
            ServiceError::not_found(format!(
                "PO item {} not found on PO {}",
                line.po_item_no, po_number
            ))
        })?;
        resolved.push(ResolvedLine {
            item: item.clone(),
            line: line.clone(),
        });
    }

    for check in build_capacity_checks(conn, &resolved, exclude_dc).await? {
        check_capacity(&check)?;
    }

    Ok(resolved)
}

/// Capacity numbers for the aggregated request, one entry per PO item in
/// item-number order.
pub async fn build_capacity_checks<C: ConnectionTrait>(
    conn: &C,
    resolved: &[ResolvedLine],
    exclude_dc: Option<&str>,
) -> Result<Vec<CapacityCheck>, ServiceError> {
    let mut per_item: BTreeMap<i32, (&purchase_order_item::Model, Decimal)> = BTreeMap::new();
    let mut per_lot: BTreeMap<(i32, i32), Decimal> = BTreeMap::new();
    for entry in resolved {
        let slot = per_item
            .entry(entry.item.po_item_no)
            .or_insert((&entry.item, Decimal::ZERO));
        slot.1 += entry.line.dispatch_quantity;
        if let Some(lot_no) = entry.line.lot_no {
            *per_lot.entry((entry.item.po_item_no, lot_no)).or_default() +=
                entry.line.dispatch_quantity;
        }
    }

    let mut checks = Vec::with_capacity(per_item.len());
    for (po_item_no, (item, requested)) in per_item {
        let mut lots = Vec::new();
        let lot_range = (po_item_no, i32::MIN)..=(po_item_no, i32::MAX);
        for (&(_, lot_no), &lot_requested) in per_lot.range(lot_range) {
            let lot = PurchaseOrderLot::find()
                .filter(purchase_order_lot::Column::PoItemId.eq(item.id))
                .filter(purchase_order_lot::Column::LotNo.eq(lot_no))
                .one(conn)
                .await?
                .ok_or_else(|| {
                    ServiceError::not_found(format!(
                        "Lot {} not found for PO item {}",
                        lot_no, po_item_no
                    ))
                })?;
            let dispatched = ledger::lot_dispatched(conn, item.id, lot_no, exclude_dc).await?;
            lots.push(LotCapacity {
                lot_no,
                requested: lot_requested,
                scheduled: lot.scheduled_quantity,
                dispatched,
            });
        }

        let item_ledger = ledger::item_ledger(conn, item, exclude_dc).await?;
        checks.push(CapacityCheck {
            po_item_no,
            requested,
            ordered: item_ledger.ordered_quantity,
            delivered: item_ledger.total_delivered_qty,
            lots,
        });
    }

    Ok(checks)
}

/// Presence checks on the invoice header.
pub fn validate_invoice_header(request: &CreateInvoiceRequest) -> Result<(), ServiceError> {
    if request.dc_number.trim().is_empty() {
        return Err(ServiceError::validation("DC number is required"));
    }
    if request.invoice_date.is_none() {
        return Err(ServiceError::validation("Invoice date is required"));
    }
    if request
        .buyer_name
        .as_deref()
        .map_or(true, |name| name.trim().is_empty())
    {
        return Err(ServiceError::validation("Buyer name is required"));
    }
    if let Some(number) = &request.invoice_number {
        if number.trim().is_empty() {
            return Err(ServiceError::validation("Invoice number must not be blank"));
        }
    }
    for o in &request.overrides {
        if o.quantity.map_or(false, |q| q <= Decimal::ZERO) {
            return Err(ServiceError::validation(format!(
                "Override quantity for lot {} must be positive",
                o.lot_no
            )));
        }
        if o.rate.map_or(false, |r| r.is_sign_negative()) {
            return Err(ServiceError::validation(format!(
                "Override rate for lot {} must not be negative",
                o.lot_no
            )));
        }
    }
    Ok(())
}

/// The source DC together with the items an invoice will be projected from.
#[derive(Debug, Clone)]
pub struct InvoiceSource {
    pub dc: delivery_challan::Model,
    pub items: Vec<delivery_challan_item::Model>,
}

/// Checks the DC can be billed: it exists, carries no invoice yet, has items,
/// and the caller's invoice number (if any) is free.
pub async fn check_invoice_source<C: ConnectionTrait>(
    conn: &C,
    dc_number: &str,
    invoice_number: Option<&str>,
) -> Result<InvoiceSource, ServiceError> {
    let dc = DeliveryChallan::find_by_id(dc_number.to_string())
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::not_found(format!("DC {} not found", dc_number)))?;

    if let Some(link) = find_invoice_link(conn, dc_number).await? {
        return Err(ServiceError::violation(
            ViolationKind::DuplicateDCInvoice,
            format!(
                "DC {} is already billed by invoice {}",
                dc_number, link.invoice_number
            ),
        ));
    }

    if let Some(number) = invoice_number {
        if invoice_number_taken(conn, number).await? {
            return Err(ServiceError::violation(
                ViolationKind::DuplicateInvoiceNumber,
                format!("Invoice number {} already exists", number),
            ));
        }
    }

    let items = DeliveryChallanItem::find()
        .filter(delivery_challan_item::Column::DcNumber.eq(dc_number))
        .order_by_asc(delivery_challan_item::Column::Id)
        .all(conn)
        .await?;
    if items.is_empty() {
        return Err(ServiceError::violation(
            ViolationKind::EmptySourceDocument,
            format!("DC {} has no items to bill", dc_number),
        ));
    }

    Ok(InvoiceSource { dc, items })
}

/// The link that freezes a DC, if it has been invoiced.
pub async fn find_invoice_link<C: ConnectionTrait>(
    conn: &C,
    dc_number: &str,
) -> Result<Option<invoice_dc_link::Model>, ServiceError> {
    Ok(InvoiceDcLink::find()
        .filter(invoice_dc_link::Column::DcNumber.eq(dc_number))
        .one(conn)
        .await?)
}

/// Fails with `ImmutableDocument` when the DC has been invoiced.
pub async fn ensure_dc_editable<C: ConnectionTrait>(
    conn: &C,
    dc_number: &str,
) -> Result<(), ServiceError> {
    match find_invoice_link(conn, dc_number).await? {
        Some(link) => Err(ServiceError::violation(
            ViolationKind::ImmutableDocument,
            format!(
                "DC {} is frozen by invoice {}",
                dc_number, link.invoice_number
            ),
        )),
        None => Ok(()),
    }
}

pub async fn invoice_number_taken<C: ConnectionTrait>(
    conn: &C,
    invoice_number: &str,
) -> Result<bool, ServiceError> {
    Ok(GstInvoice::find_by_id(invoice_number.to_string())
        .one(conn)
        .await?
        .is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::NaiveDate;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn check(requested: Decimal, ordered: Decimal, delivered: Decimal) -> CapacityCheck {
        CapacityCheck {
            po_item_no: 10,
            requested,
            ordered,
            delivered,
            lots: Vec::new(),
        }
    }

    #[rstest]
    #[case(dec!(60), dec!(0), true)]
    #[case(dec!(50), dec!(60), false)]
    #[case(dec!(40), dec!(60), true)]
    #[case(dec!(40.0009), dec!(60), true)]
    #[case(dec!(40.002), dec!(60), false)]
    fn global_capacity_against_hundred_ordered(
        #[case] requested: Decimal,
        #[case] delivered: Decimal,
        #[case] ok: bool,
    ) {
        let result = check_capacity(&check(requested, dec!(100), delivered));
        assert_eq!(result.is_ok(), ok, "requested {requested} after {delivered}");
        if !ok {
            assert_eq!(
                result.unwrap_err().kind(),
                Some(ViolationKind::GlobalOverDispatch)
            );
        }
    }

    #[test]
    fn lot_check_runs_before_global() {
        let mut c = check(dec!(6), dec!(100), dec!(15));
        c.lots.push(LotCapacity {
            lot_no: 1,
            requested: dec!(6),
            scheduled: dec!(20),
            dispatched: dec!(15),
        });
        assert_matches!(
            check_capacity(&c),
            Err(ServiceError::BusinessRuleViolation {
                kind: ViolationKind::LotOverDispatch,
                ..
            })
        );

        c.requested = dec!(5);
        c.lots[0].requested = dec!(5);
        assert!(check_capacity(&c).is_ok());
    }

    #[test]
    fn lot_within_schedule_still_bound_by_order() {
        let mut c = check(dec!(10), dec!(100), dec!(95));
        c.lots.push(LotCapacity {
            lot_no: 2,
            requested: dec!(10),
            scheduled: dec!(50),
            dispatched: dec!(0),
        });
        assert_eq!(
            check_capacity(&c).unwrap_err().kind(),
            Some(ViolationKind::GlobalOverDispatch)
        );
    }

    fn header() -> DeliveryChallanHeader {
        DeliveryChallanHeader {
            dc_number: None,
            po_number: 4500,
            dc_date: NaiveDate::from_ymd_opt(2026, 5, 1),
            ..Default::default()
        }
    }

    fn line(qty: Decimal) -> DispatchLine {
        DispatchLine {
            po_item_no: 10,
            lot_no: None,
            description: None,
            dispatch_quantity: qty,
        }
    }

    #[test]
    fn header_checks() {
        assert!(validate_dc_header(&header(), &[line(dec!(1))]).is_ok());

        assert_matches!(
            validate_dc_header(&header(), &[]),
            Err(ServiceError::ValidationError(_))
        );

        let mut h = header();
        h.dc_date = None;
        assert_matches!(
            validate_dc_header(&h, &[line(dec!(1))]),
            Err(ServiceError::ValidationError(_))
        );

        let mut h = header();
        h.dc_number = Some("   ".into());
        assert_matches!(
            validate_dc_header(&h, &[line(dec!(1))]),
            Err(ServiceError::ValidationError(_))
        );

        assert_matches!(
            validate_dc_header(&header(), &[line(dec!(0))]),
            Err(ServiceError::ValidationError(_))
        );
    }

    #[test]
    fn invoice_header_requires_buyer_and_date() {
        let mut request = CreateInvoiceRequest {
            invoice_number: None,
            dc_number: "4500-DC-01".into(),
            invoice_date: NaiveDate::from_ymd_opt(2026, 5, 2),
            buyer_name: Some("Bharat Heavy Electricals".into()),
            buyer_gstin: None,
            buyer_address: None,
            place_of_supply: None,
            overrides: Vec::new(),
        };
        assert!(validate_invoice_header(&request).is_ok());

        request.buyer_name = Some(" ".into());
        assert_matches!(
            validate_invoice_header(&request),
            Err(ServiceError::ValidationError(_))
        );

        request.buyer_name = Some("BHEL".into());
        request.invoice_date = None;
        assert_matches!(
            validate_invoice_header(&request),
            Err(ServiceError::ValidationError(_))
        );
    }
}
