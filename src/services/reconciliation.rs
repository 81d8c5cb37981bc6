use crate::{
    db::DbPool,
    entities::{
        delivery_challan::{self, Entity as DeliveryChallan},
        delivery_challan_item::{self, Entity as DeliveryChallanItem},
        invoice_dc_link::{self, Entity as InvoiceDcLink},
        purchase_order::Entity as PurchaseOrder,
    },
    errors::ServiceError,
    services::{
        ledger::{self, ItemLedger, QTY_TOLERANCE},
        tax::round2,
    },
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{entity::prelude::*, ConnectionTrait};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::Arc};
use strum::{Display, EnumString};
use tracing::instrument;

/// Fulfillment state of a PO item, derived only from quantities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FulfillmentStatus {
    NotStarted,
    Partial,
    Complete,
    OverDispatched,
}

pub fn fulfillment_status(ordered: Decimal, delivered: Decimal) -> FulfillmentStatus {
    if delivered <= Decimal::ZERO {
        FulfillmentStatus::NotStarted
    } else if delivered > ordered + QTY_TOLERANCE {
        FulfillmentStatus::OverDispatched
    } else if delivered >= ordered - QTY_TOLERANCE {
        FulfillmentStatus::Complete
    } else {
        FulfillmentStatus::Partial
    }
}

/// Delivered over ordered as a percentage with two decimals; zero when
/// nothing is ordered.
pub fn fulfillment_rate(ledgers: &[ItemLedger]) -> Decimal {
    let ordered: Decimal = ledgers.iter().map(|l| l.ordered_quantity).sum();
    if ordered <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let delivered: Decimal = ledgers.iter().map(|l| l.total_delivered_qty).sum();
    round2(delivered / ordered * dec!(100))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationLine {
    pub po_item_id: i64,
    pub po_item_no: i32,
    pub ordered: Decimal,
    pub delivered: Decimal,
    pub pending: Decimal,
    pub received: Decimal,
    pub accepted: Decimal,
    pub rejected: Decimal,
    pub status: FulfillmentStatus,
}

impl From<&ItemLedger> for ReconciliationLine {
    fn from(l: &ItemLedger) -> Self {
        Self {
            po_item_id: l.po_item_id,
            po_item_no: l.po_item_no,
            ordered: l.ordered_quantity,
            delivered: l.total_delivered_qty,
            pending: l.pending_quantity(),
            received: l.total_received_qty,
            accepted: l.total_accepted_qty,
            rejected: l.total_rejected_qty,
            status: fulfillment_status(l.ordered_quantity, l.total_delivered_qty),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoReconciliation {
    pub po_number: i64,
    pub items: Vec<ReconciliationLine>,
    pub fulfillment_rate: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchHistoryEntry {
    pub dc_number: String,
    pub dc_date: NaiveDate,
    pub lot_no: Option<i32>,
    pub dispatch_quantity: Decimal,
    pub invoice_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemReconciliation {
    pub ledger: ItemLedger,
    pub status: FulfillmentStatus,
    pub dispatch_history: Vec<DispatchHistoryEntry>,
}

/// Read-only projections of the ledger for reporting.
pub struct ReconciliationService {
    db_pool: Arc<DbPool>,
}

impl ReconciliationService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn reconcile(&self, po_number: i64) -> Result<PoReconciliation, ServiceError> {
        reconcile(self.db_pool.as_ref(), po_number).await
    }

    #[instrument(skip(self))]
    pub async fn reconcile_item(
        &self,
        po_item_id: i64,
    ) -> Result<ItemReconciliation, ServiceError> {
        reconcile_item(self.db_pool.as_ref(), po_item_id).await
    }
}

pub async fn reconcile<C: ConnectionTrait>(
    conn: &C,
    po_number: i64,
) -> Result<PoReconciliation, ServiceError> {
    PurchaseOrder::find_by_id(po_number)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::not_found(format!("PO {} not found", po_number)))?;

    let ledgers = ledger::po_ledger(conn, po_number).await?;
    Ok(PoReconciliation {
        po_number,
        items: ledgers.iter().map(ReconciliationLine::from).collect(),
        fulfillment_rate: fulfillment_rate(&ledgers),
    })
}

pub async fn reconcile_item<C: ConnectionTrait>(
    conn: &C,
    po_item_id: i64,
) -> Result<ItemReconciliation, ServiceError> {
    let item_ledger = ledger::item_ledger_by_id(conn, po_item_id, None).await?;

    let rows = DeliveryChallanItem::find()
        .filter(delivery_challan_item::Column::PoItemId.eq(po_item_id))
        .find_also_related(DeliveryChallan)
        .all(conn)
        .await?;

    let dc_numbers: Vec<String> = rows.iter().map(|(row, _)| row.dc_number.clone()).collect();
    let invoices: HashMap<String, String> = if dc_numbers.is_empty() {
        HashMap::new()
    } else {
        InvoiceDcLink::find()
            .filter(invoice_dc_link::Column::DcNumber.is_in(dc_numbers))
            .all(conn)
            .await?
            .into_iter()
            .map(|link| (link.dc_number, link.invoice_number))
            .collect()
    };

    let mut dispatch_history = Vec::with_capacity(rows.len());
    for (row, dc) in rows {
        let dc: delivery_challan::Model = dc.ok_or_else(|| {
            ServiceError::InternalError(format!(
                "DC item {} references missing DC {}",
                row.id, row.dc_number
            ))
        })?;
        dispatch_history.push(DispatchHistoryEntry {
            invoice_number: invoices.get(&row.dc_number).cloned(),
            dc_number: row.dc_number,
            dc_date: dc.dc_date,
            lot_no: row.lot_no,
            dispatch_quantity: row.dispatch_quantity,
        });
    }
    dispatch_history.sort_by(|a, b| {
        a.dc_date
            .cmp(&b.dc_date)
            .then_with(|| a.dc_number.cmp(&b.dc_number))
    });

    Ok(ItemReconciliation {
        status: fulfillment_status(item_ledger.ordered_quantity, item_ledger.total_delivered_qty),
        ledger: item_ledger,
        dispatch_history,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(dec!(100), dec!(0), FulfillmentStatus::NotStarted)]
    #[case(dec!(100), dec!(60), FulfillmentStatus::Partial)]
    #[case(dec!(100), dec!(100), FulfillmentStatus::Complete)]
    #[case(dec!(100), dec!(99.9995), FulfillmentStatus::Complete)]
    #[case(dec!(100), dec!(100.5), FulfillmentStatus::OverDispatched)]
    #[case(dec!(0), dec!(0), FulfillmentStatus::NotStarted)]
    #[case(dec!(0), dec!(1), FulfillmentStatus::OverDispatched)]
    fn status_from_quantities(
        #[case] ordered: Decimal,
        #[case] delivered: Decimal,
        #[case] expected: FulfillmentStatus,
    ) {
        assert_eq!(fulfillment_status(ordered, delivered), expected);
    }

    fn ledger(ordered: Decimal, delivered: Decimal) -> ItemLedger {
        ItemLedger {
            po_item_id: 1,
            po_number: 4500,
            po_item_no: 10,
            ordered_quantity: ordered,
            total_delivered_qty: delivered,
            total_received_qty: Decimal::ZERO,
            total_accepted_qty: Decimal::ZERO,
            total_rejected_qty: Decimal::ZERO,
        }
    }

    #[test]
    fn rate_weights_by_quantity() {
        let ledgers = [ledger(dec!(100), dec!(100)), ledger(dec!(200), dec!(0))];
        assert_eq!(fulfillment_rate(&ledgers), dec!(33.33));
        assert_eq!(fulfillment_rate(&[]), Decimal::ZERO);
    }

    #[test]
    fn status_renders_snake_case() {
        assert_eq!(FulfillmentStatus::OverDispatched.to_string(), "over_dispatched");
        assert_eq!(
            serde_json::to_value(FulfillmentStatus::NotStarted).unwrap(),
            "not_started"
        );
    }
}
