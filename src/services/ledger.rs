//! Reconciliation ledger.
//!
//! Every figure here is recomputed from DC items and SRV items on each call.
//! Nothing is cached on the PO item, so the same read path can back both the
//! capacity checks inside a write transaction and the reporting queries on
//! the pool.

use crate::{
    entities::{
        delivery_challan_item::{self, Entity as DeliveryChallanItem},
        purchase_order_item::{self, Entity as PurchaseOrderItem},
        srv::{self, SrvStatus},
        srv_item::{self, Entity as SrvItem},
    },
    errors::ServiceError,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{entity::prelude::*, ConnectionTrait, QueryOrder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Absorbs rounding noise from unit conversions in quantity comparisons.
pub const QTY_TOLERANCE: Decimal = dec!(0.001);

/// Quantities for one PO item as seen by the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemLedger {
    pub po_item_id: i64,
    pub po_number: i64,
    pub po_item_no: i32,
    pub ordered_quantity: Decimal,
    pub total_delivered_qty: Decimal,
    pub total_received_qty: Decimal,
    pub total_accepted_qty: Decimal,
    pub total_rejected_qty: Decimal,
}

impl ItemLedger {
    fn empty(item: &purchase_order_item::Model) -> Self {
        Self {
            po_item_id: item.id,
            po_number: item.po_number,
            po_item_no: item.po_item_no,
            ordered_quantity: item.ordered_quantity,
            total_delivered_qty: Decimal::ZERO,
            total_received_qty: Decimal::ZERO,
            total_accepted_qty: Decimal::ZERO,
            total_rejected_qty: Decimal::ZERO,
        }
    }

    /// Ordered minus delivered, never negative.
    pub fn pending_quantity(&self) -> Decimal {
        (self.ordered_quantity - self.total_delivered_qty).max(Decimal::ZERO)
    }
}

/// Ledger for a single PO item.
///
/// `exclude_dc` drops the rows of one DC from the delivered sum so an edit can
/// be validated without counting the rows it is about to replace.
pub async fn item_ledger<C: ConnectionTrait>(
    conn: &C,
    item: &purchase_order_item::Model,
    exclude_dc: Option<&str>,
) -> Result<ItemLedger, ServiceError> {
    let mut ledger = ItemLedger::empty(item);
    ledger.total_delivered_qty = delivered_for_item(conn, item.id, exclude_dc).await?;

    let receipts = active_receipts(conn, item.po_number)
        .await?
        .into_iter()
        .filter(|row| row.po_item_no == item.po_item_no);
    apply_receipts(&mut ledger, receipts);

    debug!(
        po_item_id = item.id,
        delivered = %ledger.total_delivered_qty,
        ordered = %ledger.ordered_quantity,
        "item ledger computed"
    );
    Ok(ledger)
}

/// Loads the PO item and returns its ledger.
pub async fn item_ledger_by_id<C: ConnectionTrait>(
    conn: &C,
    po_item_id: i64,
    exclude_dc: Option<&str>,
) -> Result<ItemLedger, ServiceError> {
    let item = PurchaseOrderItem::find_by_id(po_item_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::not_found(format!("PO item {} not found", po_item_id)))?;
    item_ledger(conn, &item, exclude_dc).await
}

/// Ledgers for every item of a PO, ordered by item number. A PO without
/// items yields an empty vector.
pub async fn po_ledger<C: ConnectionTrait>(
    conn: &C,
    po_number: i64,
) -> Result<Vec<ItemLedger>, ServiceError> {
    let items = PurchaseOrderItem::find()
        .filter(purchase_order_item::Column::PoNumber.eq(po_number))
        .order_by_asc(purchase_order_item::Column::PoItemNo)
        .all(conn)
        .await?;
    if items.is_empty() {
        return Ok(Vec::new());
    }

    let item_ids: Vec<i64> = items.iter().map(|i| i.id).collect();
    let dispatches = DeliveryChallanItem::find()
        .filter(delivery_challan_item::Column::PoItemId.is_in(item_ids))
        .all(conn)
        .await?;

    let mut delivered: HashMap<i64, Decimal> = HashMap::new();
    for row in dispatches {
        *delivered.entry(row.po_item_id).or_default() += row.dispatch_quantity;
    }

    let mut receipts: HashMap<i32, Vec<srv_item::Model>> = HashMap::new();
    for row in active_receipts(conn, po_number).await? {
        receipts.entry(row.po_item_no).or_default().push(row);
    }

    let ledgers = items
        .iter()
        .map(|item| {
            let mut ledger = ItemLedger::empty(item);
            ledger.total_delivered_qty = delivered.get(&item.id).copied().unwrap_or_default();
            if let Some(rows) = receipts.remove(&item.po_item_no) {
                apply_receipts(&mut ledger, rows);
            }
            ledger
        })
        .collect();

    Ok(ledgers)
}

/// Quantity already dispatched against one lot of a PO item.
pub async fn lot_dispatched<C: ConnectionTrait>(
    conn: &C,
    po_item_id: i64,
    lot_no: i32,
    exclude_dc: Option<&str>,
) -> Result<Decimal, ServiceError> {
    let mut query = DeliveryChallanItem::find()
        .filter(delivery_challan_item::Column::PoItemId.eq(po_item_id))
        .filter(delivery_challan_item::Column::LotNo.eq(lot_no));
    if let Some(dc_number) = exclude_dc {
        query = query.filter(delivery_challan_item::Column::DcNumber.ne(dc_number));
    }

    let rows = query.all(conn).await?;
    Ok(rows.iter().map(|r| r.dispatch_quantity).sum())
}

async fn delivered_for_item<C: ConnectionTrait>(
    conn: &C,
    po_item_id: i64,
    exclude_dc: Option<&str>,
) -> Result<Decimal, ServiceError> {
    let mut query =
        DeliveryChallanItem::find().filter(delivery_challan_item::Column::PoItemId.eq(po_item_id));
    if let Some(dc_number) = exclude_dc {
        query = query.filter(delivery_challan_item::Column::DcNumber.ne(dc_number));
    }

    let rows = query.all(conn).await?;
    Ok(rows.iter().map(|r| r.dispatch_quantity).sum())
}

/// SRV items of active SRVs that are linked to an existing PO.
async fn active_receipts<C: ConnectionTrait>(
    conn: &C,
    po_number: i64,
) -> Result<Vec<srv_item::Model>, ServiceError> {
    let rows = SrvItem::find()
        .inner_join(srv::Entity)
        .filter(srv::Column::PoNumber.eq(po_number))
        .filter(srv::Column::PoFound.eq(true))
        .filter(srv::Column::Status.eq(SrvStatus::Active))
        .all(conn)
        .await?;
    Ok(rows)
}

fn apply_receipts(ledger: &mut ItemLedger, rows: impl IntoIterator<Item = srv_item::Model>) {
    for row in rows {
        ledger.total_received_qty += row.received_quantity;
        ledger.total_accepted_qty += row.accepted_quantity;
        ledger.total_rejected_qty += row.rejected_quantity;
    }
}
