//! Ingestion contract for purchase orders.
//!
//! Scrapers and importers hand over a full PO snapshot; the upsert is
//! idempotent per `po_number`. Items are matched on `po_item_no` and lots on
//! `lot_no`, so the row ids DCs reference stay stable across re-imports.
//! Items missing from a later snapshot are kept, since DC rows may point at
//! them.

use crate::{
    db::{begin_write, finish_write, DbPool},
    entities::{
        purchase_order::{self, Entity as PurchaseOrder},
        purchase_order_item::{self, Entity as PurchaseOrderItem},
        purchase_order_lot::{self, Entity as PurchaseOrderLot},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::srvs::{self, LinkOutcome},
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{entity::prelude::*, ConnectionTrait, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, sync::Arc};
use tracing::{info, instrument};
use validator::Validate;

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct PurchaseOrderHeader {
    #[validate(range(min = 1))]
    pub po_number: i64,
    pub po_date: Option<NaiveDate>,
    pub supplier_name: Option<String>,
    pub supplier_code: Option<String>,
    pub buyer_name: Option<String>,
    #[validate(length(equal = 15))]
    pub buyer_gstin: Option<String>,
    pub department: Option<String>,
    pub po_value: Option<Decimal>,
    pub currency: Option<String>,
    pub exchange_rate: Option<Decimal>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseOrderItemInput {
    pub po_item_no: i32,
    #[serde(default)]
    pub material_code: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub hsn_code: Option<String>,
    pub rate: Decimal,
    pub ordered_quantity: Decimal,
    #[serde(default)]
    pub lots: Vec<DeliveryLotInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryLotInput {
    pub lot_no: i32,
    pub scheduled_quantity: Decimal,
    #[serde(default)]
    pub delivery_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseOrderUpsertOutcome {
    pub po_number: i64,
    pub created: bool,
    pub items_upserted: usize,
    pub lots_upserted: usize,
    pub srv_link: LinkOutcome,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseOrderItemView {
    #[serde(flatten)]
    pub item: purchase_order_item::Model,
    pub lots: Vec<purchase_order_lot::Model>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseOrderView {
    #[serde(flatten)]
    pub header: purchase_order::Model,
    pub items: Vec<PurchaseOrderItemView>,
}

fn validate_items(items: &[PurchaseOrderItemInput]) -> Result<(), ServiceError> {
    let mut item_nos = HashSet::new();
    for item in items {
        if !item_nos.insert(item.po_item_no) {
            return Err(ServiceError::validation(format!(
                "PO item {} appears more than once",
                item.po_item_no
            )));
        }
        if item.ordered_quantity.is_sign_negative() || item.rate.is_sign_negative() {
            return Err(ServiceError::validation(format!(
                "PO item {} has a negative quantity or rate",
                item.po_item_no
            )));
        }

        let mut lot_nos = HashSet::new();
        for lot in &item.lots {
            if !lot_nos.insert(lot.lot_no) {
                return Err(ServiceError::validation(format!(
                    "Lot {} appears more than once on PO item {}",
                    lot.lot_no, item.po_item_no
                )));
            }
            if lot.scheduled_quantity.is_sign_negative() {
                return Err(ServiceError::validation(format!(
                    "Lot {} on PO item {} has a negative scheduled quantity",
                    lot.lot_no, item.po_item_no
                )));
            }
        }
    }
    Ok(())
}

pub struct PurchaseOrderService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl PurchaseOrderService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Creates or refreshes a PO with its items and lots, then links any
    /// orphan SRVs waiting for it, all in one write transaction.
    #[instrument(skip(self, header, items), fields(po_number = header.po_number))]
    pub async fn upsert_purchase_order(
        &self,
        header: PurchaseOrderHeader,
        items: Vec<PurchaseOrderItemInput>,
    ) -> Result<PurchaseOrderUpsertOutcome, ServiceError> {
        header.validate()?;
        validate_items(&items)?;

        let txn = begin_write(&self.db_pool, "upsert_purchase_order").await?;
        let result = Self::upsert_in_txn(txn.conn(), &header, &items).await;
        let outcome = finish_write(txn, result).await?;

        info!(
            created = outcome.created,
            items = outcome.items_upserted,
            lots = outcome.lots_upserted,
            linked_srvs = outcome.srv_link.linked_srvs.len(),
            "purchase order upserted"
        );
        self.event_sender
            .send_or_log(Event::PurchaseOrderUpserted {
                po_number: outcome.po_number,
                created: outcome.created,
                item_count: outcome.items_upserted,
            })
            .await;
        if !outcome.srv_link.linked_srvs.is_empty() {
            self.event_sender
                .send_or_log(Event::OrphanSrvsLinked {
                    po_number: outcome.po_number,
                    srv_numbers: outcome.srv_link.linked_srvs.clone(),
                })
                .await;
        }

        Ok(outcome)
    }

    async fn upsert_in_txn<C: ConnectionTrait>(
        conn: &C,
        header: &PurchaseOrderHeader,
        items: &[PurchaseOrderItemInput],
    ) -> Result<PurchaseOrderUpsertOutcome, ServiceError> {
        let now = Utc::now();
        let existing = PurchaseOrder::find_by_id(header.po_number).one(conn).await?;
        let created = existing.is_none();

        let mut po: purchase_order::ActiveModel = match existing {
            Some(model) => model.into(),
            None => purchase_order::ActiveModel {
                po_number: Set(header.po_number),
                created_at: Set(now),
                ..Default::default()
            },
        };
        po.po_date = Set(header.po_date);
        po.supplier_name = Set(header.supplier_name.clone());
        po.supplier_code = Set(header.supplier_code.clone());
        po.buyer_name = Set(header.buyer_name.clone());
        po.buyer_gstin = Set(header.buyer_gstin.clone());
        po.department = Set(header.department.clone());
        po.po_value = Set(header.po_value);
        po.currency = Set(header.currency.clone());
        po.exchange_rate = Set(header.exchange_rate);
        po.status = Set(header.status.clone());
        po.updated_at = Set(now);
        if created {
            po.insert(conn).await?;
        } else {
            po.update(conn).await?;
        }

        let mut lots_upserted = 0;
        for input in items {
            let item = upsert_item(conn, header.po_number, input).await?;
            for lot in &input.lots {
                upsert_lot(conn, item.id, lot).await?;
                lots_upserted += 1;
            }
        }

        let srv_link = srvs::link_on_po_arrival_in_txn(conn, header.po_number).await?;

        Ok(PurchaseOrderUpsertOutcome {
            po_number: header.po_number,
            created,
            items_upserted: items.len(),
            lots_upserted,
            srv_link,
        })
    }

    /// A PO with its items and their lots.
    pub async fn get_purchase_order(
        &self,
        po_number: i64,
    ) -> Result<PurchaseOrderView, ServiceError> {
        let db = self.db_pool.as_ref();
        let header = PurchaseOrder::find_by_id(po_number)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("PO {} not found", po_number)))?;

        let items = PurchaseOrderItem::find()
            .filter(purchase_order_item::Column::PoNumber.eq(po_number))
            .order_by_asc(purchase_order_item::Column::PoItemNo)
            .find_with_related(PurchaseOrderLot)
            .all(db)
            .await?
            .into_iter()
            .map(|(item, mut lots)| {
                lots.sort_by_key(|l| l.lot_no);
                PurchaseOrderItemView { item, lots }
            })
            .collect();

        Ok(PurchaseOrderView { header, items })
    }
}

async fn upsert_item<C: ConnectionTrait>(
    conn: &C,
    po_number: i64,
    input: &PurchaseOrderItemInput,
) -> Result<purchase_order_item::Model, ServiceError> {
    let existing = PurchaseOrderItem::find()
        .filter(purchase_order_item::Column::PoNumber.eq(po_number))
        .filter(purchase_order_item::Column::PoItemNo.eq(input.po_item_no))
        .one(conn)
        .await?;

    let is_new = existing.is_none();
    let mut model: purchase_order_item::ActiveModel = match existing {
        Some(item) => item.into(),
        None => purchase_order_item::ActiveModel {
            po_number: Set(po_number),
            po_item_no: Set(input.po_item_no),
            ..Default::default()
        },
    };
    model.material_code = Set(input.material_code.clone());
    model.description = Set(input.description.clone());
    model.unit = Set(input.unit.clone());
    model.hsn_code = Set(input.hsn_code.clone());
    model.rate = Set(input.rate);
    model.ordered_quantity = Set(input.ordered_quantity);

    let item = if is_new {
        model.insert(conn).await?
    } else {
        model.update(conn).await?
    };
    Ok(item)
}

async fn upsert_lot<C: ConnectionTrait>(
    conn: &C,
    po_item_id: i64,
    input: &DeliveryLotInput,
) -> Result<purchase_order_lot::Model, ServiceError> {
    let existing = PurchaseOrderLot::find()
        .filter(purchase_order_lot::Column::PoItemId.eq(po_item_id))
        .filter(purchase_order_lot::Column::LotNo.eq(input.lot_no))
        .one(conn)
        .await?;

    let lot = match existing {
        Some(lot) => {
            let mut model: purchase_order_lot::ActiveModel = lot.into();
            model.scheduled_quantity = Set(input.scheduled_quantity);
            model.delivery_date = Set(input.delivery_date);
            model.update(conn).await?
        }
        None => {
            purchase_order_lot::ActiveModel {
                po_item_id: Set(po_item_id),
                lot_no: Set(input.lot_no),
                scheduled_quantity: Set(input.scheduled_quantity),
                delivery_date: Set(input.delivery_date),
                ..Default::default()
            }
            .insert(conn)
            .await?
        }
    };
    Ok(lot)
}
