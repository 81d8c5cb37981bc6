use crate::{
    db::{begin_write, finish_write, DbPool},
    entities::{
        purchase_order::Entity as PurchaseOrder,
        srv::{self, Entity as Srv, SrvStatus},
        srv_item::{self, Entity as SrvItem},
    },
    errors::{ServiceError, ViolationKind},
    events::{Event, EventSender},
    services::ledger,
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    entity::prelude::*, sea_query::Expr, ConnectionTrait, QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SrvRequest {
    pub srv_number: String,
    pub po_number: i64,
    pub srv_date: Option<NaiveDate>,
    #[serde(default)]
    pub received_by: Option<String>,
    #[serde(default)]
    pub items: Vec<SrvLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SrvLine {
    pub po_item_no: i32,
    #[serde(default)]
    pub lot_no: Option<i32>,
    pub received_quantity: Decimal,
    /// Defaults to received minus rejected.
    #[serde(default)]
    pub accepted_quantity: Option<Decimal>,
    #[serde(default)]
    pub rejected_quantity: Decimal,
}

impl SrvLine {
    pub fn accepted(&self) -> Decimal {
        self.accepted_quantity
            .unwrap_or_else(|| (self.received_quantity - self.rejected_quantity).max(Decimal::ZERO))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SrvDocument {
    #[serde(flatten)]
    pub header: srv::Model,
    pub items: Vec<srv_item::Model>,
}

/// Receipt totals for one PO item after linking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptTotals {
    pub po_item_no: i32,
    pub total_received_qty: Decimal,
    pub total_accepted_qty: Decimal,
    pub total_rejected_qty: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkOutcome {
    pub po_number: i64,
    /// SRVs that were orphans before this pass.
    pub linked_srvs: Vec<String>,
    pub items: Vec<ReceiptTotals>,
}

/// Shape checks on an SRV. Does not require the PO to exist.
pub fn validate_srv_shape(request: &SrvRequest) -> Result<(), ServiceError> {
    if request.srv_number.trim().is_empty() {
        return Err(ServiceError::validation("SRV number is required"));
    }
    if request.po_number <= 0 {
        return Err(ServiceError::validation("PO number is required"));
    }
    if request.srv_date.is_none() {
        return Err(ServiceError::validation("SRV date is required"));
    }
    if request.items.is_empty() {
        return Err(ServiceError::validation("SRV must have at least one item"));
    }
    for line in &request.items {
        let negative = line.received_quantity.is_sign_negative()
            || line.rejected_quantity.is_sign_negative()
            || line
                .accepted_quantity
                .map_or(false, |q| q.is_sign_negative());
        if negative {
            return Err(ServiceError::validation(format!(
                "SRV quantities for PO item {} must not be negative",
                line.po_item_no
            )));
        }
    }
    Ok(())
}

pub struct SrvService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl SrvService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Full validation of an SRV against the current database.
    pub async fn validate(&self, request: &SrvRequest) -> Result<(), ServiceError> {
        validate_srv(self.db_pool.as_ref(), request).await
    }

    /// Validates and stores an SRV. An SRV whose PO is not on file is kept as
    /// an orphan and ignored by the ledger until the PO is ingested.
    #[instrument(
        skip(self, request),
        fields(srv_number = %request.srv_number, po_number = request.po_number)
    )]
    pub async fn ingest(&self, request: SrvRequest) -> Result<SrvDocument, ServiceError> {
        validate_srv_shape(&request)?;

        let txn = begin_write(&self.db_pool, "ingest_srv").await?;
        let result = Self::ingest_in_txn(txn.conn(), &request).await;
        let document = finish_write(txn, result).await?;

        info!(
            po_found = document.header.po_found,
            lines = document.items.len(),
            "SRV ingested"
        );
        self.event_sender
            .send_or_log(Event::SrvIngested {
                srv_number: document.header.srv_number.clone(),
                po_number: document.header.po_number,
                po_found: document.header.po_found,
            })
            .await;

        Ok(document)
    }

    async fn ingest_in_txn<C: ConnectionTrait>(
        conn: &C,
        request: &SrvRequest,
    ) -> Result<SrvDocument, ServiceError> {
        validate_srv(conn, request).await?;

        let srv_number = request.srv_number.trim().to_string();
        let srv_date = request
            .srv_date
            .ok_or_else(|| ServiceError::validation("SRV date is required"))?;
        let po_found = PurchaseOrder::find_by_id(request.po_number)
            .one(conn)
            .await?
            .is_some();
        let now = Utc::now();

        let header = srv::ActiveModel {
            srv_number: Set(srv_number.clone()),
            po_number: Set(request.po_number),
            srv_date: Set(srv_date),
            received_by: Set(request.received_by.clone()),
            po_found: Set(po_found),
            status: Set(SrvStatus::Active),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(conn)
        .await?;

        let rows = request.items.iter().map(|line| srv_item::ActiveModel {
            srv_number: Set(srv_number.clone()),
            po_item_no: Set(line.po_item_no),
            lot_no: Set(line.lot_no),
            received_quantity: Set(line.received_quantity),
            accepted_quantity: Set(line.accepted()),
            rejected_quantity: Set(line.rejected_quantity),
            ..Default::default()
        });
        SrvItem::insert_many(rows).exec(conn).await?;

        let items = load_items(conn, &srv_number).await?;
        Ok(SrvDocument { header, items })
    }

    /// Soft-deactivates an SRV. Deactivating twice is a no-op.
    #[instrument(skip(self))]
    pub async fn deactivate(&self, srv_number: &str) -> Result<SrvDocument, ServiceError> {
        let txn = begin_write(&self.db_pool, "deactivate_srv").await?;
        let result = Self::deactivate_in_txn(txn.conn(), srv_number).await;
        let (document, changed) = finish_write(txn, result).await?;

        if changed {
            info!(srv_number, "SRV deactivated");
            self.event_sender
                .send_or_log(Event::SrvDeactivated {
                    srv_number: document.header.srv_number.clone(),
                    po_number: document.header.po_number,
                })
                .await;
        }

        Ok(document)
    }

    async fn deactivate_in_txn<C: ConnectionTrait>(
        conn: &C,
        srv_number: &str,
    ) -> Result<(SrvDocument, bool), ServiceError> {
        let existing = find_srv(conn, srv_number).await?;
        let changed = existing.status != SrvStatus::Deactivated;

        let header = if changed {
            let mut model: srv::ActiveModel = existing.into();
            model.status = Set(SrvStatus::Deactivated);
            model.updated_at = Set(Utc::now());
            model.update(conn).await?
        } else {
            existing
        };

        let items = load_items(conn, srv_number).await?;
        Ok((SrvDocument { header, items }, changed))
    }

    /// Links orphan SRVs of a PO that has just arrived and returns the
    /// resulting receipt totals per PO item.
    #[instrument(skip(self))]
    pub async fn link_on_po_arrival(&self, po_number: i64) -> Result<LinkOutcome, ServiceError> {
        let txn = begin_write(&self.db_pool, "link_orphan_srvs").await?;
        let result = link_on_po_arrival_in_txn(txn.conn(), po_number).await;
        let outcome = finish_write(txn, result).await?;

        if !outcome.linked_srvs.is_empty() {
            self.event_sender
                .send_or_log(Event::OrphanSrvsLinked {
                    po_number,
                    srv_numbers: outcome.linked_srvs.clone(),
                })
                .await;
        }

        Ok(outcome)
    }

    pub async fn get(&self, srv_number: &str) -> Result<SrvDocument, ServiceError> {
        let db = self.db_pool.as_ref();
        let header = find_srv(db, srv_number).await?;
        let items = load_items(db, srv_number).await?;
        Ok(SrvDocument { header, items })
    }
}

/// Shape checks followed by the duplicate number check.
pub async fn validate_srv<C: ConnectionTrait>(
    conn: &C,
    request: &SrvRequest,
) -> Result<(), ServiceError> {
    validate_srv_shape(request)?;

    let number = request.srv_number.trim();
    if Srv::find_by_id(number.to_string())
        .one(conn)
        .await?
        .is_some()
    {
        return Err(ServiceError::violation(
            ViolationKind::DuplicateSRVNumber,
            format!("SRV {} already exists", number),
        ));
    }
    Ok(())
}

/// Flips every orphan SRV of `po_number` to found, then recomputes receipt
/// totals from all active SRVs. Running it again changes nothing.
pub async fn link_on_po_arrival_in_txn<C: ConnectionTrait>(
    conn: &C,
    po_number: i64,
) -> Result<LinkOutcome, ServiceError> {
    PurchaseOrder::find_by_id(po_number)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::not_found(format!("PO {} not found", po_number)))?;

    let linked_srvs: Vec<String> = Srv::find()
        .select_only()
        .column(srv::Column::SrvNumber)
        .filter(srv::Column::PoNumber.eq(po_number))
        .filter(srv::Column::PoFound.eq(false))
        .order_by_asc(srv::Column::SrvNumber)
        .into_tuple()
        .all(conn)
        .await?;

    if !linked_srvs.is_empty() {
        Srv::update_many()
            .col_expr(srv::Column::PoFound, Expr::value(true))
            .col_expr(srv::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(srv::Column::PoNumber.eq(po_number))
            .filter(srv::Column::PoFound.eq(false))
            .exec(conn)
            .await?;
        info!(po_number, linked = linked_srvs.len(), "orphan SRVs linked");
    }

    let items = ledger::po_ledger(conn, po_number)
        .await?
        .into_iter()
        .map(|l| ReceiptTotals {
            po_item_no: l.po_item_no,
            total_received_qty: l.total_received_qty,
            total_accepted_qty: l.total_accepted_qty,
            total_rejected_qty: l.total_rejected_qty,
        })
        .collect();

    Ok(LinkOutcome {
        po_number,
        linked_srvs,
        items,
    })
}

async fn find_srv<C: ConnectionTrait>(
    conn: &C,
    srv_number: &str,
) -> Result<srv::Model, ServiceError> {
    Srv::find_by_id(srv_number.to_string())
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::not_found(format!("SRV {} not found", srv_number)))
}

async fn load_items<C: ConnectionTrait>(
    conn: &C,
    srv_number: &str,
) -> Result<Vec<srv_item::Model>, ServiceError> {
    Ok(SrvItem::find()
        .filter(srv_item::Column::SrvNumber.eq(srv_number))
        .order_by_asc(srv_item::Column::Id)
        .all(conn)
        .await?)
}
