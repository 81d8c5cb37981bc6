use crate::{
    db::{begin_write, finish_write, DbPool},
    entities::{
        delivery_challan::{self, Entity as DeliveryChallan},
        delivery_challan_item::{self, Entity as DeliveryChallanItem},
    },
    errors::{ServiceError, ViolationKind},
    events::{Event, EventSender},
    services::{
        numbering,
        validation::{self, ResolvedLine},
    },
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{entity::prelude::*, ConnectionTrait, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};

/// Header fields of a delivery challan write.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeliveryChallanHeader {
    /// Generated as `{po_number}-DC-{seq}` when absent.
    pub dc_number: Option<String>,
    pub po_number: i64,
    pub dc_date: Option<NaiveDate>,
    pub consignee_name: Option<String>,
    pub consignee_gstin: Option<String>,
    pub consignee_address: Option<String>,
    pub vehicle_number: Option<String>,
    pub transporter: Option<String>,
    pub lr_number: Option<String>,
    pub eway_bill_number: Option<String>,
    pub remarks: Option<String>,
}

/// One dispatched line, addressed by PO item number and optional lot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchLine {
    pub po_item_no: i32,
    #[serde(default)]
    pub lot_no: Option<i32>,
    #[serde(default)]
    pub description: Option<String>,
    pub dispatch_quantity: Decimal,
}

/// A DC as handed to document renderers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryChallanDocument {
    #[serde(flatten)]
    pub header: delivery_challan::Model,
    pub items: Vec<delivery_challan_item::Model>,
    pub invoice_number: Option<String>,
}

impl DeliveryChallanDocument {
    pub fn is_invoiced(&self) -> bool {
        self.invoice_number.is_some()
    }

    pub fn total_quantity(&self) -> Decimal {
        self.items.iter().map(|i| i.dispatch_quantity).sum()
    }
}

pub struct DeliveryChallanService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl DeliveryChallanService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Validates and inserts a DC with its items in one write transaction.
    #[instrument(skip(self, header, lines), fields(po_number = header.po_number))]
    pub async fn create(
        &self,
        header: DeliveryChallanHeader,
        lines: Vec<DispatchLine>,
    ) -> Result<DeliveryChallanDocument, ServiceError> {
        validation::validate_dc_header(&header, &lines)?;

        let txn = begin_write(&self.db_pool, "create_delivery_challan").await?;
        let result = Self::create_in_txn(txn.conn(), &header, &lines).await;
        let document = finish_write(txn, result).await?;

        info!(
            dc_number = %document.header.dc_number,
            lines = document.items.len(),
            "delivery challan created"
        );
        self.event_sender
            .send_or_log(Event::DeliveryChallanCreated {
                dc_number: document.header.dc_number.clone(),
                po_number: document.header.po_number,
                total_quantity: document.total_quantity(),
            })
            .await;

        Ok(document)
    }

    async fn create_in_txn<C: ConnectionTrait>(
        conn: &C,
        header: &DeliveryChallanHeader,
        lines: &[DispatchLine],
    ) -> Result<DeliveryChallanDocument, ServiceError> {
        let resolved =
            validation::validate_dispatch_lines(conn, header.po_number, lines, None).await?;

        let dc_number = match header.dc_number.as_deref().map(str::trim) {
            Some(number) => {
                if DeliveryChallan::find_by_id(number.to_string())
                    .one(conn)
                    .await?
                    .is_some()
                {
                    return Err(ServiceError::violation(
                        ViolationKind::DuplicateDCNumber,
                        format!("DC number {} already exists", number),
                    ));
                }
                number.to_string()
            }
            None => numbering::next_dc_number(conn, header.po_number).await?,
        };

        let dc_date = header
            .dc_date
            .ok_or_else(|| ServiceError::validation("DC date is required"))?;
        let now = Utc::now();
        let model = delivery_challan::ActiveModel {
            dc_number: Set(dc_number.clone()),
            po_number: Set(header.po_number),
            dc_date: Set(dc_date),
            consignee_name: Set(header.consignee_name.clone()),
            consignee_gstin: Set(header.consignee_gstin.clone()),
            consignee_address: Set(header.consignee_address.clone()),
            vehicle_number: Set(header.vehicle_number.clone()),
            transporter: Set(header.transporter.clone()),
            lr_number: Set(header.lr_number.clone()),
            eway_bill_number: Set(header.eway_bill_number.clone()),
            remarks: Set(header.remarks.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(conn)
        .await?;

        let items = insert_items(conn, &dc_number, &resolved).await?;

        Ok(DeliveryChallanDocument {
            header: model,
            items,
            invoice_number: None,
        })
    }

    /// Replaces the header and all items of an open DC.
    #[instrument(skip(self, header, lines))]
    pub async fn update(
        &self,
        dc_number: &str,
        header: DeliveryChallanHeader,
        lines: Vec<DispatchLine>,
    ) -> Result<DeliveryChallanDocument, ServiceError> {
        let txn = begin_write(&self.db_pool, "update_delivery_challan").await?;
        let result = Self::update_in_txn(txn.conn(), dc_number, &header, &lines).await;
        let document = finish_write(txn, result).await?;

        info!(
            dc_number = %document.header.dc_number,
            lines = document.items.len(),
            "delivery challan updated"
        );
        self.event_sender
            .send_or_log(Event::DeliveryChallanUpdated {
                dc_number: document.header.dc_number.clone(),
                po_number: document.header.po_number,
                total_quantity: document.total_quantity(),
            })
            .await;

        Ok(document)
    }

    async fn update_in_txn<C: ConnectionTrait>(
        conn: &C,
        dc_number: &str,
        header: &DeliveryChallanHeader,
        lines: &[DispatchLine],
    ) -> Result<DeliveryChallanDocument, ServiceError> {
        let existing = find_dc(conn, dc_number).await?;
        validation::ensure_dc_editable(conn, dc_number).await?;

        validation::validate_dc_header(header, lines)?;
        if header
            .dc_number
            .as_deref()
            .map_or(false, |n| n.trim() != dc_number)
        {
            return Err(ServiceError::validation("DC number cannot be changed"));
        }
        if header.po_number != existing.po_number {
            return Err(ServiceError::validation(format!(
                "DC {} belongs to PO {} and cannot be moved",
                dc_number, existing.po_number
            )));
        }

        let resolved = validation::validate_dispatch_lines(
            conn,
            existing.po_number,
            lines,
            Some(dc_number),
        )
        .await?;

        let mut model: delivery_challan::ActiveModel = existing.into();
        if let Some(date) = header.dc_date {
            model.dc_date = Set(date);
        }
        model.consignee_name = Set(header.consignee_name.clone());
        model.consignee_gstin = Set(header.consignee_gstin.clone());
        model.consignee_address = Set(header.consignee_address.clone());
        model.vehicle_number = Set(header.vehicle_number.clone());
        model.transporter = Set(header.transporter.clone());
        model.lr_number = Set(header.lr_number.clone());
        model.eway_bill_number = Set(header.eway_bill_number.clone());
        model.remarks = Set(header.remarks.clone());
        model.updated_at = Set(Utc::now());
        let model = model.update(conn).await?;

        DeliveryChallanItem::delete_many()
            .filter(delivery_challan_item::Column::DcNumber.eq(dc_number))
            .exec(conn)
            .await?;
        let items = insert_items(conn, dc_number, &resolved).await?;

        Ok(DeliveryChallanDocument {
            header: model,
            items,
            invoice_number: None,
        })
    }

    /// Removes an open DC and its items.
    #[instrument(skip(self))]
    pub async fn delete(&self, dc_number: &str) -> Result<(), ServiceError> {
        let txn = begin_write(&self.db_pool, "delete_delivery_challan").await?;
        let result = Self::delete_in_txn(txn.conn(), dc_number).await;
        let po_number = finish_write(txn, result).await?;

        info!(dc_number, po_number, "delivery challan deleted");
        self.event_sender
            .send_or_log(Event::DeliveryChallanDeleted {
                dc_number: dc_number.to_string(),
                po_number,
            })
            .await;

        Ok(())
    }

    async fn delete_in_txn<C: ConnectionTrait>(
        conn: &C,
        dc_number: &str,
    ) -> Result<i64, ServiceError> {
        let existing = find_dc(conn, dc_number).await?;
        validation::ensure_dc_editable(conn, dc_number).await?;

        // The FK cascades too, but only when the connection enforces foreign keys.
        DeliveryChallanItem::delete_many()
            .filter(delivery_challan_item::Column::DcNumber.eq(dc_number))
            .exec(conn)
            .await?;
        DeliveryChallan::delete_by_id(dc_number.to_string())
            .exec(conn)
            .await?;

        Ok(existing.po_number)
    }

    /// Header, items and invoice state of one DC.
    pub async fn get(&self, dc_number: &str) -> Result<DeliveryChallanDocument, ServiceError> {
        let db = self.db_pool.as_ref();
        let header = find_dc(db, dc_number).await?;
        load_document(db, header).await
    }

    /// All DCs raised against a PO, in DC number order.
    pub async fn list_for_po(
        &self,
        po_number: i64,
    ) -> Result<Vec<DeliveryChallanDocument>, ServiceError> {
        let db = self.db_pool.as_ref();
        let headers = DeliveryChallan::find()
            .filter(delivery_challan::Column::PoNumber.eq(po_number))
            .order_by_asc(delivery_challan::Column::DcNumber)
            .all(db)
            .await?;

        let mut documents = Vec::with_capacity(headers.len());
        for header in headers {
            documents.push(load_document(db, header).await?);
        }
        Ok(documents)
    }
}

async fn find_dc<C: ConnectionTrait>(
    conn: &C,
    dc_number: &str,
) -> Result<delivery_challan::Model, ServiceError> {
    DeliveryChallan::find_by_id(dc_number.to_string())
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::not_found(format!("DC {} not found", dc_number)))
}

async fn load_document<C: ConnectionTrait>(
    conn: &C,
    header: delivery_challan::Model,
) -> Result<DeliveryChallanDocument, ServiceError> {
    let items = DeliveryChallanItem::find()
        .filter(delivery_challan_item::Column::DcNumber.eq(header.dc_number.as_str()))
        .order_by_asc(delivery_challan_item::Column::Id)
        .all(conn)
        .await?;
    let invoice_number = validation::find_invoice_link(conn, &header.dc_number)
        .await?
        .map(|link| link.invoice_number);

    Ok(DeliveryChallanDocument {
        header,
        items,
        invoice_number,
    })
}

async fn insert_items<C: ConnectionTrait>(
    conn: &C,
    dc_number: &str,
    resolved: &[ResolvedLine],
) -> Result<Vec<delivery_challan_item::Model>, ServiceError> {
    let rows = resolved.iter().map(|r| delivery_challan_item::ActiveModel {
        dc_number: Set(dc_number.to_string()),
        po_item_id: Set(r.item.id),
        po_item_no: Set(r.item.po_item_no),
        lot_no: Set(r.line.lot_no),
        description: Set(r
            .line
            .description
            .clone()
            .or_else(|| r.item.description.clone())),
        dispatch_quantity: Set(r.line.dispatch_quantity),
        ..Default::default()
    });
    DeliveryChallanItem::insert_many(rows).exec(conn).await?;

    Ok(DeliveryChallanItem::find()
        .filter(delivery_challan_item::Column::DcNumber.eq(dc_number))
        .order_by_asc(delivery_challan_item::Column::Id)
        .all(conn)
        .await?)
}
