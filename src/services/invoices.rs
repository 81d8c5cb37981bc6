use crate::{
    db::{begin_write, finish_write, DbPool},
    entities::{
        delivery_challan_item,
        gst_invoice::{self, Entity as GstInvoice},
        gst_invoice_item::{self, Entity as GstInvoiceItem},
        invoice_dc_link,
        purchase_order_item::{self, Entity as PurchaseOrderItem},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{
        numbering,
        tax::{self, InvoiceTotals, LineTax, TaxRates},
        validation,
    },
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{entity::prelude::*, ConnectionTrait, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::Arc};
use tracing::{info, instrument};

/// Replaces quantity and/or rate on the DC line carrying `lot_no`. When
/// `po_item_no` is given the override only applies to that item's lot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceLineOverride {
    pub lot_no: i32,
    #[serde(default)]
    pub po_item_no: Option<i32>,
    #[serde(default)]
    pub quantity: Option<Decimal>,
    #[serde(default)]
    pub rate: Option<Decimal>,
}

impl InvoiceLineOverride {
    fn applies_to(&self, line: &delivery_challan_item::Model) -> bool {
        line.lot_no == Some(self.lot_no)
            && self.po_item_no.map_or(true, |no| no == line.po_item_no)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInvoiceRequest {
    /// Allocated from the financial year counter when absent.
    #[serde(default)]
    pub invoice_number: Option<String>,
    pub dc_number: String,
    pub invoice_date: Option<NaiveDate>,
    pub buyer_name: Option<String>,
    #[serde(default)]
    pub buyer_gstin: Option<String>,
    #[serde(default)]
    pub buyer_address: Option<String>,
    #[serde(default)]
    pub place_of_supply: Option<String>,
    #[serde(default)]
    pub overrides: Vec<InvoiceLineOverride>,
}

/// An invoice as handed to document renderers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceDocument {
    #[serde(flatten)]
    pub header: gst_invoice::Model,
    pub items: Vec<gst_invoice_item::Model>,
}

/// A DC line priced for billing, before it is stored.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedLine {
    pub source: delivery_challan_item::Model,
    pub hsn_code: Option<String>,
    pub description: Option<String>,
    pub quantity: Decimal,
    pub rate: Decimal,
    pub tax: LineTax,
}

/// Prices every DC line from the PO rate, applying overrides first.
pub fn project_lines(
    dc_items: &[delivery_challan_item::Model],
    po_items: &HashMap<i64, purchase_order_item::Model>,
    overrides: &[InvoiceLineOverride],
    rates: TaxRates,
) -> Result<Vec<ProjectedLine>, ServiceError> {
    for o in overrides {
        if !dc_items.iter().any(|line| o.applies_to(line)) {
            return Err(ServiceError::validation(format!(
                "Override for lot {} does not match any DC line",
                o.lot_no
            )));
        }
    }

    dc_items
        .iter()
        .map(|line| {
            let po_item = po_items.get(&line.po_item_id).ok_or_else(|| {
                ServiceError::not_found(format!("PO item {} not found", line.po_item_id))
            })?;
            let o = overrides.iter().find(|o| o.applies_to(line));
            let quantity = o
                .and_then(|o| o.quantity)
                .unwrap_or(line.dispatch_quantity);
            let rate = o.and_then(|o| o.rate).unwrap_or(po_item.rate);

            Ok(ProjectedLine {
                source: line.clone(),
                hsn_code: po_item.hsn_code.clone(),
                description: line
                    .description
                    .clone()
                    .or_else(|| po_item.description.clone()),
                quantity,
                rate,
                tax: tax::compute_line(quantity, rate, rates),
            })
        })
        .collect()
}

pub struct InvoiceService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    rates: TaxRates,
}

impl InvoiceService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>, rates: TaxRates) -> Self {
        Self {
            db_pool,
            event_sender,
            rates,
        }
    }

    /// Bills one DC. The link row written here freezes the DC.
    #[instrument(skip(self, request), fields(dc_number = %request.dc_number))]
    pub async fn create(
        &self,
        request: CreateInvoiceRequest,
    ) -> Result<InvoiceDocument, ServiceError> {
        validation::validate_invoice_header(&request)?;

        let txn = begin_write(&self.db_pool, "create_invoice").await?;
        let today = Utc::now().date_naive();
        let result = Self::create_in_txn(txn.conn(), &request, self.rates, today).await;
        let document = finish_write(txn, result).await?;

        info!(
            invoice_number = %document.header.invoice_number,
            total_amount = %document.header.total_amount,
            "invoice created"
        );
        self.event_sender
            .send_or_log(Event::InvoiceCreated {
                invoice_number: document.header.invoice_number.clone(),
                dc_number: document.header.dc_number.clone(),
                total_amount: document.header.total_amount,
            })
            .await;

        Ok(document)
    }

    async fn create_in_txn<C: ConnectionTrait>(
        conn: &C,
        request: &CreateInvoiceRequest,
        rates: TaxRates,
        today: NaiveDate,
    ) -> Result<InvoiceDocument, ServiceError> {
        let supplied_number = request.invoice_number.as_deref().map(str::trim);
        let source =
            validation::check_invoice_source(conn, request.dc_number.trim(), supplied_number)
                .await?;

        let po_item_ids: Vec<i64> = source.items.iter().map(|i| i.po_item_id).collect();
        let po_items: HashMap<i64, purchase_order_item::Model> = PurchaseOrderItem::find()
            .filter(purchase_order_item::Column::Id.is_in(po_item_ids))
            .all(conn)
            .await?
            .into_iter()
            .map(|item| (item.id, item))
            .collect();

        let lines = project_lines(&source.items, &po_items, &request.overrides, rates)?;
        let totals = InvoiceTotals::from_lines(lines.iter().map(|l| &l.tax));

        let invoice_number = match supplied_number {
            Some(number) => number.to_string(),
            None => numbering::next_invoice_number(conn, today).await?,
        };
        let invoice_date = request
            .invoice_date
            .ok_or_else(|| ServiceError::validation("Invoice date is required"))?;
        let buyer_name = request
            .buyer_name
            .clone()
            .ok_or_else(|| ServiceError::validation("Buyer name is required"))?;
        let now = Utc::now();

        let header = gst_invoice::ActiveModel {
            invoice_number: Set(invoice_number.clone()),
            dc_number: Set(source.dc.dc_number.clone()),
            invoice_date: Set(invoice_date),
            buyer_name: Set(buyer_name),
            buyer_gstin: Set(request.buyer_gstin.clone()),
            buyer_address: Set(request.buyer_address.clone()),
            place_of_supply: Set(request.place_of_supply.clone()),
            taxable_value: Set(totals.taxable_value),
            cgst_amount: Set(totals.cgst_amount),
            sgst_amount: Set(totals.sgst_amount),
            total_amount: Set(totals.total_amount),
            created_at: Set(now),
        }
        .insert(conn)
        .await?;

        let rows = lines.iter().map(|line| gst_invoice_item::ActiveModel {
            invoice_number: Set(invoice_number.clone()),
            po_item_id: Set(line.source.po_item_id),
            po_item_no: Set(line.source.po_item_no),
            lot_no: Set(line.source.lot_no),
            description: Set(line.description.clone()),
            hsn_code: Set(line.hsn_code.clone()),
            quantity: Set(line.quantity),
            rate: Set(line.rate),
            taxable_value: Set(line.tax.taxable_value),
            cgst_rate: Set(rates.cgst_pct),
            cgst_amount: Set(line.tax.cgst_amount),
            sgst_rate: Set(rates.sgst_pct),
            sgst_amount: Set(line.tax.sgst_amount),
            line_total: Set(line.tax.line_total),
            ..Default::default()
        });
        GstInvoiceItem::insert_many(rows).exec(conn).await?;

        invoice_dc_link::ActiveModel {
            invoice_number: Set(invoice_number.clone()),
            dc_number: Set(source.dc.dc_number.clone()),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(conn)
        .await?;

        let items = GstInvoiceItem::find()
            .filter(gst_invoice_item::Column::InvoiceNumber.eq(invoice_number.as_str()))
            .order_by_asc(gst_invoice_item::Column::Id)
            .all(conn)
            .await?;

        // Return the computed totals rather than the values read back through
        // the REAL column.
        let mut header = header;
        header.taxable_value = totals.taxable_value;
        header.cgst_amount = totals.cgst_amount;
        header.sgst_amount = totals.sgst_amount;
        header.total_amount = totals.total_amount;

        Ok(InvoiceDocument {
            header,
            items: items.into_iter().map(round_item).collect(),
        })
    }

    pub async fn get(&self, invoice_number: &str) -> Result<InvoiceDocument, ServiceError> {
        let db = self.db_pool.as_ref();
        let header = GstInvoice::find_by_id(invoice_number.to_string())
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::not_found(format!("Invoice {} not found", invoice_number))
            })?;
        let items = GstInvoiceItem::find()
            .filter(gst_invoice_item::Column::InvoiceNumber.eq(invoice_number))
            .order_by_asc(gst_invoice_item::Column::Id)
            .all(db)
            .await?;

        Ok(InvoiceDocument {
            header: round_header(header),
            items: items.into_iter().map(round_item).collect(),
        })
    }
}

fn round_header(mut header: gst_invoice::Model) -> gst_invoice::Model {
    header.taxable_value = tax::round2(header.taxable_value);
    header.cgst_amount = tax::round2(header.cgst_amount);
    header.sgst_amount = tax::round2(header.sgst_amount);
    header.total_amount = tax::round2(header.total_amount);
    header
}

fn round_item(mut item: gst_invoice_item::Model) -> gst_invoice_item::Model {
    item.taxable_value = tax::round2(item.taxable_value);
    item.cgst_amount = tax::round2(item.cgst_amount);
    item.sgst_amount = tax::round2(item.sgst_amount);
    item.line_total = tax::round2(item.line_total);
    item
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn dc_line(
        id: i64,
        po_item_id: i64,
        lot_no: Option<i32>,
        qty: Decimal,
    ) -> delivery_challan_item::Model {
        delivery_challan_item::Model {
            id,
            dc_number: "4500-DC-01".into(),
            po_item_id,
            po_item_no: po_item_id as i32 * 10,
            lot_no,
            description: None,
            dispatch_quantity: qty,
        }
    }

    fn po_items() -> HashMap<i64, purchase_order_item::Model> {
        [(1, dec!(100)), (2, dec!(12.5))]
            .into_iter()
            .map(|(id, rate)| {
                (
                    id,
                    purchase_order_item::Model {
                        id,
                        po_number: 4500,
                        po_item_no: id as i32 * 10,
                        material_code: None,
                        description: Some(format!("Item {}", id)),
                        unit: Some("NOS".into()),
                        hsn_code: Some("8537".into()),
                        rate,
                        ordered_quantity: dec!(1000),
                    },
                )
            })
            .collect()
    }

    #[test]
    fn projects_dc_quantity_at_po_rate() {
        let lines = project_lines(
            &[dc_line(1, 1, None, dec!(30)), dc_line(2, 2, Some(1), dec!(8))],
            &po_items(),
            &[],
            TaxRates::default(),
        )
        .unwrap();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].tax.taxable_value, dec!(3000));
        assert_eq!(lines[0].description.as_deref(), Some("Item 1"));
        assert_eq!(lines[1].tax.taxable_value, dec!(100));
        assert_eq!(lines[1].hsn_code.as_deref(), Some("8537"));
    }

    #[test]
    fn override_replaces_quantity_and_rate_of_matching_lot() {
        let overrides = [InvoiceLineOverride {
            lot_no: 1,
            po_item_no: None,
            quantity: Some(dec!(6)),
            rate: Some(dec!(10)),
        }];
        let lines = project_lines(
            &[dc_line(1, 1, None, dec!(30)), dc_line(2, 2, Some(1), dec!(8))],
            &po_items(),
            &overrides,
            TaxRates::default(),
        )
        .unwrap();

        assert_eq!(lines[0].quantity, dec!(30));
        assert_eq!(lines[1].quantity, dec!(6));
        assert_eq!(lines[1].rate, dec!(10));
        assert_eq!(lines[1].tax.taxable_value, dec!(60));
        assert_eq!(lines[1].tax.cgst_amount, dec!(5.40));
    }

    #[test]
    fn unmatched_override_is_rejected() {
        let overrides = [InvoiceLineOverride {
            lot_no: 9,
            po_item_no: None,
            quantity: Some(dec!(1)),
            rate: None,
        }];
        let err = project_lines(
            &[dc_line(1, 1, Some(1), dec!(30))],
            &po_items(),
            &overrides,
            TaxRates::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ServiceError::ValidationError(_)));
    }
}
