use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Dispatch record against a PO. There is no status column: a DC is frozen
/// exactly when an `invoice_dc_links` row references it.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "delivery_challans")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub dc_number: String,
    pub po_number: i64,
    pub dc_date: NaiveDate,
    pub consignee_name: Option<String>,
    pub consignee_gstin: Option<String>,
    pub consignee_address: Option<String>,
    pub vehicle_number: Option<String>,
    pub transporter: Option<String>,
    pub lr_number: Option<String>,
    pub eway_bill_number: Option<String>,
    pub remarks: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::purchase_order::Entity",
        from = "Column::PoNumber",
        to = "super::purchase_order::Column::PoNumber"
    )]
    PurchaseOrder,
    #[sea_orm(has_many = "super::delivery_challan_item::Entity")]
    Items,
    #[sea_orm(has_one = "super::invoice_dc_link::Entity")]
    InvoiceLink,
}

impl Related<super::purchase_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseOrder.def()
    }
}

impl Related<super::delivery_challan_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl Related<super::invoice_dc_link::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InvoiceLink.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
