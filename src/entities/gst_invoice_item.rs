use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "gst_invoice_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub invoice_number: String,
    pub po_item_id: i64,
    pub po_item_no: i32,
    pub lot_no: Option<i32>,
    pub description: Option<String>,
    pub hsn_code: Option<String>,
    pub quantity: Decimal,
    pub rate: Decimal,
    pub taxable_value: Decimal,
    pub cgst_rate: Decimal,
    pub cgst_amount: Decimal,
    pub sgst_rate: Decimal,
    pub sgst_amount: Decimal,
    pub line_total: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::gst_invoice::Entity",
        from = "Column::InvoiceNumber",
        to = "super::gst_invoice::Column::InvoiceNumber",
        on_delete = "Cascade"
    )]
    Invoice,
}

impl Related<super::gst_invoice::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Invoice.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
