use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Join row whose existence marks a DC as invoiced.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "invoice_dc_links")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub invoice_number: String,
    #[sea_orm(unique)]
    pub dc_number: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::delivery_challan::Entity",
        from = "Column::DcNumber",
        to = "super::delivery_challan::Column::DcNumber"
    )]
    DeliveryChallan,
    #[sea_orm(
        belongs_to = "super::gst_invoice::Entity",
        from = "Column::InvoiceNumber",
        to = "super::gst_invoice::Column::InvoiceNumber"
    )]
    Invoice,
}

impl Related<super::delivery_challan::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DeliveryChallan.def()
    }
}

impl Related<super::gst_invoice::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Invoice.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
