use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One ordered line of a purchase order. `ordered_quantity` is owned by
/// ingestion; dispatch and billing flows only read it.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "purchase_order_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub po_number: i64,
    pub po_item_no: i32,
    pub material_code: Option<String>,
    pub description: Option<String>,
    pub unit: Option<String>,
    pub hsn_code: Option<String>,
    pub rate: Decimal,
    pub ordered_quantity: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::purchase_order::Entity",
        from = "Column::PoNumber",
        to = "super::purchase_order::Column::PoNumber"
    )]
    PurchaseOrder,
    #[sea_orm(has_many = "super::purchase_order_lot::Entity")]
    Lots,
    #[sea_orm(has_many = "super::delivery_challan_item::Entity")]
    DeliveryChallanItems,
}

impl Related<super::purchase_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseOrder.def()
    }
}

impl Related<super::purchase_order_lot::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lots.def()
    }
}

impl Related<super::delivery_challan_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DeliveryChallanItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
