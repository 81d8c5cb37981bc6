use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "delivery_challan_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub dc_number: String,
    pub po_item_id: i64,
    pub po_item_no: i32,
    pub lot_no: Option<i32>,
    pub description: Option<String>,
    pub dispatch_quantity: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::delivery_challan::Entity",
        from = "Column::DcNumber",
        to = "super::delivery_challan::Column::DcNumber",
        on_delete = "Cascade"
    )]
    DeliveryChallan,
    #[sea_orm(
        belongs_to = "super::purchase_order_item::Entity",
        from = "Column::PoItemId",
        to = "super::purchase_order_item::Column::Id"
    )]
    PurchaseOrderItem,
}

impl Related<super::delivery_challan::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DeliveryChallan.def()
    }
}

impl Related<super::purchase_order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseOrderItem.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
