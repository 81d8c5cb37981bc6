use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "srv_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub srv_number: String,
    pub po_item_no: i32,
    pub lot_no: Option<i32>,
    pub received_quantity: Decimal,
    pub accepted_quantity: Decimal,
    pub rejected_quantity: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::srv::Entity",
        from = "Column::SrvNumber",
        to = "super::srv::Column::SrvNumber",
        on_delete = "Cascade"
    )]
    Srv,
}

impl Related<super::srv::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Srv.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
