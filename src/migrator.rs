use sea_orm_migration::prelude::*;

/// Schema for the fulfillment ledger.
///
/// On SQLite `decimal()` columns get REAL affinity, so quantities and money
/// keep roughly 15 significant digits across a round trip. Three-decimal
/// quantities and two-decimal amounts fit well inside that; values such as
/// `12345678901234.567` come back rounded.
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240401_000001_create_purchase_order_tables::Migration),
            Box::new(m20240401_000002_create_delivery_challan_tables::Migration),
            Box::new(m20240401_000003_create_invoice_tables::Migration),
            Box::new(m20240401_000004_create_srv_tables::Migration),
            Box::new(m20240401_000005_create_control_tables::Migration),
        ]
    }
}

mod m20240401_000001_create_purchase_order_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240401_000001_create_purchase_order_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(PurchaseOrders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PurchaseOrders::PoNumber)
                                .big_integer()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(PurchaseOrders::PoDate).date().null())
                        .col(ColumnDef::new(PurchaseOrders::SupplierName).string().null())
                        .col(ColumnDef::new(PurchaseOrders::SupplierCode).string().null())
                        .col(ColumnDef::new(PurchaseOrders::BuyerName).string().null())
                        .col(ColumnDef::new(PurchaseOrders::BuyerGstin).string().null())
                        .col(ColumnDef::new(PurchaseOrders::Department).string().null())
                        .col(ColumnDef::new(PurchaseOrders::PoValue).decimal().null())
                        .col(ColumnDef::new(PurchaseOrders::Currency).string().null())
                        .col(ColumnDef::new(PurchaseOrders::ExchangeRate).decimal().null())
                        .col(ColumnDef::new(PurchaseOrders::Status).string().null())
                        .col(
                            ColumnDef::new(PurchaseOrders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrders::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PurchaseOrderItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PurchaseOrderItems::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderItems::PoNumber)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderItems::PoItemNo)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PurchaseOrderItems::MaterialCode).string().null())
                        .col(ColumnDef::new(PurchaseOrderItems::Description).string().null())
                        .col(ColumnDef::new(PurchaseOrderItems::Unit).string().null())
                        .col(ColumnDef::new(PurchaseOrderItems::HsnCode).string().null())
                        .col(
                            ColumnDef::new(PurchaseOrderItems::Rate)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderItems::OrderedQuantity)
                                .decimal()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_po_items_po_number")
                                .from(PurchaseOrderItems::Table, PurchaseOrderItems::PoNumber)
                                .to(PurchaseOrders::Table, PurchaseOrders::PoNumber)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("ux_po_items_po_number_item_no")
                        .table(PurchaseOrderItems::Table)
                        .col(PurchaseOrderItems::PoNumber)
                        .col(PurchaseOrderItems::PoItemNo)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PurchaseOrderLots::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PurchaseOrderLots::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderLots::PoItemId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PurchaseOrderLots::LotNo).integer().not_null())
                        .col(
                            ColumnDef::new(PurchaseOrderLots::ScheduledQuantity)
                                .decimal()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PurchaseOrderLots::DeliveryDate).date().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_po_lots_po_item")
                                .from(PurchaseOrderLots::Table, PurchaseOrderLots::PoItemId)
                                .to(PurchaseOrderItems::Table, PurchaseOrderItems::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("ux_po_lots_item_lot_no")
                        .table(PurchaseOrderLots::Table)
                        .col(PurchaseOrderLots::PoItemId)
                        .col(PurchaseOrderLots::LotNo)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(PurchaseOrderLots::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(PurchaseOrderItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(PurchaseOrders::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum PurchaseOrders {
        Table,
        PoNumber,
        PoDate,
        SupplierName,
        SupplierCode,
        BuyerName,
        BuyerGstin,
        Department,
        PoValue,
        Currency,
        ExchangeRate,
        Status,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum PurchaseOrderItems {
        Table,
        Id,
        PoNumber,
        PoItemNo,
        MaterialCode,
        Description,
        Unit,
        HsnCode,
        Rate,
        OrderedQuantity,
    }

    #[derive(DeriveIden)]
    pub(super) enum PurchaseOrderLots {
        Table,
        Id,
        PoItemId,
        LotNo,
        ScheduledQuantity,
        DeliveryDate,
    }
}

mod m20240401_000002_create_delivery_challan_tables {
    use super::m20240401_000001_create_purchase_order_tables::{
        PurchaseOrderItems, PurchaseOrders,
    };
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240401_000002_create_delivery_challan_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(DeliveryChallans::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(DeliveryChallans::DcNumber)
                                .string()
                                .not_null()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(DeliveryChallans::PoNumber)
                                .big_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(DeliveryChallans::DcDate).date().not_null())
                        .col(ColumnDef::new(DeliveryChallans::ConsigneeName).string().null())
                        .col(ColumnDef::new(DeliveryChallans::ConsigneeGstin).string().null())
                        .col(ColumnDef::new(DeliveryChallans::ConsigneeAddress).string().null())
                        .col(ColumnDef::new(DeliveryChallans::VehicleNumber).string().null())
                        .col(ColumnDef::new(DeliveryChallans::Transporter).string().null())
                        .col(ColumnDef::new(DeliveryChallans::LrNumber).string().null())
                        .col(ColumnDef::new(DeliveryChallans::EwayBillNumber).string().null())
                        .col(ColumnDef::new(DeliveryChallans::Remarks).string().null())
                        .col(
                            ColumnDef::new(DeliveryChallans::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DeliveryChallans::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_dcs_po_number")
                                .from(DeliveryChallans::Table, DeliveryChallans::PoNumber)
                                .to(PurchaseOrders::Table, PurchaseOrders::PoNumber),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_dcs_po_number")
                        .table(DeliveryChallans::Table)
                        .col(DeliveryChallans::PoNumber)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(DeliveryChallanItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(DeliveryChallanItems::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(DeliveryChallanItems::DcNumber)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DeliveryChallanItems::PoItemId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DeliveryChallanItems::PoItemNo)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(DeliveryChallanItems::LotNo).integer().null())
                        .col(ColumnDef::new(DeliveryChallanItems::Description).string().null())
                        .col(
                            ColumnDef::new(DeliveryChallanItems::DispatchQuantity)
                                .decimal()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_dc_items_dc_number")
                                .from(DeliveryChallanItems::Table, DeliveryChallanItems::DcNumber)
                                .to(DeliveryChallans::Table, DeliveryChallans::DcNumber)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_dc_items_po_item")
                                .from(DeliveryChallanItems::Table, DeliveryChallanItems::PoItemId)
                                .to(PurchaseOrderItems::Table, PurchaseOrderItems::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_dc_items_po_item_id")
                        .table(DeliveryChallanItems::Table)
                        .col(DeliveryChallanItems::PoItemId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(DeliveryChallanItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(DeliveryChallans::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum DeliveryChallans {
        Table,
        DcNumber,
        PoNumber,
        DcDate,
        ConsigneeName,
        ConsigneeGstin,
        ConsigneeAddress,
        VehicleNumber,
        Transporter,
        LrNumber,
        EwayBillNumber,
        Remarks,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum DeliveryChallanItems {
        Table,
        Id,
        DcNumber,
        PoItemId,
        PoItemNo,
        LotNo,
        Description,
        DispatchQuantity,
    }
}

mod m20240401_000003_create_invoice_tables {
    use super::m20240401_000002_create_delivery_challan_tables::DeliveryChallans;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240401_000003_create_invoice_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(GstInvoices::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(GstInvoices::InvoiceNumber)
                                .string()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(GstInvoices::DcNumber).string().not_null())
                        .col(ColumnDef::new(GstInvoices::InvoiceDate).date().not_null())
                        .col(ColumnDef::new(GstInvoices::BuyerName).string().not_null())
                        .col(ColumnDef::new(GstInvoices::BuyerGstin).string().null())
                        .col(ColumnDef::new(GstInvoices::BuyerAddress).string().null())
                        .col(ColumnDef::new(GstInvoices::PlaceOfSupply).string().null())
                        .col(ColumnDef::new(GstInvoices::TaxableValue).decimal().not_null())
                        .col(ColumnDef::new(GstInvoices::CgstAmount).decimal().not_null())
                        .col(ColumnDef::new(GstInvoices::SgstAmount).decimal().not_null())
                        .col(ColumnDef::new(GstInvoices::TotalAmount).decimal().not_null())
                        .col(
                            ColumnDef::new(GstInvoices::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_invoices_dc_number")
                                .from(GstInvoices::Table, GstInvoices::DcNumber)
                                .to(DeliveryChallans::Table, DeliveryChallans::DcNumber),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(GstInvoiceItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(GstInvoiceItems::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(GstInvoiceItems::InvoiceNumber).string().not_null())
                        .col(ColumnDef::new(GstInvoiceItems::PoItemId).big_integer().not_null())
                        .col(ColumnDef::new(GstInvoiceItems::PoItemNo).integer().not_null())
                        .col(ColumnDef::new(GstInvoiceItems::LotNo).integer().null())
                        .col(ColumnDef::new(GstInvoiceItems::Description).string().null())
                        .col(ColumnDef::new(GstInvoiceItems::HsnCode).string().null())
                        .col(ColumnDef::new(GstInvoiceItems::Quantity).decimal().not_null())
                        .col(ColumnDef::new(GstInvoiceItems::Rate).decimal().not_null())
                        .col(ColumnDef::new(GstInvoiceItems::TaxableValue).decimal().not_null())
                        .col(ColumnDef::new(GstInvoiceItems::CgstRate).decimal().not_null())
                        .col(ColumnDef::new(GstInvoiceItems::CgstAmount).decimal().not_null())
                        .col(ColumnDef::new(GstInvoiceItems::SgstRate).decimal().not_null())
                        .col(ColumnDef::new(GstInvoiceItems::SgstAmount).decimal().not_null())
                        .col(ColumnDef::new(GstInvoiceItems::LineTotal).decimal().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_invoice_items_invoice_number")
                                .from(GstInvoiceItems::Table, GstInvoiceItems::InvoiceNumber)
                                .to(GstInvoices::Table, GstInvoices::InvoiceNumber)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(InvoiceDcLinks::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InvoiceDcLinks::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(InvoiceDcLinks::InvoiceNumber).string().not_null())
                        .col(ColumnDef::new(InvoiceDcLinks::DcNumber).string().not_null())
                        .col(
                            ColumnDef::new(InvoiceDcLinks::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_invoice_dc_links_invoice")
                                .from(InvoiceDcLinks::Table, InvoiceDcLinks::InvoiceNumber)
                                .to(GstInvoices::Table, GstInvoices::InvoiceNumber),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_invoice_dc_links_dc")
                                .from(InvoiceDcLinks::Table, InvoiceDcLinks::DcNumber)
                                .to(DeliveryChallans::Table, DeliveryChallans::DcNumber),
                        )
                        .to_owned(),
                )
                .await?;

            // One invoice per DC.
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("ux_invoice_dc_links_dc_number")
                        .table(InvoiceDcLinks::Table)
                        .col(InvoiceDcLinks::DcNumber)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(InvoiceDcLinks::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(GstInvoiceItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(GstInvoices::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum GstInvoices {
        Table,
        InvoiceNumber,
        DcNumber,
        InvoiceDate,
        BuyerName,
        BuyerGstin,
        BuyerAddress,
        PlaceOfSupply,
        TaxableValue,
        CgstAmount,
        SgstAmount,
        TotalAmount,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum GstInvoiceItems {
        Table,
        Id,
        InvoiceNumber,
        PoItemId,
        PoItemNo,
        LotNo,
        Description,
        HsnCode,
        Quantity,
        Rate,
        TaxableValue,
        CgstRate,
        CgstAmount,
        SgstRate,
        SgstAmount,
        LineTotal,
    }

    #[derive(DeriveIden)]
    enum InvoiceDcLinks {
        Table,
        Id,
        InvoiceNumber,
        DcNumber,
        CreatedAt,
    }
}

mod m20240401_000004_create_srv_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240401_000004_create_srv_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // No foreign key to purchase_orders: SRVs may arrive before their PO.
            manager
                .create_table(
                    Table::create()
                        .table(Srvs::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Srvs::SrvNumber)
                                .string()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Srvs::PoNumber).big_integer().not_null())
                        .col(ColumnDef::new(Srvs::SrvDate).date().not_null())
                        .col(ColumnDef::new(Srvs::ReceivedBy).string().null())
                        .col(
                            ColumnDef::new(Srvs::PoFound)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Srvs::Status)
                                .string()
                                .not_null()
                                .default("active"),
                        )
                        .col(
                            ColumnDef::new(Srvs::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Srvs::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_srvs_po_number")
                        .table(Srvs::Table)
                        .col(Srvs::PoNumber)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(SrvItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(SrvItems::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(SrvItems::SrvNumber).string().not_null())
                        .col(ColumnDef::new(SrvItems::PoItemNo).integer().not_null())
                        .col(ColumnDef::new(SrvItems::LotNo).integer().null())
                        .col(ColumnDef::new(SrvItems::ReceivedQuantity).decimal().not_null())
                        .col(ColumnDef::new(SrvItems::AcceptedQuantity).decimal().not_null())
                        .col(ColumnDef::new(SrvItems::RejectedQuantity).decimal().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_srv_items_srv_number")
                                .from(SrvItems::Table, SrvItems::SrvNumber)
                                .to(Srvs::Table, Srvs::SrvNumber)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(SrvItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Srvs::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Srvs {
        Table,
        SrvNumber,
        PoNumber,
        SrvDate,
        ReceivedBy,
        PoFound,
        Status,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum SrvItems {
        Table,
        Id,
        SrvNumber,
        PoItemNo,
        LotNo,
        ReceivedQuantity,
        AcceptedQuantity,
        RejectedQuantity,
    }
}

mod m20240401_000005_create_control_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240401_000005_create_control_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(DocumentSequences::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(DocumentSequences::SequenceKey)
                                .string()
                                .not_null()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(DocumentSequences::LastValue)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(WriteLock::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(WriteLock::Id)
                                .integer()
                                .not_null()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(WriteLock::Epoch)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .to_owned(),
                )
                .await?;

            let seed = Query::insert()
                .into_table(WriteLock::Table)
                .columns([WriteLock::Id, WriteLock::Epoch])
                .values_panic([1.into(), 0.into()])
                .to_owned();
            manager.exec_stmt(seed).await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(WriteLock::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(DocumentSequences::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum DocumentSequences {
        Table,
        SequenceKey,
        LastValue,
    }

    #[derive(DeriveIden)]
    enum WriteLock {
        Table,
        Id,
        Epoch,
    }
}
