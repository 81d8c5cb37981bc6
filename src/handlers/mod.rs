pub mod common;
pub mod delivery_challans;
pub mod health;
pub mod invoices;
pub mod purchase_orders;
pub mod reconciliation;
pub mod srvs;

use crate::{
    db::DbPool,
    events::EventSender,
    services::{
        delivery_challans::DeliveryChallanService, invoices::InvoiceService,
        preflight::PreflightService, purchase_orders::PurchaseOrderService,
        reconciliation::ReconciliationService, srvs::SrvService, tax::TaxRates,
    },
};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub purchase_orders: Arc<PurchaseOrderService>,
    pub delivery_challans: Arc<DeliveryChallanService>,
    pub invoices: Arc<InvoiceService>,
    pub srvs: Arc<SrvService>,
    pub reconciliation: Arc<ReconciliationService>,
    pub preflight: Arc<PreflightService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>, rates: TaxRates) -> Self {
        Self {
            purchase_orders: Arc::new(PurchaseOrderService::new(
                db_pool.clone(),
                event_sender.clone(),
            )),
            delivery_challans: Arc::new(DeliveryChallanService::new(
                db_pool.clone(),
                event_sender.clone(),
            )),
            invoices: Arc::new(InvoiceService::new(
                db_pool.clone(),
                event_sender.clone(),
                rates,
            )),
            srvs: Arc::new(SrvService::new(db_pool.clone(), event_sender)),
            reconciliation: Arc::new(ReconciliationService::new(db_pool.clone())),
            preflight: Arc::new(PreflightService::new(db_pool)),
        }
    }
}
