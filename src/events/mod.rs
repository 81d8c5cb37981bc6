use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Domain events emitted after a write has committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    PurchaseOrderUpserted {
        po_number: i64,
        created: bool,
        item_count: usize,
    },
    DeliveryChallanCreated {
        dc_number: String,
        po_number: i64,
        total_quantity: Decimal,
    },
    DeliveryChallanUpdated {
        dc_number: String,
        po_number: i64,
        total_quantity: Decimal,
    },
    DeliveryChallanDeleted {
        dc_number: String,
        po_number: i64,
    },
    InvoiceCreated {
        invoice_number: String,
        dc_number: String,
        total_amount: Decimal,
    },
    SrvIngested {
        srv_number: String,
        po_number: i64,
        po_found: bool,
    },
    SrvDeactivated {
        srv_number: String,
        po_number: i64,
    },
    OrphanSrvsLinked {
        po_number: i64,
        srv_numbers: Vec<String>,
    },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::PurchaseOrderUpserted { .. } => "purchase_order.upserted",
            Event::DeliveryChallanCreated { .. } => "delivery_challan.created",
            Event::DeliveryChallanUpdated { .. } => "delivery_challan.updated",
            Event::DeliveryChallanDeleted { .. } => "delivery_challan.deleted",
            Event::InvoiceCreated { .. } => "invoice.created",
            Event::SrvIngested { .. } => "srv.ingested",
            Event::SrvDeactivated { .. } => "srv.deactivated",
            Event::OrphanSrvsLinked { .. } => "srv.orphans_linked",
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event for a write that has already committed. Delivery
    /// problems are logged and never surface to the caller.
    pub async fn send_or_log(&self, event: Event) {
        let name = event.name();
        if let Err(e) = self.send(event).await {
            warn!(event = name, error = %e, "dropping domain event");
        }
    }
}

/// Builds a sender and its receiving end with the given buffer size.
pub fn channel(capacity: usize) -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(capacity);
    (EventSender::new(tx), rx)
}

/// Drains the event channel until every sender is dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::OrphanSrvsLinked {
                po_number,
                srv_numbers,
            } if !srv_numbers.is_empty() => {
                info!(
                    po_number,
                    linked = srv_numbers.len(),
                    "orphan SRVs now count towards the ledger"
                );
            }
            Event::OrphanSrvsLinked { .. } => {
                debug!(event = event.name(), "no orphan SRVs to link");
            }
            Event::SrvIngested {
                srv_number,
                po_number,
                po_found: false,
            } => {
                warn!(
                    srv_number = %srv_number,
                    po_number,
                    "SRV stored as orphan until its PO arrives"
                );
            }
            other => {
                info!(event = other.name(), payload = ?other, "domain event");
            }
        }
    }

    info!("Event processing loop stopped");
}
