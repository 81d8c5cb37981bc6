// Ledger and invariant checks
pub mod ledger;
pub mod numbering;
pub mod tax;
pub mod validation;

// Document services
pub mod delivery_challans;
pub mod invoices;
pub mod srvs;

// Ingestion and reporting
pub mod preflight;
pub mod purchase_orders;
pub mod reconciliation;
