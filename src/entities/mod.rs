pub mod delivery_challan;
pub mod delivery_challan_item;
pub mod document_sequence;
pub mod gst_invoice;
pub mod gst_invoice_item;
pub mod invoice_dc_link;
pub mod purchase_order;
pub mod purchase_order_item;
pub mod purchase_order_lot;
pub mod srv;
pub mod srv_item;
