//! Fulfillment desk application layer.
//!
//! Wires the fulfillment and purchasing aggregates behind an in-memory desk,
//! plus configuration and demo data for the `dispatchdesk` binary.

pub mod config;
pub mod demo;
pub mod desk;
pub mod error;

pub use crate::config::DeskConfig;
pub use desk::{
    Dashboard, FulfillmentDesk, InvoiceRow, NewInvoice, NewPurchaseOrder, PurchaseOrderRow,
    StatusCounts, parse_amount,
};
pub use error::{DeskError, DeskResult};
