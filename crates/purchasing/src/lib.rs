//! Purchasing domain module (outsourced supplier purchase orders).
//!
//! Purchase orders and their append-only supplier payment history, plus the
//! reconciler that derives paid/outstanding/status from that history.
//! Deterministic domain logic only (no IO, no HTTP, no storage).

pub mod order;
pub mod payment;
pub mod reconciler;

pub use order::{
    CreatePurchaseOrder, PaymentRecorded, PurchaseOrder, PurchaseOrderCommand,
    PurchaseOrderCreated, PurchaseOrderEvent, RecordPayment,
};
pub use payment::{PaymentDetail, PaymentStatus};
pub use reconciler::{
    PaymentOverview, ProfitMargin, Reconciliation, derive_status, outstanding, overview,
    payment_command, profit, profit_percent, reconcile, record_payment, total_paid,
};
