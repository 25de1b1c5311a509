//! Fulfillment domain module.
//!
//! Invoices, their line items, the tagged fulfillment assignment each line
//! carries, and the completeness evaluator that decides whether a line (and so
//! an invoice) is ready for dispatch. Pure, deterministic domain logic: no IO,
//! no storage.

pub mod evaluator;
pub mod invoice;
pub mod line_item;
pub mod source;

pub use evaluator::{
    FulfillmentSummary, PendingReason, Readiness, all_complete, assess, incomplete_items,
    is_complete, summarize,
};
pub use invoice::{
    ApproveDispatch, AssignFieldRep, AssignSource, AssignmentSubmitted, BulkAssignSource,
    CompleteInvoice, CreateInvoice, DispatchApproved, DispatchRejected, FieldRepAssigned, Invoice,
    InvoiceCommand, InvoiceCompleted, InvoiceCreated, InvoiceEvent, InvoiceStatus,
    LineSourceAssigned, LinkPurchaseOrder, PurchaseOrderLinked, RejectDispatch,
    SerialNumbersRecorded, SetSerialNumbers, SubmitAssignment,
};
pub use line_item::{LineItem, parse_serial_numbers};
pub use source::{Assignment, FulfillmentSource};
