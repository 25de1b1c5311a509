//! `dispatchdesk-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! the shared error model, identifiers, and the aggregate/entity traits the
//! fulfillment and purchasing modules are built on.

pub mod aggregate;
pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use aggregate::{Aggregate, AggregateRoot};
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{FieldRepId, InvoiceId, LineItemId, ProductId, PurchaseOrderId};
pub use value_object::ValueObject;
