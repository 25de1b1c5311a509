//! Parties domain module (customers, suppliers, field representatives).
//!
//! Static reference data the fulfillment and purchasing modules point at.
//! Nothing here is created or mutated by fulfillment workflows.

pub mod contact;
pub mod field_rep;

pub use contact::{Customer, Supplier};
pub use field_rep::{FieldRep, FieldRepRoster};
