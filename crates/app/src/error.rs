//! Application-level errors.

use thiserror::Error;

use dispatchdesk_core::{DomainError, FieldRepId, InvoiceId, PurchaseOrderId};

pub type DeskResult<T> = Result<T, DeskError>;

/// Errors surfaced by the fulfillment desk.
///
/// Domain failures pass through unchanged; lookups and configuration are
/// the desk's own concern.
#[derive(Debug, Error)]
pub enum DeskError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("invoice not found: {0}")]
    InvoiceNotFound(InvoiceId),

    #[error("purchase order not found: {0}")]
    PurchaseOrderNotFound(PurchaseOrderId),

    #[error("unknown field rep: {0}")]
    UnknownFieldRep(FieldRepId),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl DeskError {
    /// True when the caller sent bad input (as opposed to a state or lookup problem).
    pub fn is_validation(&self) -> bool {
        matches!(self, DeskError::Domain(e) if e.is_validation())
    }

    pub fn domain(&self) -> Option<&DomainError> {
        match self {
            DeskError::Domain(e) => Some(e),
            _ => None,
        }
    }
}
