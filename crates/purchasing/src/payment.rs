use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use dispatchdesk_core::{DomainError, DomainResult, ValueObject};

/// Supplier payment status of a purchase order.
///
/// Always derived from the payment history, never set directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Unpaid,
    Partial,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "UNPAID",
            PaymentStatus::Partial => "PARTIAL",
            PaymentStatus::Paid => "PAID",
        }
    }
}

impl core::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded payment to a supplier (immutable).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentDetail {
    /// Amount in whole currency units; always positive.
    pub amount_paid: u64,
    /// External transaction code (e.g. an M-PESA confirmation code).
    pub reference: String,
    /// Where the proof-of-payment image is stored, if one was attached.
    pub proof_of_payment: Option<String>,
    pub payment_date: NaiveDate,
}

impl PaymentDetail {
    pub fn new(
        amount_paid: u64,
        reference: impl Into<String>,
        proof_of_payment: Option<String>,
        payment_date: NaiveDate,
    ) -> DomainResult<Self> {
        if amount_paid == 0 {
            return Err(DomainError::validation("payment amount must be positive"));
        }
        let reference = reference.into().trim().to_string();
        if reference.is_empty() {
            return Err(DomainError::validation("payment reference cannot be empty"));
        }
        let proof_of_payment = proof_of_payment
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());

        Ok(Self {
            amount_paid,
            reference,
            proof_of_payment,
            payment_date,
        })
    }
}

impl ValueObject for PaymentDetail {}
