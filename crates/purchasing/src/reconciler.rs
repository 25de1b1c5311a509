//! Payment reconciliation for purchase orders.
//!
//! Everything here is derived from the append-only payment history:
//!
//! | total paid            | status    |
//! |-----------------------|-----------|
//! | 0                     | `UNPAID`  |
//! | 0 < paid < price      | `PARTIAL` |
//! | paid >= price         | `PAID`    |
//!
//! A history whose total exceeds the purchase price can only come from a
//! bypassed guard. It is reported as an invariant violation, never clamped.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use dispatchdesk_core::{Aggregate, AggregateRoot, DomainError, DomainResult};

use crate::order::{PurchaseOrder, PurchaseOrderCommand, RecordPayment};
use crate::payment::PaymentStatus;

/// Sum of all recorded payments (0 if none).
pub fn total_paid(po: &PurchaseOrder) -> u64 {
    po.payments()
        .iter()
        .fold(0u64, |acc, p| acc.saturating_add(p.amount_paid))
}

/// Remaining balance owed to the supplier.
pub fn outstanding(po: &PurchaseOrder) -> DomainResult<u64> {
    let paid = total_paid(po);
    po.purchase_price().checked_sub(paid).ok_or_else(|| {
        DomainError::invariant(format!(
            "purchase order {} is overpaid: paid {paid} against price {}",
            po.id(),
            po.purchase_price()
        ))
    })
}

pub fn derive_status(po: &PurchaseOrder) -> PaymentStatus {
    match total_paid(po) {
        0 => PaymentStatus::Unpaid,
        paid if paid < po.purchase_price() => PaymentStatus::Partial,
        _ => PaymentStatus::Paid,
    }
}

/// Build the `RecordPayment` command for `po`. `payment_date` defaults to today (UTC).
pub fn payment_command(
    po: &PurchaseOrder,
    amount: u64,
    reference: impl Into<String>,
    proof_of_payment: Option<String>,
    payment_date: Option<NaiveDate>,
) -> PurchaseOrderCommand {
    let now = Utc::now();
    PurchaseOrderCommand::RecordPayment(RecordPayment {
        po_id: po.id().clone(),
        amount,
        reference: reference.into(),
        proof_of_payment,
        payment_date: payment_date.unwrap_or_else(|| now.date_naive()),
        occurred_at: now,
    })
}

/// Record a supplier payment and return the updated purchase order.
///
/// `po` itself is not modified. `payment_date` defaults to today (UTC).
pub fn record_payment(
    po: &PurchaseOrder,
    amount: u64,
    reference: impl Into<String>,
    proof_of_payment: Option<String>,
    payment_date: Option<NaiveDate>,
) -> DomainResult<PurchaseOrder> {
    let command = payment_command(po, amount, reference, proof_of_payment, payment_date);
    let (next, _events) = po.execute(&command)?;
    Ok(next)
}

/// Display snapshot of a purchase order's payment position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconciliation {
    pub total_paid: u64,
    pub outstanding: u64,
    pub status: PaymentStatus,
}

pub fn reconcile(po: &PurchaseOrder) -> DomainResult<Reconciliation> {
    Ok(Reconciliation {
        total_paid: total_paid(po),
        outstanding: outstanding(po)?,
        status: derive_status(po),
    })
}

/// Margin between what we pay the supplier and what the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfitMargin {
    /// `selling - purchase`; negative when sold at a loss.
    pub profit: i64,
    /// Profit as a percentage of the selling price (0 when selling is 0).
    pub percent: f64,
}

impl ProfitMargin {
    pub fn between(purchase_price: u64, selling_price: u64) -> Self {
        let raw = i128::from(selling_price) - i128::from(purchase_price);
        let profit = raw.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64;
        let percent = if selling_price == 0 {
            0.0
        } else {
            raw as f64 / selling_price as f64 * 100.0
        };
        Self { profit, percent }
    }

    pub fn of(po: &PurchaseOrder) -> Self {
        Self::between(po.purchase_price(), po.selling_price())
    }
}

pub fn profit(po: &PurchaseOrder) -> i64 {
    ProfitMargin::of(po).profit
}

pub fn profit_percent(po: &PurchaseOrder) -> f64 {
    ProfitMargin::of(po).percent
}

/// Status counts and total balance across a set of purchase orders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentOverview {
    pub unpaid: usize,
    pub partial: usize,
    pub paid: usize,
    pub total_outstanding: u64,
}

/// Fails on the first overpaid purchase order.
pub fn overview<'a, I>(pos: I) -> DomainResult<PaymentOverview>
where
    I: IntoIterator<Item = &'a PurchaseOrder>,
{
    pos.into_iter().try_fold(PaymentOverview::default(), |mut acc, po| {
        let rec = reconcile(po)?;
        match rec.status {
            PaymentStatus::Unpaid => acc.unpaid += 1,
            PaymentStatus::Partial => acc.partial += 1,
            PaymentStatus::Paid => acc.paid += 1,
        }
        acc.total_outstanding = acc.total_outstanding.saturating_add(rec.outstanding);
        Ok(acc)
    })
}
