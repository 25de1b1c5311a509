//! In-memory fulfillment desk.
//!
//! Fronts the invoice and purchase-order aggregates: looks them up, runs
//! commands through `Aggregate::execute`, and swaps in the new value only
//! when the command succeeded. A rejected command never changes stored state.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use chrono::{NaiveDate, Utc};
use serde::Serialize;

use dispatchdesk_core::{
    Aggregate, AggregateRoot, DomainError, DomainResult, FieldRepId, InvoiceId, LineItemId,
    PurchaseOrderId,
};
use dispatchdesk_events::Event;
use dispatchdesk_fulfillment::{
    ApproveDispatch, AssignFieldRep, AssignSource, BulkAssignSource, CompleteInvoice,
    CreateInvoice, FulfillmentSource, FulfillmentSummary, Invoice, InvoiceCommand, InvoiceStatus,
    LineItem, LinkPurchaseOrder, RejectDispatch, SetSerialNumbers, SubmitAssignment,
    parse_serial_numbers,
};
use dispatchdesk_parties::{Customer, FieldRepRoster, Supplier};
use dispatchdesk_purchasing::{
    CreatePurchaseOrder, PaymentOverview, PaymentStatus, ProfitMargin, PurchaseOrder,
    PurchaseOrderCommand, overview, payment_command, reconcile,
};

use crate::error::{DeskError, DeskResult};

/// Input for [`FulfillmentDesk::create_invoice`].
#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub invoice_id: InvoiceId,
    pub customer_name: String,
    pub customer_phone: String,
    pub invoice_date: NaiveDate,
    pub lines: Vec<LineItem>,
}

/// Input for [`FulfillmentDesk::create_purchase_order`].
///
/// The selling price is always the line's unit price.
#[derive(Debug, Clone)]
pub struct NewPurchaseOrder {
    /// Generated when absent.
    pub po_id: Option<PurchaseOrderId>,
    pub supplier_name: String,
    pub supplier_phone: String,
    pub purchase_price: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub awaiting_fulfillment: usize,
    pub assigned: usize,
    pub dispatched: usize,
    pub completed: usize,
}

impl StatusCounts {
    pub fn count_for(&self, status: InvoiceStatus) -> usize {
        match status {
            InvoiceStatus::AwaitingFulfillment => self.awaiting_fulfillment,
            InvoiceStatus::Assigned => self.assigned,
            InvoiceStatus::Dispatched => self.dispatched,
            InvoiceStatus::Completed => self.completed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceRow {
    pub invoice_id: InvoiceId,
    pub customer_name: String,
    pub invoice_date: Option<NaiveDate>,
    pub status: InvoiceStatus,
    pub total_amount: u64,
    pub fulfillment: FulfillmentSummary,
    pub completion_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurchaseOrderRow {
    pub po_id: PurchaseOrderId,
    pub invoice_id: Option<InvoiceId>,
    pub supplier_name: String,
    pub purchase_price: u64,
    pub selling_price: u64,
    pub profit: i64,
    pub profit_percent: f64,
    pub total_paid: u64,
    pub outstanding: u64,
    pub status: PaymentStatus,
}

/// Everything the dashboard shows, in one serializable snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub currency: String,
    pub invoice_status: StatusCounts,
    pub invoices: Vec<InvoiceRow>,
    pub payments: PaymentOverview,
    pub purchase_orders: Vec<PurchaseOrderRow>,
}

#[derive(Debug, Clone)]
pub struct FulfillmentDesk {
    currency: String,
    roster: FieldRepRoster,
    invoices: BTreeMap<InvoiceId, Invoice>,
    purchase_orders: BTreeMap<PurchaseOrderId, PurchaseOrder>,
}

impl FulfillmentDesk {
    pub fn new(roster: FieldRepRoster) -> Self {
        Self {
            currency: "KES".to_string(),
            roster,
            invoices: BTreeMap::new(),
            purchase_orders: BTreeMap::new(),
        }
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn roster(&self) -> &FieldRepRoster {
        &self.roster
    }

    pub fn invoice(&self, invoice_id: &InvoiceId) -> DeskResult<&Invoice> {
        tracing::debug!(invoice_id = %invoice_id, "invoice lookup");
        self.invoices
            .get(invoice_id)
            .ok_or_else(|| DeskError::InvoiceNotFound(invoice_id.clone()))
    }

    pub fn invoices(&self) -> impl Iterator<Item = &Invoice> {
        self.invoices.values()
    }

    pub fn invoices_with_status(&self, status: InvoiceStatus) -> impl Iterator<Item = &Invoice> {
        self.invoices.values().filter(move |i| i.status() == status)
    }

    pub fn purchase_order(&self, po_id: &PurchaseOrderId) -> DeskResult<&PurchaseOrder> {
        tracing::debug!(po_id = %po_id, "purchase order lookup");
        self.purchase_orders
            .get(po_id)
            .ok_or_else(|| DeskError::PurchaseOrderNotFound(po_id.clone()))
    }

    pub fn purchase_orders(&self) -> impl Iterator<Item = &PurchaseOrder> {
        self.purchase_orders.values()
    }

    // ---- invoice commands ----

    pub fn create_invoice(&mut self, new: NewInvoice) -> DeskResult<&Invoice> {
        let customer = Customer::new(new.customer_name, new.customer_phone)
            .inspect_err(|e| tracing::warn!(invoice_id = %new.invoice_id, error = %e, "invoice rejected"))?;

        let current = self
            .invoices
            .get(&new.invoice_id)
            .cloned()
            .unwrap_or_else(|| Invoice::empty(new.invoice_id.clone()));

        let command = InvoiceCommand::CreateInvoice(CreateInvoice {
            invoice_id: new.invoice_id,
            customer,
            invoice_date: new.invoice_date,
            lines: new.lines,
            occurred_at: Utc::now(),
        });
        self.commit_invoice(&current, &command)
    }

    pub fn assign_source(
        &mut self,
        invoice_id: &InvoiceId,
        line_id: &LineItemId,
        source: FulfillmentSource,
    ) -> DeskResult<&Invoice> {
        let command = InvoiceCommand::AssignSource(AssignSource {
            invoice_id: invoice_id.clone(),
            line_id: line_id.clone(),
            source,
            occurred_at: Utc::now(),
        });
        self.run_invoice_command(invoice_id, &command)
    }

    /// Assign one source to several lines at once (all or nothing).
    pub fn bulk_assign_source(
        &mut self,
        invoice_id: &InvoiceId,
        line_ids: &[LineItemId],
        source: FulfillmentSource,
    ) -> DeskResult<&Invoice> {
        let command = InvoiceCommand::BulkAssignSource(BulkAssignSource {
            invoice_id: invoice_id.clone(),
            line_ids: line_ids.to_vec(),
            source,
            occurred_at: Utc::now(),
        });
        self.run_invoice_command(invoice_id, &command)
    }

    pub fn set_serial_numbers(
        &mut self,
        invoice_id: &InvoiceId,
        line_id: &LineItemId,
        serial_numbers: Vec<String>,
    ) -> DeskResult<&Invoice> {
        let command = InvoiceCommand::SetSerialNumbers(SetSerialNumbers {
            invoice_id: invoice_id.clone(),
            line_id: line_id.clone(),
            serial_numbers,
            occurred_at: Utc::now(),
        });
        self.run_invoice_command(invoice_id, &command)
    }

    /// Record serials typed as free text (one per line or comma separated).
    pub fn enter_serial_numbers(
        &mut self,
        invoice_id: &InvoiceId,
        line_id: &LineItemId,
        raw: &str,
    ) -> DeskResult<&Invoice> {
        self.set_serial_numbers(invoice_id, line_id, parse_serial_numbers(raw))
    }

    pub fn assign_field_rep(
        &mut self,
        invoice_id: &InvoiceId,
        line_id: &LineItemId,
        rep_id: &FieldRepId,
    ) -> DeskResult<&Invoice> {
        if !self.roster.contains(rep_id) {
            tracing::warn!(invoice_id = %invoice_id, rep_id = %rep_id, "unknown field rep");
            return Err(DeskError::UnknownFieldRep(rep_id.clone()));
        }

        let command = InvoiceCommand::AssignFieldRep(AssignFieldRep {
            invoice_id: invoice_id.clone(),
            line_id: line_id.clone(),
            rep_id: rep_id.clone(),
            occurred_at: Utc::now(),
        });
        self.run_invoice_command(invoice_id, &command)
    }

    pub fn submit_assignment(&mut self, invoice_id: &InvoiceId) -> DeskResult<&Invoice> {
        let command = InvoiceCommand::SubmitAssignment(SubmitAssignment {
            invoice_id: invoice_id.clone(),
            occurred_at: Utc::now(),
        });
        self.run_invoice_command(invoice_id, &command)
    }

    pub fn approve_dispatch(&mut self, invoice_id: &InvoiceId) -> DeskResult<&Invoice> {
        let command = InvoiceCommand::ApproveDispatch(ApproveDispatch {
            invoice_id: invoice_id.clone(),
            occurred_at: Utc::now(),
        });
        self.run_invoice_command(invoice_id, &command)
    }

    pub fn reject_dispatch(
        &mut self,
        invoice_id: &InvoiceId,
        reason: Option<String>,
    ) -> DeskResult<&Invoice> {
        let command = InvoiceCommand::RejectDispatch(RejectDispatch {
            invoice_id: invoice_id.clone(),
            reason,
            occurred_at: Utc::now(),
        });
        self.run_invoice_command(invoice_id, &command)
    }

    pub fn complete_invoice(&mut self, invoice_id: &InvoiceId) -> DeskResult<&Invoice> {
        let command = InvoiceCommand::CompleteInvoice(CompleteInvoice {
            invoice_id: invoice_id.clone(),
            occurred_at: Utc::now(),
        });
        self.run_invoice_command(invoice_id, &command)
    }

    // ---- purchasing ----

    /// Place a purchase order for an outsourced line and link it to the line.
    ///
    /// Both aggregates are updated together or not at all.
    pub fn create_purchase_order(
        &mut self,
        invoice_id: &InvoiceId,
        line_id: &LineItemId,
        new: NewPurchaseOrder,
    ) -> DeskResult<&PurchaseOrder> {
        let invoice = self.invoice(invoice_id)?.clone();
        let line = invoice.line(line_id).ok_or_else(DomainError::not_found)?;
        // Must hold before the order exists; a second order for the line would be orphaned.
        line.ensure_awaiting_purchase_order().inspect_err(|e| {
            tracing::warn!(invoice_id = %invoice_id, line_id = %line_id, error = %e, "purchase order rejected")
        })?;

        let po_id = new.po_id.unwrap_or_else(PurchaseOrderId::generate);
        let now = Utc::now();
        let current = self
            .purchase_orders
            .get(&po_id)
            .cloned()
            .unwrap_or_else(|| PurchaseOrder::empty(po_id.clone()));

        let create = PurchaseOrderCommand::CreatePurchaseOrder(CreatePurchaseOrder {
            po_id: po_id.clone(),
            invoice_id: invoice_id.clone(),
            line_item_id: line_id.clone(),
            product_id: line.product_id.clone(),
            supplier: Supplier {
                name: new.supplier_name,
                phone: new.supplier_phone,
            },
            purchase_price: new.purchase_price,
            selling_price: line.unit_price,
            occurred_at: now,
        });
        let link = InvoiceCommand::LinkPurchaseOrder(LinkPurchaseOrder {
            invoice_id: invoice_id.clone(),
            line_id: line_id.clone(),
            po_id: po_id.clone(),
            occurred_at: now,
        });

        let (order, po_events) = current
            .execute(&create)
            .inspect_err(|e| tracing::warn!(po_id = %po_id, error = %e, "purchase order rejected"))?;
        let (linked, invoice_events) = invoice
            .execute(&link)
            .inspect_err(|e| tracing::warn!(invoice_id = %invoice_id, error = %e, "purchase order link rejected"))?;

        for event in &po_events {
            tracing::info!(po_id = %po_id, event_type = event.event_type(), "purchase order event");
        }
        for event in &invoice_events {
            tracing::info!(invoice_id = %invoice_id, event_type = event.event_type(), "invoice event");
        }

        self.invoices.insert(invoice_id.clone(), linked);
        Ok(store(&mut self.purchase_orders, po_id, order))
    }

    /// Record a supplier payment entered as text.
    ///
    /// See [`parse_amount`] for the accepted forms; anything else is a
    /// validation error and leaves the order unchanged.
    pub fn log_payment(
        &mut self,
        po_id: &PurchaseOrderId,
        amount: &str,
        reference: &str,
        proof_of_payment: Option<String>,
        payment_date: Option<NaiveDate>,
    ) -> DeskResult<&PurchaseOrder> {
        let current = self.purchase_order(po_id)?;

        let (next, events) = parse_amount(amount)
            .and_then(|amount| {
                let command =
                    payment_command(current, amount, reference, proof_of_payment, payment_date);
                current.execute(&command)
            })
            .inspect_err(|e| tracing::warn!(po_id = %po_id, error = %e, "payment rejected"))?;

        let rec = reconcile(&next)?;
        for event in &events {
            tracing::info!(
                po_id = %po_id,
                event_type = event.event_type(),
                total_paid = rec.total_paid,
                outstanding = rec.outstanding,
                status = %rec.status,
                "purchase order event"
            );
        }

        Ok(store(&mut self.purchase_orders, po_id.clone(), next))
    }

    // ---- read side ----

    pub fn status_counts(&self) -> StatusCounts {
        self.invoices
            .values()
            .fold(StatusCounts::default(), |mut acc, invoice| {
                match invoice.status() {
                    InvoiceStatus::AwaitingFulfillment => acc.awaiting_fulfillment += 1,
                    InvoiceStatus::Assigned => acc.assigned += 1,
                    InvoiceStatus::Dispatched => acc.dispatched += 1,
                    InvoiceStatus::Completed => acc.completed += 1,
                }
                acc
            })
    }

    pub fn payment_overview(&self) -> DeskResult<PaymentOverview> {
        Ok(overview(self.purchase_orders.values())?)
    }

    pub fn dashboard(&self) -> DeskResult<Dashboard> {
        let invoices = self
            .invoices
            .values()
            .map(|invoice| {
                let fulfillment = invoice.summary();
                InvoiceRow {
                    invoice_id: invoice.id().clone(),
                    customer_name: invoice
                        .customer()
                        .map(|c| c.name.clone())
                        .unwrap_or_default(),
                    invoice_date: invoice.invoice_date(),
                    status: invoice.status(),
                    total_amount: invoice.total_amount(),
                    fulfillment,
                    completion_percent: fulfillment.completion_percent(),
                }
            })
            .collect();

        let purchase_orders = self
            .purchase_orders
            .values()
            .map(purchase_order_row)
            .collect::<DomainResult<Vec<_>>>()?;

        Ok(Dashboard {
            currency: self.currency.clone(),
            invoice_status: self.status_counts(),
            invoices,
            payments: self.payment_overview()?,
            purchase_orders,
        })
    }

    fn run_invoice_command(
        &mut self,
        invoice_id: &InvoiceId,
        command: &InvoiceCommand,
    ) -> DeskResult<&Invoice> {
        let current = self.invoice(invoice_id)?.clone();
        self.commit_invoice(&current, command)
    }

    fn commit_invoice(&mut self, current: &Invoice, command: &InvoiceCommand) -> DeskResult<&Invoice> {
        let invoice_id = current.id().clone();
        let (next, events) = current
            .execute(command)
            .inspect_err(|e| tracing::warn!(invoice_id = %invoice_id, error = %e, "invoice command rejected"))?;

        for event in &events {
            tracing::info!(
                invoice_id = %invoice_id,
                event_type = event.event_type(),
                status = %next.status(),
                "invoice event"
            );
        }

        Ok(store(&mut self.invoices, invoice_id, next))
    }
}

fn store<K: Ord, V>(map: &mut BTreeMap<K, V>, key: K, value: V) -> &V {
    match map.entry(key) {
        Entry::Occupied(mut slot) => {
            slot.insert(value);
            slot.into_mut()
        }
        Entry::Vacant(slot) => slot.insert(value),
    }
}

fn purchase_order_row(po: &PurchaseOrder) -> DomainResult<PurchaseOrderRow> {
    let rec = reconcile(po)?;
    let margin = ProfitMargin::of(po);
    Ok(PurchaseOrderRow {
        po_id: po.id().clone(),
        invoice_id: po.invoice_id().cloned(),
        supplier_name: po.supplier().map(|s| s.name.clone()).unwrap_or_default(),
        purchase_price: po.purchase_price(),
        selling_price: po.selling_price(),
        profit: margin.profit,
        profit_percent: margin.percent,
        total_paid: rec.total_paid,
        outstanding: rec.outstanding,
        status: rec.status,
    })
}

/// Parse a payment amount typed by a user.
///
/// Amounts are whole currency units. A decimal form is accepted when the
/// fraction is zero (`"6000.00"`); any other fraction is rejected rather than
/// rounded.
pub fn parse_amount(input: &str) -> DomainResult<u64> {
    let trimmed = input.trim();
    if trimmed.starts_with('-') {
        return Err(DomainError::validation("payment amount must be positive"));
    }
    let invalid = || DomainError::validation(format!("invalid payment amount: {trimmed:?}"));
    let (whole, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));
    if !fraction.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    if fraction.chars().any(|c| c != '0') {
        return Err(DomainError::validation(format!(
            "payment amount must be whole currency units: {trimmed:?}"
        )));
    }
    let amount: u64 = whole.parse().map_err(|_| invalid())?;
    if amount == 0 {
        return Err(DomainError::validation("payment amount must be positive"));
    }
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dispatchdesk_core::ProductId;
    use dispatchdesk_parties::FieldRep;

    fn inv() -> InvoiceId {
        InvoiceId::parse("INV-100").unwrap()
    }

    fn line_id(id: &str) -> LineItemId {
        LineItemId::parse(id).unwrap()
    }

    fn rep1() -> FieldRepId {
        FieldRepId::parse("rep1").unwrap()
    }

    fn desk() -> FulfillmentDesk {
        let roster = FieldRepRoster::from_reps([FieldRep::new(
            rep1(),
            "John Doe",
            "+254712345678",
            "Nairobi CBD",
        )
        .unwrap()])
        .unwrap();
        let mut desk = FulfillmentDesk::new(roster);
        desk.create_invoice(NewInvoice {
            invoice_id: inv(),
            customer_name: "Acme Corp".to_string(),
            customer_phone: "+254712345678".to_string(),
            invoice_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            lines: vec![
                LineItem::new(line_id("1"), ProductId::parse("PROD-001").unwrap(), "Laptop", 2, 65_000)
                    .unwrap(),
                LineItem::new(line_id("2"), ProductId::parse("PROD-002").unwrap(), "Mouse", 3, 2_500)
                    .unwrap(),
            ],
        })
        .unwrap();
        desk
    }

    fn supplier_po(price: u64) -> NewPurchaseOrder {
        NewPurchaseOrder {
            po_id: Some(PurchaseOrderId::parse("PO-TEST").unwrap()),
            supplier_name: "Tech Supplies Ltd".to_string(),
            supplier_phone: "+254712345678".to_string(),
            purchase_price: price,
        }
    }

    #[test]
    fn parse_amount_rejects_negative_zero_and_garbage() {
        assert_eq!(parse_amount(" 6000 ").unwrap(), 6_000);
        assert!(parse_amount("-5").unwrap_err().is_validation());
        assert!(parse_amount("0").unwrap_err().is_validation());
        assert!(parse_amount("six").unwrap_err().is_validation());
        assert!(parse_amount("").unwrap_err().is_validation());
    }

    #[test]
    fn parse_amount_accepts_zero_fraction_only() {
        assert_eq!(parse_amount("6000.00").unwrap(), 6_000);
        assert_eq!(parse_amount("6000.").unwrap(), 6_000);
        assert_eq!(parse_amount("0.00").unwrap_err(), DomainError::validation("payment amount must be positive"));

        let err = parse_amount("6000.50").unwrap_err();
        assert!(matches!(&err, DomainError::Validation(msg) if msg.contains("whole currency units")));
        assert!(parse_amount("60.0.0").unwrap_err().is_validation());
        assert!(parse_amount(".").unwrap_err().is_validation());
    }

    #[test]
    fn missing_invoice_is_a_lookup_error() {
        let mut desk = desk();
        let missing = InvoiceId::parse("INV-404").unwrap();
        let err = desk.submit_assignment(&missing).unwrap_err();
        assert!(matches!(err, DeskError::InvoiceNotFound(id) if id == missing));
    }

    #[test]
    fn unknown_rep_is_rejected_before_the_aggregate() {
        let mut desk = desk();
        desk.assign_source(&inv(), &line_id("1"), FulfillmentSource::FieldRep)
            .unwrap();
        let ghost = FieldRepId::parse("rep9").unwrap();
        let err = desk.assign_field_rep(&inv(), &line_id("1"), &ghost).unwrap_err();
        assert!(matches!(err, DeskError::UnknownFieldRep(_)));
        assert_eq!(desk.invoice(&inv()).unwrap().line(&line_id("1")).unwrap().assigned_rep(), None);
    }

    #[test]
    fn failed_command_leaves_invoice_untouched() {
        let mut desk = desk();
        let before = desk.invoice(&inv()).unwrap().clone();
        assert!(desk.submit_assignment(&inv()).is_err());
        assert_eq!(desk.invoice(&inv()).unwrap(), &before);
    }

    #[test]
    fn purchase_order_requires_outsourced_line() {
        let mut desk = desk();
        let err = desk
            .create_purchase_order(&inv(), &line_id("1"), supplier_po(55_000))
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(desk.purchase_orders().count(), 0);
    }

    #[test]
    fn purchase_order_links_line_and_uses_unit_price() {
        let mut desk = desk();
        desk.assign_source(&inv(), &line_id("1"), FulfillmentSource::Outsource)
            .unwrap();
        let po = desk
            .create_purchase_order(&inv(), &line_id("1"), supplier_po(55_000))
            .unwrap();
        assert_eq!(po.selling_price(), 65_000);
        assert_eq!(po.status(), PaymentStatus::Unpaid);

        let line = desk.invoice(&inv()).unwrap().line(&line_id("1")).unwrap().clone();
        assert_eq!(line.po_id().map(PurchaseOrderId::as_str), Some("PO-TEST"));
    }

    #[test]
    fn second_purchase_order_for_a_line_is_a_conflict() {
        let mut desk = desk();
        desk.assign_source(&inv(), &line_id("1"), FulfillmentSource::Outsource)
            .unwrap();
        desk.create_purchase_order(&inv(), &line_id("1"), supplier_po(80))
            .unwrap();

        let mut again = supplier_po(80);
        again.po_id = Some(PurchaseOrderId::parse("PO-AGAIN").unwrap());
        let err = desk
            .create_purchase_order(&inv(), &line_id("1"), again)
            .unwrap_err();
        assert!(matches!(err, DeskError::Domain(DomainError::Conflict(_))));

        assert_eq!(desk.purchase_orders().count(), 1);
        assert!(desk.purchase_order(&PurchaseOrderId::parse("PO-AGAIN").unwrap()).is_err());
        let line = desk.invoice(&inv()).unwrap().line(&line_id("1")).unwrap().clone();
        assert_eq!(line.po_id().map(PurchaseOrderId::as_str), Some("PO-TEST"));
        assert_eq!(desk.payment_overview().unwrap().total_outstanding, 80);
    }

    #[test]
    fn invalid_supplier_creates_nothing() {
        let mut desk = desk();
        desk.assign_source(&inv(), &line_id("1"), FulfillmentSource::Outsource)
            .unwrap();
        let mut new = supplier_po(55_000);
        new.supplier_phone = "  ".to_string();
        assert!(desk.create_purchase_order(&inv(), &line_id("1"), new).is_err());
        assert_eq!(desk.purchase_orders().count(), 0);
        assert_eq!(desk.invoice(&inv()).unwrap().line(&line_id("1")).unwrap().po_id(), None);
    }

    #[test]
    fn log_payment_rejects_overpayment_without_changing_state() {
        let mut desk = desk();
        desk.assign_source(&inv(), &line_id("1"), FulfillmentSource::Outsource)
            .unwrap();
        desk.create_purchase_order(&inv(), &line_id("1"), supplier_po(12_000))
            .unwrap();
        let po_id = PurchaseOrderId::parse("PO-TEST").unwrap();

        desk.log_payment(&po_id, "6000", "RBK2345678", None, None).unwrap();
        let err = desk
            .log_payment(&po_id, "6001", "RBK2345679", None, None)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "validation failed: amount exceeds outstanding balance of 6000"
        );
        assert_eq!(desk.purchase_order(&po_id).unwrap().payments().len(), 1);

        let po = desk.log_payment(&po_id, "6000", "RBK2345680", None, None).unwrap();
        assert_eq!(po.status(), PaymentStatus::Paid);
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn log_payment_logs_the_recorded_event() {
        let mut desk = desk();
        desk.assign_source(&inv(), &line_id("1"), FulfillmentSource::Outsource)
            .unwrap();
        desk.create_purchase_order(&inv(), &line_id("1"), supplier_po(12_000))
            .unwrap();
        let po_id = PurchaseOrderId::parse("PO-TEST").unwrap();

        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        let version = tracing::subscriber::with_default(subscriber, || {
            desk.log_payment(&po_id, "6000.00", "RBK2345678", None, None)
                .map(|po| po.version())
        })
        .unwrap();
        assert_eq!(version, 2);

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("event_type=\"purchasing.order.payment_recorded\""));
        assert!(output.contains("outstanding=6000"));
        assert!(output.contains("status=PARTIAL"));
    }

    #[test]
    fn status_counts_follow_lifecycle() {
        let mut desk = desk();
        desk.bulk_assign_source(&inv(), &[line_id("1"), line_id("2")], FulfillmentSource::MainHq)
            .unwrap();
        desk.enter_serial_numbers(&inv(), &line_id("1"), "SN1\nSN2").unwrap();
        desk.enter_serial_numbers(&inv(), &line_id("2"), "M1, M2, M3").unwrap();
        desk.submit_assignment(&inv()).unwrap();

        let counts = desk.status_counts();
        assert_eq!(counts.count_for(InvoiceStatus::Assigned), 1);
        assert_eq!(counts.awaiting_fulfillment, 0);
        assert_eq!(desk.invoices_with_status(InvoiceStatus::Assigned).count(), 1);
    }
}
