use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use dispatchdesk_core::{
    Aggregate, AggregateRoot, DomainError, FieldRepId, InvoiceId, LineItemId, PurchaseOrderId,
};
use dispatchdesk_events::Event;
use dispatchdesk_parties::Customer;

use crate::evaluator::{self, FulfillmentSummary};
use crate::line_item::{LineItem, normalize_serials};
use crate::source::{Assignment, FulfillmentSource};

/// Invoice status lifecycle.
///
/// Strictly forward (`AWAITING_FULFILLMENT → ASSIGNED → DISPATCHED →
/// COMPLETED`) except for a rejected dispatch, which sends an `ASSIGNED`
/// invoice back to `AWAITING_FULFILLMENT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    AwaitingFulfillment,
    Assigned,
    Dispatched,
    Completed,
}

impl InvoiceStatus {
    pub const ALL: [InvoiceStatus; 4] = [
        InvoiceStatus::AwaitingFulfillment,
        InvoiceStatus::Assigned,
        InvoiceStatus::Dispatched,
        InvoiceStatus::Completed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            InvoiceStatus::AwaitingFulfillment => "AWAITING_FULFILLMENT",
            InvoiceStatus::Assigned => "ASSIGNED",
            InvoiceStatus::Dispatched => "DISPATCHED",
            InvoiceStatus::Completed => "COMPLETED",
        }
    }

    /// Line assignments may only change before the invoice is submitted.
    pub fn allows_assignment_edits(self) -> bool {
        self == InvoiceStatus::AwaitingFulfillment
    }
}

impl core::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate root: Invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invoice {
    id: InvoiceId,
    customer: Option<Customer>,
    invoice_date: Option<NaiveDate>,
    status: InvoiceStatus,
    lines: Vec<LineItem>,
    total_amount: u64,
    version: u64,
    created: bool,
}

impl Invoice {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: InvoiceId) -> Self {
        Self {
            id,
            customer: None,
            invoice_date: None,
            status: InvoiceStatus::AwaitingFulfillment,
            lines: Vec::new(),
            total_amount: 0,
            version: 0,
            created: false,
        }
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    pub fn customer(&self) -> Option<&Customer> {
        self.customer.as_ref()
    }

    pub fn invoice_date(&self) -> Option<NaiveDate> {
        self.invoice_date
    }

    pub fn status(&self) -> InvoiceStatus {
        self.status
    }

    pub fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    pub fn line(&self, line_id: &LineItemId) -> Option<&LineItem> {
        self.lines.iter().find(|l| &l.id == line_id)
    }

    /// Sum of quantity × unit price over all lines.
    pub fn total_amount(&self) -> u64 {
        self.total_amount
    }

    pub fn summary(&self) -> FulfillmentSummary {
        evaluator::summarize(&self.lines)
    }

    /// Every line has a complete assignment.
    pub fn is_fully_assigned(&self) -> bool {
        !self.lines.is_empty() && evaluator::all_complete(&self.lines)
    }

    fn line_mut(&mut self, line_id: &LineItemId) -> Option<&mut LineItem> {
        self.lines.iter_mut().find(|l| &l.id == line_id)
    }
}

impl AggregateRoot for Invoice {
    type Id = InvoiceId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateInvoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateInvoice {
    pub invoice_id: InvoiceId,
    pub customer: Customer,
    pub invoice_date: NaiveDate,
    pub lines: Vec<LineItem>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AssignSource (resets any serials, rep or purchase order on the line).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignSource {
    pub invoice_id: InvoiceId,
    pub line_id: LineItemId,
    pub source: FulfillmentSource,
    pub occurred_at: DateTime<Utc>,
}

/// Command: BulkAssignSource (same source for several lines at once).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkAssignSource {
    pub invoice_id: InvoiceId,
    pub line_ids: Vec<LineItemId>,
    pub source: FulfillmentSource,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SetSerialNumbers (replaces the line's serial list).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetSerialNumbers {
    pub invoice_id: InvoiceId,
    pub line_id: LineItemId,
    pub serial_numbers: Vec<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AssignFieldRep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignFieldRep {
    pub invoice_id: InvoiceId,
    pub line_id: LineItemId,
    pub rep_id: FieldRepId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: LinkPurchaseOrder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkPurchaseOrder {
    pub invoice_id: InvoiceId,
    pub line_id: LineItemId,
    pub po_id: PurchaseOrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SubmitAssignment (every line must be complete).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitAssignment {
    pub invoice_id: InvoiceId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ApproveDispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproveDispatch {
    pub invoice_id: InvoiceId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RejectDispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectDispatch {
    pub invoice_id: InvoiceId,
    pub reason: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: CompleteInvoice (delivery confirmed).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompleteInvoice {
    pub invoice_id: InvoiceId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceCommand {
    CreateInvoice(CreateInvoice),
    AssignSource(AssignSource),
    BulkAssignSource(BulkAssignSource),
    SetSerialNumbers(SetSerialNumbers),
    AssignFieldRep(AssignFieldRep),
    LinkPurchaseOrder(LinkPurchaseOrder),
    SubmitAssignment(SubmitAssignment),
    ApproveDispatch(ApproveDispatch),
    RejectDispatch(RejectDispatch),
    CompleteInvoice(CompleteInvoice),
}

/// Event: InvoiceCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceCreated {
    pub invoice_id: InvoiceId,
    pub customer: Customer,
    pub invoice_date: NaiveDate,
    pub lines: Vec<LineItem>,
    pub total_amount: u64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: LineSourceAssigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineSourceAssigned {
    pub invoice_id: InvoiceId,
    pub line_id: LineItemId,
    pub source: FulfillmentSource,
    pub occurred_at: DateTime<Utc>,
}

/// Event: SerialNumbersRecorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialNumbersRecorded {
    pub invoice_id: InvoiceId,
    pub line_id: LineItemId,
    pub serial_numbers: Vec<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: FieldRepAssigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRepAssigned {
    pub invoice_id: InvoiceId,
    pub line_id: LineItemId,
    pub rep_id: FieldRepId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PurchaseOrderLinked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrderLinked {
    pub invoice_id: InvoiceId,
    pub line_id: LineItemId,
    pub po_id: PurchaseOrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: AssignmentSubmitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentSubmitted {
    pub invoice_id: InvoiceId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: DispatchApproved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchApproved {
    pub invoice_id: InvoiceId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: DispatchRejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchRejected {
    pub invoice_id: InvoiceId,
    pub reason: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: InvoiceCompleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceCompleted {
    pub invoice_id: InvoiceId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceEvent {
    InvoiceCreated(InvoiceCreated),
    LineSourceAssigned(LineSourceAssigned),
    SerialNumbersRecorded(SerialNumbersRecorded),
    FieldRepAssigned(FieldRepAssigned),
    PurchaseOrderLinked(PurchaseOrderLinked),
    AssignmentSubmitted(AssignmentSubmitted),
    DispatchApproved(DispatchApproved),
    DispatchRejected(DispatchRejected),
    InvoiceCompleted(InvoiceCompleted),
}

impl Event for InvoiceEvent {
    fn event_type(&self) -> &'static str {
        match self {
            InvoiceEvent::InvoiceCreated(_) => "fulfillment.invoice.created",
            InvoiceEvent::LineSourceAssigned(_) => "fulfillment.invoice.line_source_assigned",
            InvoiceEvent::SerialNumbersRecorded(_) => "fulfillment.invoice.serial_numbers_recorded",
            InvoiceEvent::FieldRepAssigned(_) => "fulfillment.invoice.field_rep_assigned",
            InvoiceEvent::PurchaseOrderLinked(_) => "fulfillment.invoice.purchase_order_linked",
            InvoiceEvent::AssignmentSubmitted(_) => "fulfillment.invoice.assignment_submitted",
            InvoiceEvent::DispatchApproved(_) => "fulfillment.invoice.dispatch_approved",
            InvoiceEvent::DispatchRejected(_) => "fulfillment.invoice.dispatch_rejected",
            InvoiceEvent::InvoiceCompleted(_) => "fulfillment.invoice.completed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            InvoiceEvent::InvoiceCreated(e) => e.occurred_at,
            InvoiceEvent::LineSourceAssigned(e) => e.occurred_at,
            InvoiceEvent::SerialNumbersRecorded(e) => e.occurred_at,
            InvoiceEvent::FieldRepAssigned(e) => e.occurred_at,
            InvoiceEvent::PurchaseOrderLinked(e) => e.occurred_at,
            InvoiceEvent::AssignmentSubmitted(e) => e.occurred_at,
            InvoiceEvent::DispatchApproved(e) => e.occurred_at,
            InvoiceEvent::DispatchRejected(e) => e.occurred_at,
            InvoiceEvent::InvoiceCompleted(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Invoice {
    type Command = InvoiceCommand;
    type Event = InvoiceEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            InvoiceEvent::InvoiceCreated(e) => {
                self.id = e.invoice_id.clone();
                self.customer = Some(e.customer.clone());
                self.invoice_date = Some(e.invoice_date);
                self.lines = e.lines.clone();
                self.total_amount = e.total_amount;
                self.status = InvoiceStatus::AwaitingFulfillment;
                self.created = true;
            }
            InvoiceEvent::LineSourceAssigned(e) => {
                if let Some(line) = self.line_mut(&e.line_id) {
                    line.assignment = Some(Assignment::for_source(e.source));
                }
            }
            InvoiceEvent::SerialNumbersRecorded(e) => {
                if let Some(slot) = self
                    .line_mut(&e.line_id)
                    .and_then(|l| l.assignment.as_mut())
                    .and_then(Assignment::serial_numbers_mut)
                {
                    *slot = e.serial_numbers.clone();
                }
            }
            InvoiceEvent::FieldRepAssigned(e) => {
                if let Some(slot) = self
                    .line_mut(&e.line_id)
                    .and_then(|l| l.assignment.as_mut())
                    .and_then(Assignment::rep_mut)
                {
                    *slot = Some(e.rep_id.clone());
                }
            }
            InvoiceEvent::PurchaseOrderLinked(e) => {
                if let Some(slot) = self
                    .line_mut(&e.line_id)
                    .and_then(|l| l.assignment.as_mut())
                    .and_then(Assignment::po_id_mut)
                {
                    *slot = Some(e.po_id.clone());
                }
            }
            InvoiceEvent::AssignmentSubmitted(_) => {
                self.status = InvoiceStatus::Assigned;
            }
            InvoiceEvent::DispatchApproved(_) => {
                self.status = InvoiceStatus::Dispatched;
            }
            InvoiceEvent::DispatchRejected(_) => {
                self.status = InvoiceStatus::AwaitingFulfillment;
            }
            InvoiceEvent::InvoiceCompleted(_) => {
                self.status = InvoiceStatus::Completed;
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            InvoiceCommand::CreateInvoice(cmd) => self.handle_create(cmd),
            InvoiceCommand::AssignSource(cmd) => self.handle_assign_source(cmd),
            InvoiceCommand::BulkAssignSource(cmd) => self.handle_bulk_assign(cmd),
            InvoiceCommand::SetSerialNumbers(cmd) => self.handle_set_serials(cmd),
            InvoiceCommand::AssignFieldRep(cmd) => self.handle_assign_rep(cmd),
            InvoiceCommand::LinkPurchaseOrder(cmd) => self.handle_link_po(cmd),
            InvoiceCommand::SubmitAssignment(cmd) => self.handle_submit(cmd),
            InvoiceCommand::ApproveDispatch(cmd) => self.handle_approve(cmd),
            InvoiceCommand::RejectDispatch(cmd) => self.handle_reject(cmd),
            InvoiceCommand::CompleteInvoice(cmd) => self.handle_complete(cmd),
        }
    }
}

impl Invoice {
    fn ensure_exists(&self, invoice_id: &InvoiceId) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        if &self.id != invoice_id {
            return Err(DomainError::invariant("invoice_id mismatch"));
        }
        Ok(())
    }

    fn ensure_editable_line(
        &self,
        invoice_id: &InvoiceId,
        line_id: &LineItemId,
    ) -> Result<&LineItem, DomainError> {
        self.ensure_exists(invoice_id)?;
        if !self.status.allows_assignment_edits() {
            return Err(DomainError::invariant(format!(
                "line items can only be changed while awaiting fulfillment (status: {})",
                self.status
            )));
        }
        self.line(line_id).ok_or_else(DomainError::not_found)
    }

    fn ensure_status(&self, expected: InvoiceStatus, action: &str) -> Result<(), DomainError> {
        if self.status != expected {
            return Err(DomainError::invariant(format!(
                "cannot {action}: invoice is {} (expected {expected})",
                self.status
            )));
        }
        Ok(())
    }

    fn handle_create(&self, cmd: &CreateInvoice) -> Result<Vec<InvoiceEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("invoice already exists"));
        }

        if cmd.lines.is_empty() {
            return Err(DomainError::validation("cannot create invoice without line items"));
        }

        let mut seen = BTreeSet::new();
        let mut total: u64 = 0;
        for line in &cmd.lines {
            if !seen.insert(&line.id) {
                return Err(DomainError::validation(format!(
                    "duplicate line item id {}",
                    line.id
                )));
            }
            if line.quantity == 0 {
                return Err(DomainError::validation("line item quantity must be positive"));
            }
            total = total
                .checked_add(line.line_total()?)
                .ok_or_else(|| DomainError::invariant("invoice total overflow"))?;
        }

        Ok(vec![InvoiceEvent::InvoiceCreated(InvoiceCreated {
            invoice_id: cmd.invoice_id.clone(),
            customer: cmd.customer.clone(),
            invoice_date: cmd.invoice_date,
            lines: cmd.lines.clone(),
            total_amount: total,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_assign_source(&self, cmd: &AssignSource) -> Result<Vec<InvoiceEvent>, DomainError> {
        self.ensure_editable_line(&cmd.invoice_id, &cmd.line_id)?;

        Ok(vec![InvoiceEvent::LineSourceAssigned(LineSourceAssigned {
            invoice_id: cmd.invoice_id.clone(),
            line_id: cmd.line_id.clone(),
            source: cmd.source,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_bulk_assign(&self, cmd: &BulkAssignSource) -> Result<Vec<InvoiceEvent>, DomainError> {
        if cmd.line_ids.is_empty() {
            return Err(DomainError::validation("no line items selected"));
        }

        let mut seen = BTreeSet::new();
        let mut events = Vec::with_capacity(cmd.line_ids.len());
        for line_id in &cmd.line_ids {
            self.ensure_editable_line(&cmd.invoice_id, line_id)?;
            if !seen.insert(line_id) {
                continue;
            }
            events.push(InvoiceEvent::LineSourceAssigned(LineSourceAssigned {
                invoice_id: cmd.invoice_id.clone(),
                line_id: line_id.clone(),
                source: cmd.source,
                occurred_at: cmd.occurred_at,
            }));
        }
        Ok(events)
    }

    fn handle_set_serials(&self, cmd: &SetSerialNumbers) -> Result<Vec<InvoiceEvent>, DomainError> {
        self.ensure_editable_line(&cmd.invoice_id, &cmd.line_id)?
            .ensure_serial_tracked()?;

        Ok(vec![InvoiceEvent::SerialNumbersRecorded(SerialNumbersRecorded {
            invoice_id: cmd.invoice_id.clone(),
            line_id: cmd.line_id.clone(),
            serial_numbers: normalize_serials(&cmd.serial_numbers),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_assign_rep(&self, cmd: &AssignFieldRep) -> Result<Vec<InvoiceEvent>, DomainError> {
        self.ensure_editable_line(&cmd.invoice_id, &cmd.line_id)?
            .ensure_field_rep()?;

        Ok(vec![InvoiceEvent::FieldRepAssigned(FieldRepAssigned {
            invoice_id: cmd.invoice_id.clone(),
            line_id: cmd.line_id.clone(),
            rep_id: cmd.rep_id.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_link_po(&self, cmd: &LinkPurchaseOrder) -> Result<Vec<InvoiceEvent>, DomainError> {
        // One purchase order per line; a second link would orphan the first.
        self.ensure_editable_line(&cmd.invoice_id, &cmd.line_id)?
            .ensure_awaiting_purchase_order()?;

        Ok(vec![InvoiceEvent::PurchaseOrderLinked(PurchaseOrderLinked {
            invoice_id: cmd.invoice_id.clone(),
            line_id: cmd.line_id.clone(),
            po_id: cmd.po_id.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_submit(&self, cmd: &SubmitAssignment) -> Result<Vec<InvoiceEvent>, DomainError> {
        self.ensure_exists(&cmd.invoice_id)?;
        self.ensure_status(InvoiceStatus::AwaitingFulfillment, "submit assignment")?;

        let pending = evaluator::incomplete_items(&self.lines);
        if let Some((line, reason)) = pending.first() {
            return Err(DomainError::invariant(format!(
                "all line items must be fully assigned before submission ({} pending; line {}: {reason})",
                pending.len(),
                line.id
            )));
        }

        Ok(vec![InvoiceEvent::AssignmentSubmitted(AssignmentSubmitted {
            invoice_id: cmd.invoice_id.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_approve(&self, cmd: &ApproveDispatch) -> Result<Vec<InvoiceEvent>, DomainError> {
        self.ensure_exists(&cmd.invoice_id)?;
        self.ensure_status(InvoiceStatus::Assigned, "approve dispatch")?;

        Ok(vec![InvoiceEvent::DispatchApproved(DispatchApproved {
            invoice_id: cmd.invoice_id.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_reject(&self, cmd: &RejectDispatch) -> Result<Vec<InvoiceEvent>, DomainError> {
        self.ensure_exists(&cmd.invoice_id)?;
        self.ensure_status(InvoiceStatus::Assigned, "reject dispatch")?;

        Ok(vec![InvoiceEvent::DispatchRejected(DispatchRejected {
            invoice_id: cmd.invoice_id.clone(),
            reason: cmd.reason.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_complete(&self, cmd: &CompleteInvoice) -> Result<Vec<InvoiceEvent>, DomainError> {
        self.ensure_exists(&cmd.invoice_id)?;
        self.ensure_status(InvoiceStatus::Dispatched, "complete invoice")?;

        Ok(vec![InvoiceEvent::InvoiceCompleted(InvoiceCompleted {
            invoice_id: cmd.invoice_id.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }
}
