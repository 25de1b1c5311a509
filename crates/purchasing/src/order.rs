use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use dispatchdesk_core::{
    Aggregate, AggregateRoot, DomainError, InvoiceId, LineItemId, ProductId, PurchaseOrderId,
};
use dispatchdesk_events::Event;
use dispatchdesk_parties::Supplier;

use crate::payment::{PaymentDetail, PaymentStatus};
use crate::reconciler;

/// Aggregate root: PurchaseOrder.
///
/// Placed with a supplier to fulfil exactly one invoice line. The payment
/// history is append-only; the payment status is derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseOrder {
    id: PurchaseOrderId,
    invoice_id: Option<InvoiceId>,
    line_item_id: Option<LineItemId>,
    product_id: Option<ProductId>,
    supplier: Option<Supplier>,
    purchase_price: u64,
    selling_price: u64,
    payments: Vec<PaymentDetail>,
    version: u64,
    created: bool,
}

impl PurchaseOrder {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: PurchaseOrderId) -> Self {
        Self {
            id,
            invoice_id: None,
            line_item_id: None,
            product_id: None,
            supplier: None,
            purchase_price: 0,
            selling_price: 0,
            payments: Vec::new(),
            version: 0,
            created: false,
        }
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    pub fn invoice_id(&self) -> Option<&InvoiceId> {
        self.invoice_id.as_ref()
    }

    pub fn line_item_id(&self) -> Option<&LineItemId> {
        self.line_item_id.as_ref()
    }

    pub fn product_id(&self) -> Option<&ProductId> {
        self.product_id.as_ref()
    }

    pub fn supplier(&self) -> Option<&Supplier> {
        self.supplier.as_ref()
    }

    /// What we pay the supplier, in whole currency units.
    pub fn purchase_price(&self) -> u64 {
        self.purchase_price
    }

    /// What the customer pays for the line, in whole currency units.
    pub fn selling_price(&self) -> u64 {
        self.selling_price
    }

    pub fn payments(&self) -> &[PaymentDetail] {
        &self.payments
    }

    pub fn status(&self) -> PaymentStatus {
        reconciler::derive_status(self)
    }
}

impl AggregateRoot for PurchaseOrder {
    type Id = PurchaseOrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreatePurchaseOrder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePurchaseOrder {
    pub po_id: PurchaseOrderId,
    pub invoice_id: InvoiceId,
    pub line_item_id: LineItemId,
    pub product_id: ProductId,
    pub supplier: Supplier,
    pub purchase_price: u64,
    pub selling_price: u64,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RecordPayment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordPayment {
    pub po_id: PurchaseOrderId,
    pub amount: u64,
    pub reference: String,
    pub proof_of_payment: Option<String>,
    pub payment_date: NaiveDate,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PurchaseOrderCommand {
    CreatePurchaseOrder(CreatePurchaseOrder),
    RecordPayment(RecordPayment),
}

/// Event: PurchaseOrderCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrderCreated {
    pub po_id: PurchaseOrderId,
    pub invoice_id: InvoiceId,
    pub line_item_id: LineItemId,
    pub product_id: ProductId,
    pub supplier: Supplier,
    pub purchase_price: u64,
    pub selling_price: u64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PaymentRecorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecorded {
    pub po_id: PurchaseOrderId,
    pub payment: PaymentDetail,
    pub new_total_paid: u64,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PurchaseOrderEvent {
    PurchaseOrderCreated(PurchaseOrderCreated),
    PaymentRecorded(PaymentRecorded),
}

impl Event for PurchaseOrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            PurchaseOrderEvent::PurchaseOrderCreated(_) => "purchasing.order.created",
            PurchaseOrderEvent::PaymentRecorded(_) => "purchasing.order.payment_recorded",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            PurchaseOrderEvent::PurchaseOrderCreated(e) => e.occurred_at,
            PurchaseOrderEvent::PaymentRecorded(e) => e.occurred_at,
        }
    }
}

impl Aggregate for PurchaseOrder {
    type Command = PurchaseOrderCommand;
    type Event = PurchaseOrderEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            PurchaseOrderEvent::PurchaseOrderCreated(e) => {
                self.id = e.po_id.clone();
                self.invoice_id = Some(e.invoice_id.clone());
                self.line_item_id = Some(e.line_item_id.clone());
                self.product_id = Some(e.product_id.clone());
                self.supplier = Some(e.supplier.clone());
                self.purchase_price = e.purchase_price;
                self.selling_price = e.selling_price;
                self.payments.clear();
                self.created = true;
            }
            PurchaseOrderEvent::PaymentRecorded(e) => {
                self.payments.push(e.payment.clone());
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            PurchaseOrderCommand::CreatePurchaseOrder(cmd) => self.handle_create(cmd),
            PurchaseOrderCommand::RecordPayment(cmd) => self.handle_record_payment(cmd),
        }
    }
}

impl PurchaseOrder {
    fn ensure_po_id(&self, po_id: &PurchaseOrderId) -> Result<(), DomainError> {
        if &self.id != po_id {
            return Err(DomainError::invariant("po_id mismatch"));
        }
        Ok(())
    }

    fn handle_create(
        &self,
        cmd: &CreatePurchaseOrder,
    ) -> Result<Vec<PurchaseOrderEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("purchase order already exists"));
        }

        if cmd.purchase_price == 0 {
            return Err(DomainError::validation("purchase price must be positive"));
        }

        // Fields are public on `Supplier`; re-check what the constructor enforces.
        let supplier = Supplier::new(cmd.supplier.name.clone(), cmd.supplier.phone.clone())?;

        Ok(vec![PurchaseOrderEvent::PurchaseOrderCreated(
            PurchaseOrderCreated {
                po_id: cmd.po_id.clone(),
                invoice_id: cmd.invoice_id.clone(),
                line_item_id: cmd.line_item_id.clone(),
                product_id: cmd.product_id.clone(),
                supplier,
                purchase_price: cmd.purchase_price,
                selling_price: cmd.selling_price,
                occurred_at: cmd.occurred_at,
            },
        )])
    }

    fn handle_record_payment(
        &self,
        cmd: &RecordPayment,
    ) -> Result<Vec<PurchaseOrderEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_po_id(&cmd.po_id)?;

        let payment = PaymentDetail::new(
            cmd.amount,
            cmd.reference.clone(),
            cmd.proof_of_payment.clone(),
            cmd.payment_date,
        )?;

        // Surfaces an already-overpaid history as an invariant violation.
        let outstanding = reconciler::outstanding(self)?;
        if payment.amount_paid > outstanding {
            return Err(DomainError::validation(format!(
                "amount exceeds outstanding balance of {outstanding}"
            )));
        }

        let new_total_paid = reconciler::total_paid(self) + payment.amount_paid;

        Ok(vec![PurchaseOrderEvent::PaymentRecorded(PaymentRecorded {
            po_id: cmd.po_id.clone(),
            payment,
            new_total_paid,
            occurred_at: cmd.occurred_at,
        })])
    }
}
