use serde::{Deserialize, Serialize};

use dispatchdesk_core::{
    DomainError, DomainResult, Entity, FieldRepId, LineItemId, ProductId, PurchaseOrderId,
};

use crate::source::{Assignment, FulfillmentSource};

/// One product line within an invoice, with its own fulfillment assignment.
///
/// Updates are persistent: every `with_*` method returns a new line and leaves
/// `self` untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: LineItemId,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    /// Price in whole currency units.
    pub unit_price: u64,
    pub assignment: Option<Assignment>,
}

impl LineItem {
    /// Create an unassigned line. Quantity must be positive.
    pub fn new(
        id: LineItemId,
        product_id: ProductId,
        product_name: impl Into<String>,
        quantity: u32,
        unit_price: u64,
    ) -> DomainResult<Self> {
        if quantity == 0 {
            return Err(DomainError::validation("line item quantity must be positive"));
        }
        Ok(Self {
            id,
            product_id,
            product_name: product_name.into(),
            quantity,
            unit_price,
            assignment: None,
        })
    }

    pub fn source(&self) -> Option<FulfillmentSource> {
        self.assignment.as_ref().map(Assignment::source)
    }

    pub fn serial_numbers(&self) -> &[String] {
        self.assignment
            .as_ref()
            .map(Assignment::serial_numbers)
            .unwrap_or(&[])
    }

    pub fn assigned_rep(&self) -> Option<&FieldRepId> {
        self.assignment.as_ref().and_then(Assignment::rep)
    }

    pub fn po_id(&self) -> Option<&PurchaseOrderId> {
        self.assignment.as_ref().and_then(Assignment::po_id)
    }

    /// quantity × unit price, checked.
    pub fn line_total(&self) -> DomainResult<u64> {
        u64::from(self.quantity)
            .checked_mul(self.unit_price)
            .ok_or_else(|| DomainError::invariant("line item amount overflow"))
    }

    /// Switch to `source`, discarding serials, rep and purchase order.
    pub fn with_source(&self, source: FulfillmentSource) -> LineItem {
        LineItem {
            assignment: Some(Assignment::for_source(source)),
            ..self.clone()
        }
    }

    /// Fails unless the line's source records serial numbers.
    pub fn ensure_serial_tracked(&self) -> DomainResult<()> {
        match self.source() {
            Some(source) if source.tracks_serials() => Ok(()),
            _ => Err(DomainError::validation(format!(
                "line item {} has no serial-tracked source (assign MAIN_HQ, NYAMIRA or FIELD_REP first)",
                self.id
            ))),
        }
    }

    pub fn ensure_field_rep(&self) -> DomainResult<()> {
        if self.source() == Some(FulfillmentSource::FieldRep) {
            return Ok(());
        }
        Err(DomainError::validation(format!(
            "line item {} is not assigned to FIELD_REP",
            self.id
        )))
    }

    /// Fails unless the line is outsourced and not yet linked to a purchase order.
    pub fn ensure_awaiting_purchase_order(&self) -> DomainResult<()> {
        if self.source() != Some(FulfillmentSource::Outsource) {
            return Err(DomainError::validation(format!(
                "line item {} is not assigned to OUTSOURCE",
                self.id
            )));
        }
        if let Some(existing) = self.po_id() {
            return Err(DomainError::conflict(format!(
                "line item {} is already linked to purchase order {existing}",
                self.id
            )));
        }
        Ok(())
    }

    /// Replace the recorded serial numbers.
    ///
    /// Entries are trimmed and blanks dropped. Supplying more serials than the
    /// quantity is allowed; the list is kept as given.
    pub fn with_serial_numbers<I, S>(&self, serials: I) -> DomainResult<LineItem>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.ensure_serial_tracked()?;
        let mut next = self.clone();
        if let Some(slot) = next.assignment.as_mut().and_then(Assignment::serial_numbers_mut) {
            *slot = normalize_serials(serials);
        }
        Ok(next)
    }

    pub fn with_rep(&self, rep: FieldRepId) -> DomainResult<LineItem> {
        self.ensure_field_rep()?;
        let mut next = self.clone();
        if let Some(slot) = next.assignment.as_mut().and_then(Assignment::rep_mut) {
            *slot = Some(rep);
        }
        Ok(next)
    }

    /// Link a purchase order. A line holds at most one; relinking is a conflict.
    pub fn with_purchase_order(&self, po_id: PurchaseOrderId) -> DomainResult<LineItem> {
        self.ensure_awaiting_purchase_order()?;
        let mut next = self.clone();
        if let Some(slot) = next.assignment.as_mut().and_then(Assignment::po_id_mut) {
            *slot = Some(po_id);
        }
        Ok(next)
    }
}

impl Entity for LineItem {
    type Id = LineItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Split free-form serial input (one per line, or comma separated).
pub fn parse_serial_numbers(input: &str) -> Vec<String> {
    normalize_serials(input.split(['\n', ',']))
}

pub(crate) fn normalize_serials<I, S>(serials: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    serials
        .into_iter()
        .map(|s| s.as_ref().trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(quantity: u32) -> LineItem {
        LineItem::new(
            LineItemId::parse("1").unwrap(),
            ProductId::parse("PROD-001").unwrap(),
            "Laptop Dell XPS 13",
            quantity,
            65_000,
        )
        .unwrap()
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let err = LineItem::new(
            LineItemId::parse("1").unwrap(),
            ProductId::parse("PROD-001").unwrap(),
            "Laptop",
            0,
            100,
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(msg) if msg.contains("quantity")));
    }

    #[test]
    fn changing_source_clears_previous_assignment_data() {
        let item = line(2)
            .with_source(FulfillmentSource::FieldRep)
            .with_rep(FieldRepId::parse("rep1").unwrap())
            .unwrap()
            .with_serial_numbers(["SN1", "SN2"])
            .unwrap();
        assert_eq!(item.serial_numbers().len(), 2);

        let moved = item.with_source(FulfillmentSource::MainHq);
        assert_eq!(moved.source(), Some(FulfillmentSource::MainHq));
        assert!(moved.serial_numbers().is_empty());
        assert!(moved.assigned_rep().is_none());

        // Original value is untouched.
        assert_eq!(item.source(), Some(FulfillmentSource::FieldRep));
        assert_eq!(item.assigned_rep().map(FieldRepId::as_str), Some("rep1"));
    }

    #[test]
    fn serials_need_a_serial_tracked_source() {
        let err = line(1).with_serial_numbers(["SN1"]).unwrap_err();
        assert!(err.is_validation());

        let err = line(1)
            .with_source(FulfillmentSource::Outsource)
            .with_serial_numbers(["SN1"])
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn rep_only_on_field_rep_and_po_only_on_outsource() {
        let warehouse = line(1).with_source(FulfillmentSource::Nyamira);
        assert!(warehouse.with_rep(FieldRepId::parse("rep1").unwrap()).is_err());
        assert!(warehouse.with_purchase_order(PurchaseOrderId::parse("PO-1").unwrap()).is_err());

        let outsourced = line(1)
            .with_source(FulfillmentSource::Outsource)
            .with_purchase_order(PurchaseOrderId::parse("PO-1").unwrap())
            .unwrap();
        assert_eq!(outsourced.po_id().map(PurchaseOrderId::as_str), Some("PO-1"));

        let err = outsourced
            .with_purchase_order(PurchaseOrderId::parse("PO-2").unwrap())
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn guards_check_source_without_changing_the_line() {
        let item = line(2).with_source(FulfillmentSource::FieldRep);
        assert!(item.ensure_serial_tracked().is_ok());
        assert!(item.ensure_field_rep().is_ok());
        assert!(item.ensure_awaiting_purchase_order().unwrap_err().is_validation());
        assert!(line(2).ensure_serial_tracked().unwrap_err().is_validation());
    }

    #[test]
    fn serial_input_is_trimmed_and_blanks_dropped() {
        assert_eq!(
            parse_serial_numbers(" SN1 \n\nSN2,  ,SN3\n"),
            vec!["SN1".to_string(), "SN2".to_string(), "SN3".to_string()]
        );
    }

    #[test]
    fn over_supplied_serials_are_kept() {
        let item = line(1)
            .with_source(FulfillmentSource::MainHq)
            .with_serial_numbers(["A", "B", "C"])
            .unwrap();
        assert_eq!(item.serial_numbers().len(), 3);
    }

    #[test]
    fn line_total_multiplies_quantity_and_price() {
        assert_eq!(line(2).line_total().unwrap(), 130_000);

        let mut huge = line(2);
        huge.unit_price = u64::MAX;
        assert!(matches!(huge.line_total(), Err(DomainError::InvariantViolation(_))));
    }
}
