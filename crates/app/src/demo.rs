//! Demo data: the invoices, field reps and supplier purchase orders the
//! dashboard starts with.
//!
//! Everything is created through the desk's own commands, so seeded state
//! obeys the same rules as user input.

use chrono::NaiveDate;

use dispatchdesk_core::{DomainError, DomainResult, FieldRepId, InvoiceId, LineItemId, ProductId, PurchaseOrderId};
use dispatchdesk_fulfillment::{FulfillmentSource, LineItem};
use dispatchdesk_parties::{FieldRep, FieldRepRoster};

use crate::desk::{FulfillmentDesk, NewInvoice, NewPurchaseOrder};
use crate::error::DeskResult;

type LineSeed = (&'static str, &'static str, &'static str, u32, u64);

const INV_003_LINES: &[LineSeed] = &[
    ("4", "PROD-001", "Laptop Dell XPS 13", 5, 65_000),
    ("5", "PROD-002", "Wireless Mouse", 10, 2_500),
    ("6", "PROD-004", "Mechanical Keyboard", 8, 4_500),
    ("7", "PROD-005", "USB-C Hub", 12, 3_200),
    ("8", "PROD-006", "External Monitor 24\"", 6, 18_000),
    ("9", "PROD-007", "Webcam HD", 15, 2_800),
    ("10", "PROD-008", "Desk Lamp LED", 20, 1_500),
    ("11", "PROD-009", "Ergonomic Mouse Pad", 25, 800),
    ("12", "PROD-010", "Cable Management Kit", 18, 1_200),
    ("13", "PROD-011", "Surge Protector", 10, 2_200),
    ("14", "PROD-012", "Wireless Presenter", 5, 3_500),
    ("15", "PROD-013", "Bluetooth Headphones", 12, 5_500),
    ("16", "PROD-014", "Portable SSD 1TB", 8, 8_500),
    ("17", "PROD-015", "USB Flash Drive 64GB", 30, 1_200),
    ("18", "PROD-016", "Laptop Stand", 10, 2_800),
    ("19", "PROD-017", "Document Scanner", 3, 15_000),
    ("20", "PROD-018", "Label Printer", 4, 12_000),
    ("21", "PROD-019", "Network Switch 8-Port", 2, 8_500),
    ("22", "PROD-020", "Wireless Router", 3, 6_500),
    ("23", "PROD-021", "UPS Battery Backup", 5, 12_500),
    ("24", "PROD-022", "Conference Phone", 2, 22_000),
    ("25", "PROD-023", "Projector Portable", 1, 35_000),
];

pub fn field_reps() -> DomainResult<FieldRepRoster> {
    FieldRepRoster::from_reps([
        FieldRep::new(FieldRepId::parse("rep1")?, "John Doe", "+254712345678", "Nairobi CBD")?,
        FieldRep::new(FieldRepId::parse("rep2")?, "Jane Smith", "+254723456789", "Westlands")?,
        FieldRep::new(FieldRepId::parse("rep3")?, "Mike Johnson", "+254734567890", "Karen")?,
    ])
}

/// A desk holding the full demo data set.
pub fn seeded_desk(currency: &str) -> DeskResult<FulfillmentDesk> {
    let mut desk = FulfillmentDesk::new(field_reps()?).with_currency(currency);
    seed(&mut desk)?;
    Ok(desk)
}

pub fn seed(desk: &mut FulfillmentDesk) -> DeskResult<()> {
    // INV-001: laptops outsourced with an unpaid PO, mice still unassigned.
    let inv_001 = InvoiceId::parse("INV-001")?;
    desk.create_invoice(NewInvoice {
        invoice_id: inv_001.clone(),
        customer_name: "Acme Corp".to_string(),
        customer_phone: "+254712345678".to_string(),
        invoice_date: date(2024, 1, 15)?,
        lines: lines(&[
            ("1", "PROD-001", "Laptop Dell XPS 13", 2, 65_000),
            ("2", "PROD-002", "Wireless Mouse", 3, 2_500),
        ])?,
    })?;
    let line_1 = LineItemId::parse("1")?;
    desk.assign_source(&inv_001, &line_1, FulfillmentSource::Outsource)?;
    desk.create_purchase_order(
        &inv_001,
        &line_1,
        supplier_order("PO-1705123456", "Tech Supplies Ltd", "+254712345678", 55_000)?,
    )?;

    // INV-002: chairs bought in full from a supplier and submitted for dispatch.
    let inv_002 = InvoiceId::parse("INV-002")?;
    desk.create_invoice(NewInvoice {
        invoice_id: inv_002.clone(),
        customer_name: "Tech Solutions Ltd".to_string(),
        customer_phone: "+254723456789".to_string(),
        invoice_date: date(2024, 1, 16)?,
        lines: lines(&[("3", "PROD-003", "Office Chair", 5, 5_000)])?,
    })?;
    let line_3 = LineItemId::parse("3")?;
    desk.assign_source(&inv_002, &line_3, FulfillmentSource::Outsource)?;
    let po_002 = PurchaseOrderId::parse("PO-1705123457")?;
    desk.create_purchase_order(
        &inv_002,
        &line_3,
        supplier_order(po_002.as_str(), "Office Furniture Co", "+254723456789", 4_000)?,
    )?;
    desk.log_payment(&po_002, "4000", "RBK1234567", None, Some(date(2024, 1, 18)?))?;
    desk.submit_assignment(&inv_002)?;

    // INV-003: a large order, partly assigned.
    let inv_003 = InvoiceId::parse("INV-003")?;
    desk.create_invoice(NewInvoice {
        invoice_id: inv_003.clone(),
        customer_name: "Enterprise Corp".to_string(),
        customer_phone: "+254734567890".to_string(),
        invoice_date: date(2024, 1, 17)?,
        lines: lines(INV_003_LINES)?,
    })?;
    let line_4 = LineItemId::parse("4")?;
    desk.assign_source(&inv_003, &line_4, FulfillmentSource::MainHq)?;
    desk.enter_serial_numbers(&inv_003, &line_4, "DXPS-0001\nDXPS-0002\nDXPS-0003\nDXPS-0004\nDXPS-0005")?;

    let line_5 = LineItemId::parse("5")?;
    desk.assign_source(&inv_003, &line_5, FulfillmentSource::FieldRep)?;
    desk.assign_field_rep(&inv_003, &line_5, &FieldRepId::parse("rep2")?)?;
    desk.enter_serial_numbers(&inv_003, &line_5, "WM-101, WM-102, WM-103")?;

    desk.bulk_assign_source(
        &inv_003,
        &[LineItemId::parse("9")?, LineItemId::parse("10")?],
        FulfillmentSource::Nyamira,
    )?;

    let line_19 = LineItemId::parse("19")?;
    desk.assign_source(&inv_003, &line_19, FulfillmentSource::Outsource)?;
    let po_003 = PurchaseOrderId::parse("PO-1705123458")?;
    desk.create_purchase_order(
        &inv_003,
        &line_19,
        supplier_order(po_003.as_str(), "Electronics Hub", "+254734567890", 12_000)?,
    )?;
    desk.log_payment(&po_003, "6000", "RBK2345678", None, Some(date(2024, 1, 17)?))?;

    tracing::info!(
        invoices = desk.invoices().count(),
        purchase_orders = desk.purchase_orders().count(),
        field_reps = desk.roster().len(),
        "demo data seeded"
    );
    Ok(())
}

fn lines(seeds: &[LineSeed]) -> DomainResult<Vec<LineItem>> {
    seeds
        .iter()
        .map(|&(id, product_id, name, quantity, unit_price)| {
            LineItem::new(
                LineItemId::parse(id)?,
                ProductId::parse(product_id)?,
                name,
                quantity,
                unit_price,
            )
        })
        .collect()
}

fn supplier_order(
    po_id: &str,
    supplier_name: &str,
    supplier_phone: &str,
    purchase_price: u64,
) -> DomainResult<NewPurchaseOrder> {
    Ok(NewPurchaseOrder {
        po_id: Some(PurchaseOrderId::parse(po_id)?),
        supplier_name: supplier_name.to_string(),
        supplier_phone: supplier_phone.to_string(),
        purchase_price,
    })
}

fn date(year: i32, month: u32, day: u32) -> DomainResult<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| DomainError::validation(format!("invalid date {year}-{month}-{day}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dispatchdesk_fulfillment::InvoiceStatus;
    use dispatchdesk_purchasing::PaymentStatus;

    #[test]
    fn seeds_the_dashboard_state() {
        let desk = seeded_desk("KES").unwrap();
        let dashboard = desk.dashboard().unwrap();

        assert_eq!(dashboard.invoices.len(), 3);
        assert_eq!(dashboard.invoice_status.awaiting_fulfillment, 2);
        assert_eq!(dashboard.invoice_status.assigned, 1);

        assert_eq!(dashboard.payments.unpaid, 1);
        assert_eq!(dashboard.payments.partial, 1);
        assert_eq!(dashboard.payments.paid, 1);
        assert_eq!(dashboard.payments.total_outstanding, 55_000 + 6_000);
    }

    #[test]
    fn seeded_purchase_orders_match_their_lines() {
        let desk = seeded_desk("KES").unwrap();
        let po = desk
            .purchase_order(&PurchaseOrderId::parse("PO-1705123458").unwrap())
            .unwrap();
        assert_eq!(po.selling_price(), 15_000);
        assert_eq!(po.status(), PaymentStatus::Partial);

        let inv = desk.invoice(&InvoiceId::parse("INV-002").unwrap()).unwrap();
        assert_eq!(inv.status(), InvoiceStatus::Assigned);
        assert_eq!(inv.total_amount(), 25_000);
    }

    #[test]
    fn roster_has_three_reps() {
        let roster = field_reps().unwrap();
        assert_eq!(roster.len(), 3);
        assert!(roster.contains(&FieldRepId::parse("rep1").unwrap()));
    }
}
