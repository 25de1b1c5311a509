//! Fulfillment completeness rules.
//!
//! A line is *complete* (dispatch-ready) when its assignment carries everything
//! its source needs:
//!
//! | source            | complete when                                   |
//! |-------------------|-------------------------------------------------|
//! | none              | never                                           |
//! | MAIN_HQ / NYAMIRA | serials ≥ quantity                              |
//! | FIELD_REP         | rep assigned **and** serials ≥ quantity         |
//! | OUTSOURCE         | purchase order linked (existence not verified) |
//!
//! Completeness is always computed from the line's current fields; nothing is
//! cached, so a reader never sees a stale answer after an edit.

use serde::{Deserialize, Serialize};

use crate::line_item::LineItem;
use crate::source::{Assignment, FulfillmentSource};

/// Why a line is not yet dispatch-ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum PendingReason {
    Unassigned,
    MissingFieldRep,
    MissingSerials { recorded: usize, required: u32 },
    MissingPurchaseOrder,
}

impl core::fmt::Display for PendingReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PendingReason::Unassigned => f.write_str("no fulfillment source selected"),
            PendingReason::MissingFieldRep => f.write_str("no field rep assigned"),
            PendingReason::MissingSerials { recorded, required } => {
                write!(f, "{recorded} of {required} serial numbers recorded")
            }
            PendingReason::MissingPurchaseOrder => f.write_str("no purchase order linked"),
        }
    }
}

/// Dispatch readiness of a single line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Readiness {
    Ready,
    Pending(PendingReason),
}

impl Readiness {
    pub fn is_ready(self) -> bool {
        matches!(self, Readiness::Ready)
    }
}

/// Classify a line, naming the first missing piece if it is not ready.
pub fn assess(item: &LineItem) -> Readiness {
    let Some(assignment) = &item.assignment else {
        return Readiness::Pending(PendingReason::Unassigned);
    };

    match assignment {
        Assignment::MainHq { serial_numbers } | Assignment::Nyamira { serial_numbers } => {
            serials_cover(serial_numbers, item.quantity)
        }
        Assignment::FieldRep { rep, serial_numbers } => {
            if rep.is_none() {
                Readiness::Pending(PendingReason::MissingFieldRep)
            } else {
                serials_cover(serial_numbers, item.quantity)
            }
        }
        Assignment::Outsource { po_id } => match po_id {
            Some(_) => Readiness::Ready,
            None => Readiness::Pending(PendingReason::MissingPurchaseOrder),
        },
    }
}

// Over-supplying serials is tolerated (>=, not ==).
fn serials_cover(serials: &[String], quantity: u32) -> Readiness {
    if serials.len() >= quantity as usize {
        Readiness::Ready
    } else {
        Readiness::Pending(PendingReason::MissingSerials {
            recorded: serials.len(),
            required: quantity,
        })
    }
}

/// Whether the line's assignment is complete (ready for dispatch).
pub fn is_complete(item: &LineItem) -> bool {
    assess(item).is_ready()
}

/// Whether every line is complete; the gate for submitting an assignment.
pub fn all_complete<'a>(items: impl IntoIterator<Item = &'a LineItem>) -> bool {
    items.into_iter().all(is_complete)
}

/// Lines still pending, with the reason for each.
pub fn incomplete_items<'a>(
    items: impl IntoIterator<Item = &'a LineItem>,
) -> Vec<(&'a LineItem, PendingReason)> {
    items
        .into_iter()
        .filter_map(|item| match assess(item) {
            Readiness::Ready => None,
            Readiness::Pending(reason) => Some((item, reason)),
        })
        .collect()
}

/// Per-source tallies over a set of lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FulfillmentSummary {
    pub main_hq: usize,
    pub nyamira: usize,
    pub field_rep: usize,
    pub outsource: usize,
    pub unassigned: usize,
    pub complete: usize,
    pub total_items: usize,
    pub total_quantity: u64,
}

impl FulfillmentSummary {
    pub fn count_for(&self, source: FulfillmentSource) -> usize {
        match source {
            FulfillmentSource::MainHq => self.main_hq,
            FulfillmentSource::Nyamira => self.nyamira,
            FulfillmentSource::FieldRep => self.field_rep,
            FulfillmentSource::Outsource => self.outsource,
        }
    }

    pub fn assigned(&self) -> usize {
        self.total_items - self.unassigned
    }

    /// complete / total, in `0.0..=1.0`; zero for an empty set.
    pub fn completion_rate(&self) -> f64 {
        if self.total_items == 0 {
            return 0.0;
        }
        self.complete as f64 / self.total_items as f64
    }

    pub fn completion_percent(&self) -> f64 {
        self.completion_rate() * 100.0
    }

    pub fn is_fully_complete(&self) -> bool {
        self.total_items > 0 && self.complete == self.total_items
    }

    fn bucket_mut(&mut self, source: Option<FulfillmentSource>) -> &mut usize {
        match source {
            None => &mut self.unassigned,
            Some(FulfillmentSource::MainHq) => &mut self.main_hq,
            Some(FulfillmentSource::Nyamira) => &mut self.nyamira,
            Some(FulfillmentSource::FieldRep) => &mut self.field_rep,
            Some(FulfillmentSource::Outsource) => &mut self.outsource,
        }
    }
}

/// Single pass: each line lands in exactly one source bucket (or
/// `unassigned`) and is independently counted toward `complete`.
pub fn summarize<'a>(items: impl IntoIterator<Item = &'a LineItem>) -> FulfillmentSummary {
    items.into_iter().fold(FulfillmentSummary::default(), |mut acc, item| {
        *acc.bucket_mut(item.source()) += 1;
        if is_complete(item) {
            acc.complete += 1;
        }
        acc.total_items += 1;
        acc.total_quantity += u64::from(item.quantity);
        acc
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dispatchdesk_core::{FieldRepId, LineItemId, ProductId, PurchaseOrderId};
    use proptest::prelude::*;

    fn line(id: &str, quantity: u32) -> LineItem {
        LineItem::new(
            LineItemId::parse(id).unwrap(),
            ProductId::parse("PROD-003").unwrap(),
            "Office Chair",
            quantity,
            5_000,
        )
        .unwrap()
    }

    fn serials(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("SN{i:03}")).collect()
    }

    fn rep1() -> FieldRepId {
        FieldRepId::parse("rep1").unwrap()
    }

    #[test]
    fn unassigned_line_is_not_complete() {
        let item = line("1", 1);
        assert!(!is_complete(&item));
        assert_eq!(assess(&item), Readiness::Pending(PendingReason::Unassigned));
    }

    #[test]
    fn warehouse_line_needs_serials_covering_quantity() {
        for source in [FulfillmentSource::MainHq, FulfillmentSource::Nyamira] {
            let item = line("1", 3).with_source(source);
            assert!(!is_complete(&item));

            let short = item.with_serial_numbers(serials(2)).unwrap();
            assert_eq!(
                assess(&short),
                Readiness::Pending(PendingReason::MissingSerials { recorded: 2, required: 3 })
            );

            let exact = item.with_serial_numbers(serials(3)).unwrap();
            assert!(is_complete(&exact));

            let extra = item.with_serial_numbers(serials(5)).unwrap();
            assert!(is_complete(&extra));
            assert_eq!(extra.serial_numbers().len(), 5);
        }
    }

    #[test]
    fn field_rep_line_needs_rep_and_serials() {
        let item = line("1", 5).with_source(FulfillmentSource::FieldRep);

        let serials_only = item.with_serial_numbers(serials(5)).unwrap();
        assert_eq!(assess(&serials_only), Readiness::Pending(PendingReason::MissingFieldRep));

        let rep_only = item.with_rep(rep1()).unwrap();
        assert!(!is_complete(&rep_only));

        let both = rep_only.with_serial_numbers(serials(5)).unwrap();
        assert!(is_complete(&both));
    }

    #[test]
    fn field_rep_example_three_of_five_serials_then_five() {
        let item = line("1", 5)
            .with_source(FulfillmentSource::FieldRep)
            .with_rep(rep1())
            .unwrap()
            .with_serial_numbers(["A", "B", "C"])
            .unwrap();
        assert!(!is_complete(&item));

        let topped_up = item.with_serial_numbers(["A", "B", "C", "D", "E"]).unwrap();
        assert!(is_complete(&topped_up));
    }

    #[test]
    fn outsourced_line_needs_only_a_purchase_order() {
        let item = line("1", 40).with_source(FulfillmentSource::Outsource);
        assert_eq!(assess(&item), Readiness::Pending(PendingReason::MissingPurchaseOrder));

        let linked = item
            .with_purchase_order(PurchaseOrderId::parse("PO-1705123456").unwrap())
            .unwrap();
        assert!(is_complete(&linked));
    }

    #[test]
    fn summary_buckets_and_rate() {
        let items = vec![
            line("1", 1)
                .with_source(FulfillmentSource::MainHq)
                .with_serial_numbers(["A"])
                .unwrap(),
            line("2", 2).with_source(FulfillmentSource::Nyamira),
            line("3", 1).with_source(FulfillmentSource::FieldRep),
            line("4", 1)
                .with_source(FulfillmentSource::Outsource)
                .with_purchase_order(PurchaseOrderId::parse("PO-1").unwrap())
                .unwrap(),
            line("5", 3),
        ];

        let summary = summarize(&items);
        assert_eq!(summary.main_hq, 1);
        assert_eq!(summary.nyamira, 1);
        assert_eq!(summary.field_rep, 1);
        assert_eq!(summary.outsource, 1);
        assert_eq!(summary.unassigned, 1);
        assert_eq!(summary.complete, 2);
        assert_eq!(summary.total_items, 5);
        assert_eq!(summary.total_quantity, 8);
        assert_eq!(summary.assigned(), 4);
        assert!((summary.completion_rate() - 0.4).abs() < f64::EPSILON);
        assert!((summary.completion_percent() - 40.0).abs() < 1e-9);
        assert!(!summary.is_fully_complete());

        let pending = incomplete_items(&items);
        assert_eq!(pending.len(), 3);
        assert_eq!(pending[2].1, PendingReason::Unassigned);
        assert!(!all_complete(&items));
    }

    #[test]
    fn empty_summary_has_zero_rate() {
        let summary = summarize(&[]);
        assert_eq!(summary.total_items, 0);
        assert_eq!(summary.completion_rate(), 0.0);
        assert!(!summary.is_fully_complete());
    }

    #[test]
    fn pending_reason_reads_naturally() {
        let reason = PendingReason::MissingSerials { recorded: 3, required: 5 };
        assert_eq!(reason.to_string(), "3 of 5 serial numbers recorded");
    }

    fn arb_line() -> impl Strategy<Value = LineItem> {
        (
            1u32..20,
            prop::option::of(0usize..4),
            prop::bool::ANY,
            prop::bool::ANY,
            0usize..30,
        )
            .prop_map(|(quantity, source_idx, with_rep, with_po, serial_count)| {
                let base = line("p", quantity);
                let Some(idx) = source_idx else {
                    return base;
                };
                let source = FulfillmentSource::ALL[idx];
                let mut item = base.with_source(source);
                if source.tracks_serials() {
                    item = item.with_serial_numbers(serials(serial_count)).unwrap();
                }
                if with_rep && source == FulfillmentSource::FieldRep {
                    item = item.with_rep(rep1()).unwrap();
                }
                if with_po && source == FulfillmentSource::Outsource {
                    item = item
                        .with_purchase_order(PurchaseOrderId::parse("PO-9").unwrap())
                        .unwrap();
                }
                item
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 512,
            ..ProptestConfig::default()
        })]

        /// Property: completeness follows the per-source rule table exactly.
        #[test]
        fn completeness_matches_rule_table(item in arb_line()) {
            let covered = item.serial_numbers().len() >= item.quantity as usize;
            let expected = match item.source() {
                None => false,
                Some(FulfillmentSource::MainHq) | Some(FulfillmentSource::Nyamira) => covered,
                Some(FulfillmentSource::FieldRep) => item.assigned_rep().is_some() && covered,
                Some(FulfillmentSource::Outsource) => item.po_id().is_some(),
            };
            prop_assert_eq!(is_complete(&item), expected);
        }

        /// Property: every line lands in exactly one bucket; complete never exceeds N.
        #[test]
        fn summary_partitions_items(items in prop::collection::vec(arb_line(), 0..40)) {
            let summary = summarize(&items);
            let bucketed: usize = FulfillmentSource::ALL
                .into_iter()
                .map(|s| summary.count_for(s))
                .sum::<usize>()
                + summary.unassigned;

            prop_assert_eq!(bucketed, items.len());
            prop_assert_eq!(summary.total_items, items.len());
            prop_assert!(summary.complete <= items.len());
            prop_assert_eq!(summary.complete, items.iter().filter(|i| is_complete(i)).count());
            prop_assert!((0.0..=1.0).contains(&summary.completion_rate()));
        }

        /// Property: evaluation is pure; repeated calls agree and leave the line unchanged.
        #[test]
        fn evaluation_is_repeatable(item in arb_line()) {
            let before = item.clone();
            let first = assess(&item);
            let second = assess(&item);
            prop_assert_eq!(first, second);
            prop_assert_eq!(before, item);
        }
    }
}
