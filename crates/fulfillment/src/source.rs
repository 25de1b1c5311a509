use core::str::FromStr;

use serde::{Deserialize, Serialize};

use dispatchdesk_core::{DomainError, FieldRepId, PurchaseOrderId};

/// Where a line item's stock is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FulfillmentSource {
    /// Head-office warehouse.
    MainHq,
    /// Nyamira branch warehouse.
    Nyamira,
    /// A field representative's stock pool.
    FieldRep,
    /// Bought in from an outside supplier against a purchase order.
    Outsource,
}

impl FulfillmentSource {
    pub const ALL: [FulfillmentSource; 4] = [
        FulfillmentSource::MainHq,
        FulfillmentSource::Nyamira,
        FulfillmentSource::FieldRep,
        FulfillmentSource::Outsource,
    ];

    /// Stable wire/config name (`MAIN_HQ`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            FulfillmentSource::MainHq => "MAIN_HQ",
            FulfillmentSource::Nyamira => "NYAMIRA",
            FulfillmentSource::FieldRep => "FIELD_REP",
            FulfillmentSource::Outsource => "OUTSOURCE",
        }
    }

    /// Human label as shown on the dashboard.
    pub fn label(self) -> &'static str {
        match self {
            FulfillmentSource::MainHq => "Main HQ",
            FulfillmentSource::Nyamira => "Nyamira",
            FulfillmentSource::FieldRep => "Field Rep",
            FulfillmentSource::Outsource => "Outsource",
        }
    }

    /// Fixed warehouse locations, as opposed to reps and suppliers.
    pub fn is_warehouse(self) -> bool {
        matches!(self, FulfillmentSource::MainHq | FulfillmentSource::Nyamira)
    }

    /// Sources whose stock is tracked by serial number.
    pub fn tracks_serials(self) -> bool {
        !matches!(self, FulfillmentSource::Outsource)
    }
}

impl core::fmt::Display for FulfillmentSource {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FulfillmentSource {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        FulfillmentSource::ALL
            .into_iter()
            .find(|source| source.as_str() == normalized)
            .ok_or_else(|| {
                DomainError::validation(format!(
                    "unknown fulfillment source '{s}' (expected one of: MAIN_HQ, NYAMIRA, FIELD_REP, OUTSOURCE)"
                ))
            })
    }
}

/// A line item's fulfillment assignment.
///
/// One payload shape per source: serials only exist for stock-holding
/// sources, a rep only for `FIELD_REP`, a purchase order only for `OUTSOURCE`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Assignment {
    MainHq {
        serial_numbers: Vec<String>,
    },
    Nyamira {
        serial_numbers: Vec<String>,
    },
    FieldRep {
        rep: Option<FieldRepId>,
        serial_numbers: Vec<String>,
    },
    Outsource {
        po_id: Option<PurchaseOrderId>,
    },
}

impl Assignment {
    /// A fresh assignment to `source` with nothing filled in yet.
    pub fn for_source(source: FulfillmentSource) -> Self {
        match source {
            FulfillmentSource::MainHq => Assignment::MainHq { serial_numbers: Vec::new() },
            FulfillmentSource::Nyamira => Assignment::Nyamira { serial_numbers: Vec::new() },
            FulfillmentSource::FieldRep => Assignment::FieldRep {
                rep: None,
                serial_numbers: Vec::new(),
            },
            FulfillmentSource::Outsource => Assignment::Outsource { po_id: None },
        }
    }

    pub fn source(&self) -> FulfillmentSource {
        match self {
            Assignment::MainHq { .. } => FulfillmentSource::MainHq,
            Assignment::Nyamira { .. } => FulfillmentSource::Nyamira,
            Assignment::FieldRep { .. } => FulfillmentSource::FieldRep,
            Assignment::Outsource { .. } => FulfillmentSource::Outsource,
        }
    }

    /// Serials recorded so far (empty for outsourced lines).
    pub fn serial_numbers(&self) -> &[String] {
        match self {
            Assignment::MainHq { serial_numbers }
            | Assignment::Nyamira { serial_numbers }
            | Assignment::FieldRep { serial_numbers, .. } => serial_numbers,
            Assignment::Outsource { .. } => &[],
        }
    }

    pub fn rep(&self) -> Option<&FieldRepId> {
        match self {
            Assignment::FieldRep { rep, .. } => rep.as_ref(),
            _ => None,
        }
    }

    pub fn po_id(&self) -> Option<&PurchaseOrderId> {
        match self {
            Assignment::Outsource { po_id } => po_id.as_ref(),
            _ => None,
        }
    }

    pub(crate) fn serial_numbers_mut(&mut self) -> Option<&mut Vec<String>> {
        match self {
            Assignment::MainHq { serial_numbers }
            | Assignment::Nyamira { serial_numbers }
            | Assignment::FieldRep { serial_numbers, .. } => Some(serial_numbers),
            Assignment::Outsource { .. } => None,
        }
    }

    pub(crate) fn rep_mut(&mut self) -> Option<&mut Option<FieldRepId>> {
        match self {
            Assignment::FieldRep { rep, .. } => Some(rep),
            _ => None,
        }
    }

    pub(crate) fn po_id_mut(&mut self) -> Option<&mut Option<PurchaseOrderId>> {
        match self {
            Assignment::Outsource { po_id } => Some(po_id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wire_names_leniently() {
        assert_eq!("MAIN_HQ".parse::<FulfillmentSource>().unwrap(), FulfillmentSource::MainHq);
        assert_eq!("field-rep".parse::<FulfillmentSource>().unwrap(), FulfillmentSource::FieldRep);
        assert_eq!(" outsource ".parse::<FulfillmentSource>().unwrap(), FulfillmentSource::Outsource);
    }

    #[test]
    fn unknown_source_is_a_validation_error() {
        let err = "WAREHOUSE_9".parse::<FulfillmentSource>().unwrap_err();
        assert!(matches!(err, DomainError::Validation(msg) if msg.contains("WAREHOUSE_9")));
    }

    #[test]
    fn fresh_assignment_matches_its_source() {
        for source in FulfillmentSource::ALL {
            let assignment = Assignment::for_source(source);
            assert_eq!(assignment.source(), source);
            assert!(assignment.serial_numbers().is_empty());
            assert!(assignment.rep().is_none());
            assert!(assignment.po_id().is_none());
        }
    }

    #[test]
    fn serializes_with_source_tag() {
        let assignment = Assignment::Outsource {
            po_id: Some(PurchaseOrderId::parse("PO-1").unwrap()),
        };
        let json = serde_json::to_value(&assignment).unwrap();
        assert_eq!(json["source"], "OUTSOURCE");
        assert_eq!(json["po_id"], "PO-1");
    }

    #[test]
    fn only_outsource_skips_serial_tracking() {
        assert!(FulfillmentSource::MainHq.tracks_serials());
        assert!(FulfillmentSource::FieldRep.tracks_serials());
        assert!(!FulfillmentSource::Outsource.tracks_serials());
        assert!(!FulfillmentSource::FieldRep.is_warehouse());
    }
}
