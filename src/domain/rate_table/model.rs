//! Rate table domain entity

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, DomainResult};

/// Default discriminator of the active rate table
pub const DEFAULT_RATE_TYPE: &str = "RATES";

/// How a line item rate applies to consumption
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateUnit {
    /// Rate multiplied by the consumed quantity
    #[serde(alias = "per-unit", alias = "unit")]
    PerUnit,
    /// Flat amount regardless of consumption
    #[serde(alias = "flat")]
    Fixed,
}

impl Default for RateUnit {
    fn default() -> Self {
        Self::PerUnit
    }
}

impl std::fmt::Display for RateUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PerUnit => write!(f, "per_unit"),
            Self::Fixed => write!(f, "fixed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateItem {
    pub name: String,
    #[serde(default)]
    pub unit: RateUnit,
    pub rate: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateSection {
    pub name: String,
    /// Per-unit rate applied to the whole consumption
    pub rate: Decimal,
    #[serde(default)]
    pub items: Vec<RateItem>,
}

/// Versioned rate schedule. Immutable once loaded for a run.
#[derive(Debug, Clone, PartialEq)]
pub struct RateTable {
    pub id: i32,
    pub rate_type: String,
    pub effective_date: DateTime<Utc>,
    pub sections: Vec<RateSection>,
}

/// Rate table as persisted: sections are kept as raw JSON text.
#[derive(Debug, Clone)]
pub struct RateTableDocument {
    pub id: i32,
    pub rate_type: String,
    pub effective_date: DateTime<Utc>,
    pub sections: String,
}

impl RateTable {
    pub fn from_document(doc: RateTableDocument) -> DomainResult<Self> {
        let sections: Vec<RateSection> = serde_json::from_str(&doc.sections)
            .map_err(|e| DomainError::decode("RateTable", &doc.rate_type, e))?;

        Ok(Self {
            id: doc.id,
            rate_type: doc.rate_type,
            effective_date: doc.effective_date,
            sections,
        })
    }

    pub fn to_document(&self) -> DomainResult<RateTableDocument> {
        let sections = serde_json::to_string(&self.sections)
            .map_err(|e| DomainError::Validation(format!("Unserializable rate sections: {}", e)))?;

        Ok(RateTableDocument {
            id: self.id,
            rate_type: self.rate_type.clone(),
            effective_date: self.effective_date,
            sections,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(sections: &str) -> RateTableDocument {
        RateTableDocument {
            id: 7,
            rate_type: DEFAULT_RATE_TYPE.into(),
            effective_date: Utc::now(),
            sections: sections.into(),
        }
    }

    #[test]
    fn decodes_sections_with_numeric_and_string_rates() {
        let table = RateTable::from_document(document(
            r#"[
                {"name": "Water", "rate": 1.25, "items": [
                    {"name": "Meter fee", "unit": "fixed", "rate": "3.00"},
                    {"name": "Sewer", "unit": "per_unit", "rate": 0.5}
                ]},
                {"name": "Environmental", "rate": "0.10"}
            ]"#,
        ))
        .unwrap();

        assert_eq!(table.sections.len(), 2);
        let water = &table.sections[0];
        assert_eq!(water.name, "Water");
        assert_eq!(water.rate, Decimal::new(125, 2));
        assert_eq!(water.items[0].unit, RateUnit::Fixed);
        assert_eq!(water.items[1].unit, RateUnit::PerUnit);
        assert_eq!(table.sections[1].name, "Environmental");
        assert!(table.sections[1].items.is_empty());
    }

    #[test]
    fn item_unit_defaults_to_per_unit() {
        let table =
            RateTable::from_document(document(r#"[{"name": "A", "rate": 1, "items": [{"name": "x", "rate": 2}]}]"#))
                .unwrap();
        assert_eq!(table.sections[0].items[0].unit, RateUnit::PerUnit);
    }

    #[test]
    fn undecodable_sections_are_reported_with_type_key() {
        let err = RateTable::from_document(document(r#"{"not": "a list"}"#)).unwrap_err();
        match err {
            DomainError::Decode { entity, key, .. } => {
                assert_eq!(entity, "RateTable");
                assert_eq!(key, DEFAULT_RATE_TYPE);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn document_round_trip_keeps_sections() {
        let table = RateTable::from_document(document(r#"[{"name": "A", "rate": "2.5"}]"#)).unwrap();
        let again = RateTable::from_document(table.to_document().unwrap()).unwrap();
        assert_eq!(table, again);
    }

    #[test]
    fn unit_display() {
        assert_eq!(RateUnit::PerUnit.to_string(), "per_unit");
        assert_eq!(RateUnit::Fixed.to_string(), "fixed");
    }
}
