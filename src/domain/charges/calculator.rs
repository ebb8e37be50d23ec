//! Charge calculator

use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

use super::model::{ChargeBreakdown, Exemptions, LineItemCharge, SectionCharge};
use crate::domain::rate_table::{RateTable, RateUnit};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChargeError {
    #[error("consumption must not be negative (got {0})")]
    NegativeConsumption(Decimal),

    #[error("amount overflow in section {0}")]
    Overflow(String),
}

/// Computes the charges owed for one consumer.
///
/// Implementations must be pure: no I/O, same output for same input.
pub trait ChargeCalculator: Send + Sync {
    fn calculate(
        &self,
        table: &RateTable,
        consumption: Decimal,
        exemptions: &Exemptions,
    ) -> Result<ChargeBreakdown, ChargeError>;
}

/// Applies every non-exempt section of the table in order.
///
/// A section charges `rate × consumption`; its line items charge either
/// `rate × consumption` or a flat `rate`. Every amount is rounded to
/// cents before it is summed.
#[derive(Debug, Clone, Copy, Default)]
pub struct SectionRateCalculator;

fn money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

impl ChargeCalculator for SectionRateCalculator {
    fn calculate(
        &self,
        table: &RateTable,
        consumption: Decimal,
        exemptions: &Exemptions,
    ) -> Result<ChargeBreakdown, ChargeError> {
        if consumption < Decimal::ZERO {
            return Err(ChargeError::NegativeConsumption(consumption));
        }

        let mut sections = Vec::with_capacity(table.sections.len());
        let mut amount_due = Decimal::ZERO;

        for section in &table.sections {
            if exemptions.exempts_section(&section.name) {
                continue;
            }
            let overflow = || ChargeError::Overflow(section.name.clone());

            let base_amount = money(section.rate.checked_mul(consumption).ok_or_else(overflow)?);
            let mut subtotal = base_amount;
            let mut items = Vec::with_capacity(section.items.len());

            for item in &section.items {
                if exemptions.exempts_item(&item.name) {
                    continue;
                }
                let amount = match item.unit {
                    RateUnit::PerUnit => item.rate.checked_mul(consumption).ok_or_else(overflow)?,
                    RateUnit::Fixed => item.rate,
                };
                let amount = money(amount);
                subtotal = subtotal.checked_add(amount).ok_or_else(overflow)?;
                items.push(LineItemCharge {
                    name: item.name.clone(),
                    unit: item.unit,
                    rate: item.rate,
                    amount,
                });
            }

            amount_due = amount_due.checked_add(subtotal).ok_or_else(overflow)?;
            sections.push(SectionCharge {
                name: section.name.clone(),
                rate: section.rate,
                base_amount,
                items,
                subtotal,
            });
        }

        Ok(ChargeBreakdown {
            rate_table_id: table.id,
            rate_table_date: table.effective_date,
            sections,
            amount_due,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::domain::rate_table::{RateItem, RateSection};

    fn d(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    fn sample_table() -> RateTable {
        RateTable {
            id: 3,
            rate_type: "RATES".into(),
            effective_date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            sections: vec![
                RateSection {
                    name: "Water".into(),
                    rate: d("1.25"),
                    items: vec![
                        RateItem { name: "Meter fee".into(), unit: RateUnit::Fixed, rate: d("3.00") },
                        RateItem { name: "Sewer".into(), unit: RateUnit::PerUnit, rate: d("0.505") },
                    ],
                },
                RateSection {
                    name: "Environmental".into(),
                    rate: d("0.10"),
                    items: vec![],
                },
            ],
        }
    }

    #[test]
    fn applies_all_sections_and_items() {
        let bd = SectionRateCalculator
            .calculate(&sample_table(), d("10"), &Exemptions::none())
            .unwrap();

        // Water: 12.50 base + 3.00 fixed + 5.05 sewer = 20.55
        // Environmental: 1.00
        assert_eq!(bd.section_count(), 2);
        assert_eq!(bd.sections[0].base_amount, d("12.50"));
        assert_eq!(bd.sections[0].items[1].amount, d("5.05"));
        assert_eq!(bd.sections[0].subtotal, d("20.55"));
        assert_eq!(bd.sections[1].subtotal, d("1.00"));
        assert_eq!(bd.amount_due, d("21.55"));
        assert_eq!(bd.rate_table_id, 3);
    }

    #[test]
    fn rounds_each_amount_half_away_from_zero() {
        // 0.505 × 1 = 0.505 → 0.51
        let bd = SectionRateCalculator
            .calculate(&sample_table(), d("1"), &Exemptions::none())
            .unwrap();
        assert_eq!(bd.sections[0].items[1].amount, d("0.51"));
    }

    #[test]
    fn exempt_section_is_skipped() {
        let mut exemptions = Exemptions::none();
        exemptions.sections.insert("Water".into());

        let bd = SectionRateCalculator
            .calculate(&sample_table(), d("10"), &exemptions)
            .unwrap();
        assert_eq!(bd.section_count(), 1);
        assert_eq!(bd.sections[0].name, "Environmental");
        assert_eq!(bd.amount_due, d("1.00"));
    }

    #[test]
    fn exempt_item_is_skipped() {
        let mut exemptions = Exemptions::none();
        exemptions.items.insert("Meter fee".into());

        let bd = SectionRateCalculator
            .calculate(&sample_table(), d("10"), &exemptions)
            .unwrap();
        assert_eq!(bd.sections[0].items.len(), 1);
        assert_eq!(bd.sections[0].subtotal, d("17.55"));
    }

    #[test]
    fn zero_consumption_still_charges_fixed_items() {
        let bd = SectionRateCalculator
            .calculate(&sample_table(), Decimal::ZERO, &Exemptions::none())
            .unwrap();
        assert_eq!(bd.amount_due, d("3.00"));
    }

    #[test]
    fn negative_consumption_is_rejected() {
        let err = SectionRateCalculator
            .calculate(&sample_table(), d("-1"), &Exemptions::none())
            .unwrap_err();
        assert_eq!(err, ChargeError::NegativeConsumption(d("-1")));
    }

    #[test]
    fn overflow_is_reported_not_panicked() {
        let mut table = sample_table();
        table.sections[0].rate = Decimal::MAX;
        let err = SectionRateCalculator
            .calculate(&table, d("2"), &Exemptions::none())
            .unwrap_err();
        assert_eq!(err, ChargeError::Overflow("Water".into()));
    }

    #[test]
    fn identical_inputs_give_identical_output() {
        let table = sample_table();
        let a = SectionRateCalculator.calculate(&table, d("42.5"), &Exemptions::none()).unwrap();
        let b = SectionRateCalculator.calculate(&table, d("42.5"), &Exemptions::none()).unwrap();
        assert_eq!(a, b);
    }
}
