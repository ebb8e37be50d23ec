//! Charge computation
//!
//! Pure functions from a rate table snapshot and a consumption figure to
//! an itemised charge breakdown.

pub mod calculator;
pub mod model;

pub use calculator::{ChargeCalculator, ChargeError, SectionRateCalculator};
pub use model::{ChargeBreakdown, Exemptions, LineItemCharge, SectionCharge};
