//! Domain layer
//!
//! One directory per aggregate (`model` + `repository`), plus the pure
//! billing computations (`charges`, `bill`).

pub mod balance;
pub mod bill;
pub mod charges;
pub mod rate_table;
pub mod repositories;

pub use balance::{BalanceDocument, BalanceRepository, BalanceStream, ConsumerBalance, UpdateOutcome};
pub use bill::{Bill, BillBuilder, UsagePeriod};
pub use charges::{ChargeBreakdown, ChargeCalculator, ChargeError, Exemptions, SectionRateCalculator};
pub use rate_table::{RateItem, RateSection, RateTable, RateTableDocument, RateTableRepository, RateUnit};
pub use repositories::{DomainResult, RepositoryProvider};

pub use crate::shared::errors::DomainError;
