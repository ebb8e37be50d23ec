//! Consumer balance aggregate
//!
//! One record per consumer account. The batch reads active records and
//! replaces their embedded current bill.

pub mod model;
pub mod repository;

pub use model::{BalanceDocument, ConsumerBalance, UpdateOutcome};
pub use repository::{BalanceRepository, BalanceStream};
