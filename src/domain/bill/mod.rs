//! Bill value object
//!
//! Embedded in a balance record as its `currentBill` and replaced
//! wholesale on every issuance.

pub mod builder;
pub mod model;

pub use builder::BillBuilder;
pub use model::{Bill, UsagePeriod};
