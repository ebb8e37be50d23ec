//! Database entities module

pub mod balance;
pub mod rate_table;

pub use balance::Entity as Balance;
pub use rate_table::Entity as RateTable;
