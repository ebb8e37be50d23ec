//! Storage backends other than the database

pub mod memory;

pub use memory::{InMemoryBalanceRepository, InMemoryRateTableRepository, InMemoryRepositoryProvider};
