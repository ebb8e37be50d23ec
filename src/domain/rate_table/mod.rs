//! Rate table aggregate
//!
//! The shared schedule of per-unit charges and fixed fees. Exactly one
//! table is active at a time, selected by its `type` key.

pub mod model;
pub mod repository;

pub use model::{RateItem, RateSection, RateTable, RateTableDocument, RateUnit, DEFAULT_RATE_TYPE};
pub use repository::RateTableRepository;
