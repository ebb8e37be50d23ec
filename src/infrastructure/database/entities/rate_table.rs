//! Rate table entity

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Rate table model - one row per rate schedule, keyed by `type`
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "rate_tables")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Discriminator selecting the active table (e.g., "RATES")
    #[sea_orm(column_name = "type", unique)]
    pub rate_type: String,

    /// Date the schedule takes effect
    pub effective_date: DateTime<Utc>,

    /// Ordered rate sections, JSON text
    #[sea_orm(column_type = "Text")]
    pub sections: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
