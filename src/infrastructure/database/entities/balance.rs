//! Consumer balance entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Balance model - one row per consumer account
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "balances")]
pub struct Model {
    /// Consumer id
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,

    /// Whether the consumer is billed by the batch
    pub is_active: bool,

    /// Account profile, JSON text
    #[sea_orm(column_type = "Text")]
    pub document: String,

    /// Current bill, JSON text. Replaced on each issuance.
    #[sea_orm(column_type = "Text", nullable)]
    pub current_bill: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
