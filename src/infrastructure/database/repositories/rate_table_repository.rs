//! SeaORM implementation of RateTableRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use tracing::info;

use crate::domain::rate_table::{RateTable, RateTableDocument, RateTableRepository};
use crate::domain::DomainResult;
use crate::infrastructure::database::entities::rate_table;

use super::db_err;

fn entity_to_document(m: rate_table::Model) -> RateTableDocument {
    RateTableDocument {
        id: m.id,
        rate_type: m.rate_type,
        effective_date: m.effective_date,
        sections: m.sections,
    }
}

pub struct SeaOrmRateTableRepository {
    db: DatabaseConnection,
}

impl SeaOrmRateTableRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RateTableRepository for SeaOrmRateTableRepository {
    async fn find_active(&self, rate_type: &str) -> DomainResult<Option<RateTable>> {
        let model = rate_table::Entity::find()
            .filter(rate_table::Column::RateType.eq(rate_type))
            .one(&self.db)
            .await
            .map_err(db_err)?;

        model
            .map(|m| RateTable::from_document(entity_to_document(m)))
            .transpose()
    }

    async fn save(&self, table: RateTable) -> DomainResult<RateTable> {
        let doc = table.to_document()?;
        let now = Utc::now();

        let existing = rate_table::Entity::find()
            .filter(rate_table::Column::RateType.eq(doc.rate_type.as_str()))
            .one(&self.db)
            .await
            .map_err(db_err)?;

        let saved = match existing {
            Some(existing) => {
                let mut model: rate_table::ActiveModel = existing.into();
                model.effective_date = Set(doc.effective_date);
                model.sections = Set(doc.sections);
                model.updated_at = Set(now);
                model.update(&self.db).await.map_err(db_err)?
            }
            None => {
                let model = rate_table::ActiveModel {
                    id: Default::default(),
                    rate_type: Set(doc.rate_type),
                    effective_date: Set(doc.effective_date),
                    sections: Set(doc.sections),
                    created_at: Set(now),
                    updated_at: Set(now),
                };
                model.insert(&self.db).await.map_err(db_err)?
            }
        };

        info!(rate_type = %saved.rate_type, id = saved.id, "Rate table saved");
        RateTable::from_document(entity_to_document(saved))
    }
}
