//! SeaORM implementation of BalanceRepository

use async_trait::async_trait;
use futures_util::StreamExt;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, DatabaseConnection, EntityTrait,
    QueryFilter, Set,
};

use crate::domain::balance::{BalanceDocument, BalanceRepository, BalanceStream, UpdateOutcome};
use crate::domain::bill::Bill;
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::balance;

use super::db_err;

fn entity_to_document(m: balance::Model) -> BalanceDocument {
    BalanceDocument {
        id: m.id,
        is_active: m.is_active,
        document: m.document,
    }
}

pub struct SeaOrmBalanceRepository {
    db: DatabaseConnection,
}

impl SeaOrmBalanceRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BalanceRepository for SeaOrmBalanceRepository {
    async fn stream_active<'a>(&'a self) -> DomainResult<BalanceStream<'a>> {
        let rows = balance::Entity::find()
            .filter(balance::Column::IsActive.eq(true))
            .stream(&self.db)
            .await
            .map_err(db_err)?;

        Ok(rows
            .map(|row| row.map(entity_to_document).map_err(db_err))
            .boxed())
    }

    async fn replace_current_bill(&self, id: i64, bill: &Bill) -> DomainResult<UpdateOutcome> {
        let json = serde_json::to_string(bill)
            .map_err(|e| DomainError::Validation(format!("Unserializable bill {}: {}", bill.id, e)))?;

        let result = balance::Entity::update_many()
            .col_expr(balance::Column::CurrentBill, Expr::value(Some(json)))
            .filter(balance::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        // Rows affected is the matched count for a keyed update
        Ok(UpdateOutcome {
            matched: result.rows_affected,
            modified: result.rows_affected,
        })
    }

    async fn find_by_id(&self, id: i64) -> DomainResult<Option<BalanceDocument>> {
        let model = balance::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(entity_to_document))
    }

    async fn current_bill(&self, id: i64) -> DomainResult<Option<Bill>> {
        let model = balance::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;

        let Some(raw) = model.and_then(|m| m.current_bill) else {
            return Ok(None);
        };

        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| DomainError::decode("Bill", id, e))
    }

    async fn save(&self, doc: BalanceDocument) -> DomainResult<()> {
        let existing = balance::Entity::find_by_id(doc.id)
            .one(&self.db)
            .await
            .map_err(db_err)?;

        match existing {
            Some(existing) => {
                let mut model: balance::ActiveModel = existing.into();
                model.is_active = Set(doc.is_active);
                model.document = Set(doc.document);
                model.update(&self.db).await.map_err(db_err)?;
            }
            None => {
                let model = balance::ActiveModel {
                    id: Set(doc.id),
                    is_active: Set(doc.is_active),
                    document: Set(doc.document),
                    current_bill: NotSet,
                };
                model.insert(&self.db).await.map_err(db_err)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use futures_util::TryStreamExt;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    use super::*;
    use crate::domain::balance::ConsumerBalance;
    use crate::domain::bill::BillBuilder;
    use crate::domain::charges::ChargeBreakdown;
    use crate::infrastructure::database::test_connection;

    fn balance(id: i64, active: bool) -> BalanceDocument {
        ConsumerBalance {
            id,
            account_number: format!("ACC-{id}"),
            is_active: active,
            consumer_class: "Commercial".into(),
            meter_number: format!("M-{id}"),
        }
        .to_document()
        .unwrap()
    }

    fn bill() -> Bill {
        let now = Utc::now();
        let consumer = ConsumerBalance::decode(&balance(1, true)).unwrap();
        let charges = ChargeBreakdown {
            rate_table_id: 1,
            rate_table_date: now,
            sections: vec![],
            amount_due: Decimal::new(1250, 2),
        };
        BillBuilder::default().build(Uuid::new_v4(), now, &consumer, Decimal::TEN, charges)
    }

    #[tokio::test]
    async fn streams_active_records_only() {
        let repo = SeaOrmBalanceRepository::new(test_connection().await);
        repo.save(balance(1, true)).await.unwrap();
        repo.save(balance(2, false)).await.unwrap();
        repo.save(balance(3, true)).await.unwrap();

        let mut ids: Vec<i64> = repo
            .stream_active()
            .await
            .unwrap()
            .map_ok(|doc| doc.id)
            .try_collect()
            .await
            .unwrap();
        ids.sort_unstable();

        assert_eq!(ids, vec![1, 3]);
    }

    #[tokio::test]
    async fn replaces_only_the_current_bill() {
        let repo = SeaOrmBalanceRepository::new(test_connection().await);
        let doc = balance(1, true);
        repo.save(doc.clone()).await.unwrap();
        let bill = bill();

        let outcome = repo.replace_current_bill(1, &bill).await.unwrap();

        assert_eq!(outcome.matched, 1);
        assert_eq!(repo.current_bill(1).await.unwrap(), Some(bill));
        assert_eq!(repo.find_by_id(1).await.unwrap(), Some(doc));
    }

    #[tokio::test]
    async fn unknown_key_matches_nothing() {
        let repo = SeaOrmBalanceRepository::new(test_connection().await);

        let outcome = repo.replace_current_bill(404, &bill()).await.unwrap();

        assert!(outcome.matched_none());
        assert_eq!(repo.current_bill(404).await.unwrap(), None);
    }

    #[tokio::test]
    async fn updates_proceed_while_the_cursor_is_open() {
        let repo = SeaOrmBalanceRepository::new(test_connection().await);
        for id in 1..=300 {
            repo.save(balance(id, true)).await.unwrap();
        }
        let bill = bill();

        let mut stream = repo.stream_active().await.unwrap();
        let mut matched = 0;
        while let Some(doc) = stream.next().await {
            let doc = doc.unwrap();
            matched += repo.replace_current_bill(doc.id, &bill).await.unwrap().matched;
        }
        drop(stream);

        assert_eq!(matched, 300);
        assert_eq!(repo.current_bill(300).await.unwrap(), Some(bill));
    }

    #[tokio::test]
    async fn resave_keeps_current_bill() {
        let repo = SeaOrmBalanceRepository::new(test_connection().await);
        repo.save(balance(1, true)).await.unwrap();
        let bill = bill();
        repo.replace_current_bill(1, &bill).await.unwrap();

        repo.save(balance(1, false)).await.unwrap();

        assert!(!repo.find_by_id(1).await.unwrap().unwrap().is_active);
        assert_eq!(repo.current_bill(1).await.unwrap(), Some(bill));
    }
}
