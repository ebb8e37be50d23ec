//! In-memory storage implementation

use std::sync::atomic::{AtomicI32, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use futures_util::{stream, StreamExt};

use crate::domain::balance::{BalanceDocument, BalanceRepository, BalanceStream, UpdateOutcome};
use crate::domain::bill::Bill;
use crate::domain::rate_table::{RateTable, RateTableDocument, RateTableRepository};
use crate::domain::repositories::RepositoryProvider;
use crate::domain::{DomainError, DomainResult};

/// Rate tables keyed by their type discriminator
pub struct InMemoryRateTableRepository {
    tables: DashMap<String, RateTableDocument>,
    id_counter: AtomicI32,
}

impl InMemoryRateTableRepository {
    pub fn new() -> Self {
        Self {
            tables: DashMap::new(),
            id_counter: AtomicI32::new(1),
        }
    }

    /// Store a raw document as-is, without validating its sections.
    pub fn insert_document(&self, doc: RateTableDocument) {
        self.tables.insert(doc.rate_type.clone(), doc);
    }
}

impl Default for InMemoryRateTableRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RateTableRepository for InMemoryRateTableRepository {
    async fn find_active(&self, rate_type: &str) -> DomainResult<Option<RateTable>> {
        let doc = self.tables.get(rate_type).map(|entry| entry.value().clone());
        doc.map(RateTable::from_document).transpose()
    }

    async fn save(&self, mut table: RateTable) -> DomainResult<RateTable> {
        table.id = match self.tables.get(&table.rate_type) {
            Some(existing) => existing.id,
            None => self.id_counter.fetch_add(1, Ordering::SeqCst),
        };
        self.insert_document(table.to_document()?);
        Ok(table)
    }
}

#[derive(Debug, Clone)]
struct StoredBalance {
    doc: BalanceDocument,
    current_bill: Option<String>,
}

/// Balance records keyed by consumer id
pub struct InMemoryBalanceRepository {
    records: DashMap<i64, StoredBalance>,
}

impl InMemoryBalanceRepository {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }
}

impl Default for InMemoryBalanceRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BalanceRepository for InMemoryBalanceRepository {
    async fn stream_active<'a>(&'a self) -> DomainResult<BalanceStream<'a>> {
        // Snapshot first so no shard lock is held across await points
        let active: Vec<DomainResult<BalanceDocument>> = self
            .records
            .iter()
            .filter(|entry| entry.doc.is_active)
            .map(|entry| Ok(entry.doc.clone()))
            .collect();

        Ok(stream::iter(active).boxed())
    }

    async fn replace_current_bill(&self, id: i64, bill: &Bill) -> DomainResult<UpdateOutcome> {
        let json = serde_json::to_string(bill)
            .map_err(|e| DomainError::Validation(format!("Unserializable bill {}: {}", bill.id, e)))?;

        let Some(mut record) = self.records.get_mut(&id) else {
            return Ok(UpdateOutcome::default());
        };

        let modified = record.current_bill.as_deref() != Some(json.as_str());
        record.current_bill = Some(json);

        Ok(UpdateOutcome {
            matched: 1,
            modified: u64::from(modified),
        })
    }

    async fn find_by_id(&self, id: i64) -> DomainResult<Option<BalanceDocument>> {
        Ok(self.records.get(&id).map(|r| r.doc.clone()))
    }

    async fn current_bill(&self, id: i64) -> DomainResult<Option<Bill>> {
        let raw = self.records.get(&id).and_then(|r| r.current_bill.clone());
        raw.map(|json| serde_json::from_str(&json).map_err(|e| DomainError::decode("Bill", id, e)))
            .transpose()
    }

    async fn save(&self, doc: BalanceDocument) -> DomainResult<()> {
        match self.records.get_mut(&doc.id) {
            Some(mut existing) => existing.doc = doc,
            None => {
                self.records.insert(
                    doc.id,
                    StoredBalance {
                        doc,
                        current_bill: None,
                    },
                );
            }
        }
        Ok(())
    }
}

/// In-memory repositories for development and testing
#[derive(Default)]
pub struct InMemoryRepositoryProvider {
    pub rate_tables: InMemoryRateTableRepository,
    pub balances: InMemoryBalanceRepository,
}

impl InMemoryRepositoryProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RepositoryProvider for InMemoryRepositoryProvider {
    fn rate_tables(&self) -> &dyn RateTableRepository {
        &self.rate_tables
    }

    fn balances(&self) -> &dyn BalanceRepository {
        &self.balances
    }
}
