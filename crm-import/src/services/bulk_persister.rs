//! Best-effort bulk insert
//!
//! All records go into one transaction; each record gets its own savepoint
//! so a constraint violation rolls back only that row. Infrastructure errors
//! abort the whole batch (the open transaction rolls back on drop).

use crate::db::leads::insert_record;
use crate::error::ImportResult;
use crate::models::{CanonicalRecord, RowFailure};
use sqlx::error::ErrorKind;
use sqlx::{Acquire, SqlitePool};

/// Outcome of one bulk insert
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersistOutcome {
    pub inserted: Vec<CanonicalRecord>,
    pub failures: Vec<RowFailure>,
}

pub struct BulkPersister {
    db: SqlitePool,
}

impl BulkPersister {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn insert_all(&self, records: Vec<CanonicalRecord>) -> ImportResult<PersistOutcome> {
        let mut outcome = PersistOutcome::default();
        if records.is_empty() {
            return Ok(outcome);
        }

        let mut tx = self.db.begin().await?;

        for record in records {
            let mut savepoint = (&mut *tx).begin().await?;

            match insert_record(&mut savepoint, &record).await {
                Ok(guid) => {
                    savepoint.commit().await?;
                    tracing::trace!(row = record.row_number, guid = %guid, "Inserted lead");
                    outcome.inserted.push(record);
                }
                Err(e) if is_row_level(&e) => {
                    savepoint.rollback().await?;
                    tracing::warn!(
                        row = record.row_number,
                        phone = %record.phone_key,
                        error = %e,
                        "Lead insert failed"
                    );
                    outcome.failures.push(RowFailure {
                        row_number: record.row_number,
                        name: record.name,
                        phone_key: record.phone_key,
                        error_message: e.to_string(),
                    });
                }
                Err(e) => return Err(e.into()),
            }
        }

        tx.commit().await?;

        tracing::info!(
            inserted = outcome.inserted.len(),
            failed = outcome.failures.len(),
            "Bulk insert complete"
        );

        Ok(outcome)
    }
}

/// Errors caused by the record's own data rather than the store
fn is_row_level(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => !matches!(db_err.kind(), ErrorKind::Other),
        sqlx::Error::Encode(_) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::leads::{count_records, load_records};
    use crate::models::{Classification, FieldMap, LeadKind, MasterRef};
    use sqlx::sqlite::SqlitePoolOptions;
    use uuid::Uuid;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");
        crm_common::db::initialize_schema(&pool)
            .await
            .expect("Schema initialization failed");
        pool
    }

    fn customer(row_number: usize, phone_key: &str, email: Option<&str>) -> CanonicalRecord {
        CanonicalRecord {
            row_number,
            kind: LeadKind::Customer,
            name: format!("Customer {}", row_number),
            phone_key: phone_key.to_string(),
            email: email.map(str::to_string),
            city: String::new(),
            classification: Classification::default(),
            attributes: FieldMap::new(),
            created_by: Uuid::new_v4(),
            is_imported: true,
        }
    }

    #[tokio::test]
    async fn test_row_failure_does_not_abort_batch() {
        let pool = test_pool().await;
        let persister = BulkPersister::new(pool.clone());

        let outcome = persister
            .insert_all(vec![
                customer(2, "9000000001", Some("a@x.in")),
                customer(3, "9000000002", Some("a@x.in")),
                customer(4, "9000000003", None),
            ])
            .await
            .unwrap();

        assert_eq!(outcome.inserted.len(), 2);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].row_number, 3);
        assert_eq!(outcome.failures[0].phone_key, "9000000002");
        assert!(!outcome.failures[0].error_message.is_empty());

        assert_eq!(count_records(&pool, LeadKind::Customer).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_dangling_classification_is_row_level() {
        let pool = test_pool().await;
        let persister = BulkPersister::new(pool.clone());

        let mut orphan = customer(2, "9000000001", None);
        orphan.classification.campaign = Some(MasterRef {
            id: Uuid::new_v4(),
            name: "Gone".to_string(),
        });

        let outcome = persister
            .insert_all(vec![orphan, customer(3, "9000000002", None)])
            .await
            .unwrap();

        assert_eq!(outcome.failures.len(), 1);
        let stored = load_records(&pool, LeadKind::Customer).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].name, "Customer 3");
    }

    #[tokio::test]
    async fn test_empty_batch_is_noop() {
        let pool = test_pool().await;
        let outcome = BulkPersister::new(pool).insert_all(Vec::new()).await.unwrap();
        assert_eq!(outcome, PersistOutcome::default());
    }

    #[tokio::test]
    async fn test_closed_pool_aborts() {
        let pool = test_pool().await;
        pool.close().await;

        let err = BulkPersister::new(pool)
            .insert_all(vec![customer(2, "9000000001", None)])
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "STORE_ERROR");
    }
}
