//! Duplicate detection against persisted leads
//!
//! A record is a duplicate when a stored lead of the same kind has exactly
//! the same canonical phone key. Records within one batch are not compared
//! with each other.

use crate::db::leads::find_existing_phone_keys;
use crate::error::ImportResult;
use crate::models::{CanonicalRecord, LeadKind};
use sqlx::SqlitePool;
use std::collections::HashSet;

/// Batch split into new and already-persisted records
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DuplicatePartition {
    pub unique: Vec<CanonicalRecord>,
    pub duplicates: Vec<CanonicalRecord>,
}

impl DuplicatePartition {
    pub fn total(&self) -> usize {
        self.unique.len() + self.duplicates.len()
    }
}

pub struct DuplicateDetector {
    db: SqlitePool,
}

impl DuplicateDetector {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Partition with one batched existence lookup
    pub async fn partition(
        &self,
        kind: LeadKind,
        batch: Vec<CanonicalRecord>,
    ) -> ImportResult<DuplicatePartition> {
        let mut seen = HashSet::new();
        let keys: Vec<String> = batch
            .iter()
            .map(|r| r.phone_key.clone())
            .filter(|k| seen.insert(k.clone()))
            .collect();

        let existing = find_existing_phone_keys(&self.db, kind, &keys).await?;
        let partition = partition_by_existing(batch, &existing);

        tracing::info!(
            kind = %kind,
            unique = partition.unique.len(),
            duplicates = partition.duplicates.len(),
            "Duplicate detection complete"
        );

        Ok(partition)
    }
}

/// Split by exact key membership, preserving batch order in both halves
pub fn partition_by_existing(
    batch: Vec<CanonicalRecord>,
    existing: &HashSet<String>,
) -> DuplicatePartition {
    let (duplicates, unique) = batch
        .into_iter()
        .partition(|record| existing.contains(&record.phone_key));

    DuplicatePartition { unique, duplicates }
}
