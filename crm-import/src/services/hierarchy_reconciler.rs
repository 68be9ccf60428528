//! Hierarchy reconciler
//!
//! Resolves free-text Campaign / Type / SubType names against the master-data
//! tree, creating missing entries as Active. A level is only attempted when
//! its parent resolved. Blank names never fail; they leave the level (and
//! everything below it) unresolved.
//!
//! Lookups are cached for the lifetime of the reconciler (one import run), so
//! each distinct (scope, name) costs at most one round trip.

use crate::db::master::{find_master, insert_master_if_absent};
use crate::error::{ImportError, ImportResult};
use crate::models::{
    Classification, ClassificationNames, MasterLevel, MasterRef, MasterScope, Resolution,
};
use crm_common::db::MasterStatus;
use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::HashMap;
use uuid::Uuid;

/// Entries created during one run, per level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CreationStats {
    pub campaigns: usize,
    pub types: usize,
    pub sub_types: usize,
}

impl CreationStats {
    fn record(&mut self, level: MasterLevel) {
        match level {
            MasterLevel::Campaign => self.campaigns += 1,
            MasterLevel::Type => self.types += 1,
            MasterLevel::SubType => self.sub_types += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.campaigns + self.types + self.sub_types
    }
}

/// Find-or-create over the classification tree
pub struct HierarchyReconciler {
    db: SqlitePool,
    cache: HashMap<(MasterScope, String), Uuid>,
    created: CreationStats,
}

impl HierarchyReconciler {
    pub fn new(db: SqlitePool) -> Self {
        Self {
            db,
            cache: HashMap::new(),
            created: CreationStats::default(),
        }
    }

    /// Resolve one name within its scope, creating it if absent
    ///
    /// Creation is `INSERT ... ON CONFLICT DO NOTHING`; a writer that loses the
    /// race re-reads and reports the winner's entry as `Found`.
    pub async fn resolve(&mut self, name: &str, scope: MasterScope) -> ImportResult<Resolution> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ImportError::validation(format!(
                "{} name must not be blank",
                scope.level()
            )));
        }

        let key = (scope, name.to_string());
        if let Some(id) = self.cache.get(&key) {
            return Ok(Resolution::Found(*id));
        }

        let resolution = match find_master(&self.db, name, scope).await? {
            Some(id) => Resolution::Found(id),
            None => self.create(name, scope).await?,
        };

        self.cache.insert(key, resolution.id());
        Ok(resolution)
    }

    async fn create(&mut self, name: &str, scope: MasterScope) -> ImportResult<Resolution> {
        let level = scope.level();
        let guid = Uuid::new_v4();

        if insert_master_if_absent(&self.db, guid, name, scope, MasterStatus::Active).await? {
            self.created.record(level);
            tracing::info!(level = %level, name, id = %guid, "Created master entry");
            return Ok(Resolution::Created(guid));
        }

        // Another writer created it between our lookup and insert
        let id = find_master(&self.db, name, scope).await?.ok_or_else(|| {
            ImportError::Internal(format!("{} '{}' vanished after insert conflict", level, name))
        })?;
        tracing::debug!(level = %level, name, id = %id, "Master entry created concurrently");
        Ok(Resolution::Found(id))
    }

    /// Resolve a full classification, top-down
    pub async fn reconcile(&mut self, names: &ClassificationNames) -> ImportResult<Classification> {
        let mut classification = Classification::default();

        let Some(campaign_name) = non_blank(&names.campaign) else {
            return Ok(classification);
        };
        let campaign_id = self.resolve(campaign_name, MasterScope::Root).await?.id();
        classification.campaign = Some(master_ref(campaign_id, campaign_name));

        let Some(type_name) = non_blank(&names.lead_type) else {
            return Ok(classification);
        };
        let type_id = self
            .resolve(type_name, MasterScope::Campaign(campaign_id))
            .await?
            .id();
        classification.lead_type = Some(master_ref(type_id, type_name));

        if let Some(sub_type_name) = non_blank(&names.sub_type) {
            let scope = MasterScope::CampaignType {
                campaign_id,
                type_id,
            };
            let sub_type_id = self.resolve(sub_type_name, scope).await?.id();
            classification.sub_type = Some(master_ref(sub_type_id, sub_type_name));
        }

        Ok(classification)
    }

    pub fn created(&self) -> CreationStats {
        self.created
    }
}

fn non_blank(name: &Option<String>) -> Option<&str> {
    name.as_deref().map(str::trim).filter(|n| !n.is_empty())
}

fn master_ref(id: Uuid, name: &str) -> MasterRef {
    MasterRef {
        id,
        name: name.to_string(),
    }
}
