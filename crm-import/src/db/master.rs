//! Master-data (campaign / type / sub-type) persistence
//!
//! Names are unique within their scope at the schema level. Creation is an
//! `INSERT ... ON CONFLICT DO NOTHING`, so two writers racing on the same new
//! name both end up reading the single stored row.

use crate::models::{MasterEntity, MasterLevel, MasterScope};
use crm_common::db::MasterStatus;
use crm_common::{Error, Result};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Find a master entry by exact (trimmed) name within its scope
pub async fn find_master(pool: &SqlitePool, name: &str, scope: MasterScope) -> Result<Option<Uuid>> {
    let table = scope.level().table();
    let guid: Option<String> = match scope {
        MasterScope::Root => {
            sqlx::query_scalar(&format!("SELECT guid FROM {} WHERE name = ?", table))
                .bind(name)
                .fetch_optional(pool)
                .await?
        }
        MasterScope::Campaign(campaign_id) => {
            sqlx::query_scalar(&format!(
                "SELECT guid FROM {} WHERE campaign_id = ? AND name = ?",
                table
            ))
            .bind(campaign_id.to_string())
            .bind(name)
            .fetch_optional(pool)
            .await?
        }
        MasterScope::CampaignType { campaign_id, type_id } => {
            sqlx::query_scalar(&format!(
                "SELECT guid FROM {} WHERE campaign_id = ? AND type_id = ? AND name = ?",
                table
            ))
            .bind(campaign_id.to_string())
            .bind(type_id.to_string())
            .bind(name)
            .fetch_optional(pool)
            .await?
        }
    };

    guid.map(|g| parse_guid(&g)).transpose()
}

/// Insert a master entry unless one with the same name exists in the scope
///
/// Returns `true` when this call created the row.
pub async fn insert_master_if_absent(
    pool: &SqlitePool,
    guid: Uuid,
    name: &str,
    scope: MasterScope,
    status: MasterStatus,
) -> Result<bool> {
    let result = match scope {
        MasterScope::Root => {
            sqlx::query(
                "INSERT INTO campaigns (guid, name, status) VALUES (?, ?, ?) ON CONFLICT DO NOTHING",
            )
            .bind(guid.to_string())
            .bind(name)
            .bind(status.as_str())
            .execute(pool)
            .await?
        }
        MasterScope::Campaign(campaign_id) => {
            sqlx::query(
                r#"
                INSERT INTO lead_types (guid, campaign_id, name, status)
                VALUES (?, ?, ?, ?)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(guid.to_string())
            .bind(campaign_id.to_string())
            .bind(name)
            .bind(status.as_str())
            .execute(pool)
            .await?
        }
        MasterScope::CampaignType { campaign_id, type_id } => {
            sqlx::query(
                r#"
                INSERT INTO lead_sub_types (guid, campaign_id, type_id, name, status)
                VALUES (?, ?, ?, ?, ?)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(guid.to_string())
            .bind(campaign_id.to_string())
            .bind(type_id.to_string())
            .bind(name)
            .bind(status.as_str())
            .execute(pool)
            .await?
        }
    };

    Ok(result.rows_affected() == 1)
}

/// All entries of one level, ordered by name
pub async fn list_masters(pool: &SqlitePool, level: MasterLevel) -> Result<Vec<MasterEntity>> {
    let parent_columns = match level {
        MasterLevel::Campaign => "NULL AS campaign_id, NULL AS type_id",
        MasterLevel::Type => "campaign_id, NULL AS type_id",
        MasterLevel::SubType => "campaign_id, type_id",
    };
    let sql = format!(
        "SELECT guid, name, status, {} FROM {} ORDER BY name",
        parent_columns,
        level.table()
    );

    let rows = sqlx::query(&sql).fetch_all(pool).await?;

    rows.iter()
        .map(|row| {
            let guid: String = row.get("guid");
            let status: String = row.get("status");
            let campaign_id: Option<String> = row.get("campaign_id");
            let type_id: Option<String> = row.get("type_id");

            Ok(MasterEntity {
                guid: parse_guid(&guid)?,
                level,
                name: row.get("name"),
                status: status.parse()?,
                campaign_id: campaign_id.as_deref().map(parse_guid).transpose()?,
                type_id: type_id.as_deref().map(parse_guid).transpose()?,
            })
        })
        .collect()
}

pub(crate) fn parse_guid(value: &str) -> Result<Uuid> {
    Uuid::parse_str(value)
        .map_err(|e| Error::Internal(format!("Invalid UUID in database: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

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

    #[tokio::test]
    async fn test_insert_if_absent_is_idempotent() {
        let pool = test_pool().await;

        let first = Uuid::new_v4();
        assert!(insert_master_if_absent(&pool, first, "Monsoon Drive", MasterScope::Root, MasterStatus::Active)
            .await
            .unwrap());

        // Losing writer: same name, different guid
        let second = Uuid::new_v4();
        assert!(!insert_master_if_absent(&pool, second, "Monsoon Drive", MasterScope::Root, MasterStatus::Active)
            .await
            .unwrap());

        let found = find_master(&pool, "Monsoon Drive", MasterScope::Root).await.unwrap();
        assert_eq!(found, Some(first));
    }

    #[tokio::test]
    async fn test_scopes_are_independent() {
        let pool = test_pool().await;

        let campaign_a = Uuid::new_v4();
        let campaign_b = Uuid::new_v4();
        for (guid, name) in [(campaign_a, "A"), (campaign_b, "B")] {
            insert_master_if_absent(&pool, guid, name, MasterScope::Root, MasterStatus::Active)
                .await
                .unwrap();
        }

        let type_a = Uuid::new_v4();
        insert_master_if_absent(&pool, type_a, "Walk-in", MasterScope::Campaign(campaign_a), MasterStatus::Active)
            .await
            .unwrap();

        assert_eq!(
            find_master(&pool, "Walk-in", MasterScope::Campaign(campaign_a)).await.unwrap(),
            Some(type_a)
        );
        assert_eq!(
            find_master(&pool, "Walk-in", MasterScope::Campaign(campaign_b)).await.unwrap(),
            None
        );

        let types = list_masters(&pool, MasterLevel::Type).await.unwrap();
        assert_eq!(types.len(), 1);
        assert_eq!(types[0].campaign_id, Some(campaign_a));
        assert_eq!(types[0].status, MasterStatus::Active);
    }

    #[tokio::test]
    async fn test_name_match_is_case_sensitive() {
        let pool = test_pool().await;
        insert_master_if_absent(&pool, Uuid::new_v4(), "Walk-in", MasterScope::Root, MasterStatus::Active)
            .await
            .unwrap();

        assert!(find_master(&pool, "walk-in", MasterScope::Root).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_each_level_with_parents() {
        let pool = test_pool().await;

        let campaign_id = Uuid::new_v4();
        let type_id = Uuid::new_v4();
        let sub_type_id = Uuid::new_v4();
        insert_master_if_absent(&pool, campaign_id, "Monsoon Drive", MasterScope::Root, MasterStatus::Active)
            .await
            .unwrap();
        insert_master_if_absent(&pool, type_id, "Walk-in", MasterScope::Campaign(campaign_id), MasterStatus::Active)
            .await
            .unwrap();
        let scope = MasterScope::CampaignType { campaign_id, type_id };
        insert_master_if_absent(&pool, sub_type_id, "Weekend", scope, MasterStatus::Inactive)
            .await
            .unwrap();

        let campaigns = list_masters(&pool, MasterLevel::Campaign).await.unwrap();
        assert_eq!(campaigns.len(), 1);
        assert_eq!(campaigns[0].campaign_id, None);

        let sub_types = list_masters(&pool, MasterLevel::SubType).await.unwrap();
        assert_eq!(sub_types.len(), 1);
        assert_eq!(sub_types[0].guid, sub_type_id);
        assert_eq!(sub_types[0].level, MasterLevel::SubType);
        assert_eq!(sub_types[0].campaign_id, Some(campaign_id));
        assert_eq!(sub_types[0].type_id, Some(type_id));
        assert_eq!(sub_types[0].status, MasterStatus::Inactive);

        assert_eq!(find_master(&pool, "Weekend", scope).await.unwrap(), Some(sub_type_id));
    }
}
