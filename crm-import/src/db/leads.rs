//! Contact / customer lead persistence

use crate::db::master::parse_guid;
use crate::models::{CanonicalRecord, FieldMap, LeadKind, PersistedRecord};
use crm_common::{Error, Result};
use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection, SqlitePool};
use std::collections::HashSet;
use uuid::Uuid;

/// Keys per `IN (...)` query, below SQLite's bound-parameter limit
const QUERY_CHUNK_SIZE: usize = 900;

/// Subset of `keys` already stored as a lead phone (exact string match)
pub async fn find_existing_phone_keys(
    pool: &SqlitePool,
    kind: LeadKind,
    keys: &[String],
) -> Result<HashSet<String>> {
    let mut existing = HashSet::new();

    for chunk in keys.chunks(QUERY_CHUNK_SIZE) {
        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT DISTINCT phone FROM {} WHERE phone IN (", kind.table()));
        {
            let mut separated = query.separated(", ");
            for key in chunk {
                separated.push_bind(key.as_str());
            }
        }
        query.push(")");

        let found: Vec<String> = query.build_query_scalar().fetch_all(pool).await?;
        existing.extend(found);
    }

    Ok(existing)
}

/// Insert one lead on the given connection (typically a savepoint)
///
/// Returns the raw sqlx error so callers can tell constraint violations from
/// infrastructure failures.
pub async fn insert_record(
    conn: &mut SqliteConnection,
    record: &CanonicalRecord,
) -> std::result::Result<Uuid, sqlx::Error> {
    let guid = Uuid::new_v4();
    let sql = format!(
        r#"
        INSERT INTO {} (
            guid, name, phone, email, city,
            campaign_id, type_id, sub_type_id,
            attributes, created_by, is_imported,
            created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        "#,
        record.kind.table()
    );

    let class = &record.classification;
    sqlx::query(&sql)
        .bind(guid.to_string())
        .bind(&record.name)
        .bind(&record.phone_key)
        .bind(&record.email)
        .bind(&record.city)
        .bind(class.campaign.as_ref().map(|r| r.id.to_string()))
        .bind(class.lead_type.as_ref().map(|r| r.id.to_string()))
        .bind(class.sub_type.as_ref().map(|r| r.id.to_string()))
        .bind(record.attributes.to_json().to_string())
        .bind(record.created_by.to_string())
        .bind(record.is_imported)
        .execute(&mut *conn)
        .await?;

    Ok(guid)
}

/// All leads of one kind in insertion order, classification names joined in
pub async fn load_records(pool: &SqlitePool, kind: LeadKind) -> Result<Vec<PersistedRecord>> {
    let sql = format!(
        r#"
        SELECT l.guid, l.name, l.phone, l.email, l.city,
               c.name AS campaign, t.name AS lead_type, s.name AS sub_type,
               l.attributes, l.created_by, l.is_imported
        FROM {} l
        LEFT JOIN campaigns c ON c.guid = l.campaign_id
        LEFT JOIN lead_types t ON t.guid = l.type_id
        LEFT JOIN lead_sub_types s ON s.guid = l.sub_type_id
        ORDER BY l.rowid
        "#,
        kind.table()
    );

    let rows = sqlx::query(&sql).fetch_all(pool).await?;

    rows.iter()
        .map(|row| {
            let guid: String = row.get("guid");
            let attributes: String = row.get("attributes");
            let created_by: Option<String> = row.get("created_by");

            let attributes: serde_json::Value = serde_json::from_str(&attributes)
                .map_err(|e| Error::Internal(format!("Invalid attributes JSON: {}", e)))?;

            Ok(PersistedRecord {
                guid: parse_guid(&guid)?,
                kind,
                name: row.get("name"),
                phone: row.get("phone"),
                email: row.get("email"),
                city: row.get("city"),
                campaign: row.get("campaign"),
                lead_type: row.get("lead_type"),
                sub_type: row.get("sub_type"),
                attributes: FieldMap::from_json(&attributes),
                created_by: created_by.as_deref().map(parse_guid).transpose()?,
                is_imported: row.get("is_imported"),
            })
        })
        .collect()
}

/// Number of stored leads of one kind
pub async fn count_records(pool: &SqlitePool, kind: LeadKind) -> Result<i64> {
    let sql = format!("SELECT COUNT(*) FROM {}", kind.table());
    let count: i64 = sqlx::query_scalar(&sql).fetch_one(pool).await?;
    Ok(count)
}
