//! Database initialization
//!
//! Opens (or creates) the SQLite store and creates the master-data and lead
//! tables. Every `create_*` function is idempotent.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Table holding contact leads
pub const CONTACTS_TABLE: &str = "contacts";

/// Table holding customer leads
pub const CUSTOMERS_TABLE: &str = "customers";

/// Master-data tables, root to leaf
pub const CAMPAIGNS_TABLE: &str = "campaigns";
pub const LEAD_TYPES_TABLE: &str = "lead_types";
pub const LEAD_SUB_TYPES_TABLE: &str = "lead_sub_types";

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // WAL allows readers alongside the import writer
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(5000));

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    initialize_schema(&pool).await?;

    Ok(pool)
}

/// Create every table used by the lead services
pub async fn initialize_schema(pool: &SqlitePool) -> Result<()> {
    create_campaigns_table(pool).await?;
    create_lead_types_table(pool).await?;
    create_lead_sub_types_table(pool).await?;
    create_contacts_table(pool).await?;
    create_customers_table(pool).await?;
    Ok(())
}

/// Level 1 master data. Names are unique across all campaigns.
pub async fn create_campaigns_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS campaigns (
            guid TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'Active' CHECK (status IN ('Active', 'Inactive')),
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (name)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Level 2 master data, scoped to a campaign
pub async fn create_lead_types_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS lead_types (
            guid TEXT PRIMARY KEY,
            campaign_id TEXT NOT NULL REFERENCES campaigns(guid),
            name TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'Active' CHECK (status IN ('Active', 'Inactive')),
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (campaign_id, name)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Level 3 master data, scoped to (campaign, type)
pub async fn create_lead_sub_types_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS lead_sub_types (
            guid TEXT PRIMARY KEY,
            campaign_id TEXT NOT NULL REFERENCES campaigns(guid),
            type_id TEXT NOT NULL REFERENCES lead_types(guid),
            name TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'Active' CHECK (status IN ('Active', 'Inactive')),
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (campaign_id, type_id, name)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Contact leads
pub async fn create_contacts_table(pool: &SqlitePool) -> Result<()> {
    create_lead_table(pool, CONTACTS_TABLE).await
}

/// Customer leads. Non-null emails must be unique.
pub async fn create_customers_table(pool: &SqlitePool) -> Result<()> {
    create_lead_table(pool, CUSTOMERS_TABLE).await?;

    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_customers_email ON customers(email) WHERE email IS NOT NULL",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Both lead tables share one layout; `table` is one of the constants above
async fn create_lead_table(pool: &SqlitePool, table: &str) -> Result<()> {
    let ddl = format!(
        r#"
        CREATE TABLE IF NOT EXISTS {table} (
            guid TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            phone TEXT NOT NULL,
            email TEXT,
            city TEXT NOT NULL DEFAULT '',
            campaign_id TEXT REFERENCES campaigns(guid),
            type_id TEXT REFERENCES lead_types(guid),
            sub_type_id TEXT REFERENCES lead_sub_types(guid),
            attributes TEXT NOT NULL DEFAULT '{{}}',
            created_by TEXT,
            is_imported INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#
    );
    sqlx::query(&ddl).execute(pool).await?;

    let index = format!("CREATE INDEX IF NOT EXISTS idx_{table}_phone ON {table}(phone)");
    sqlx::query(&index).execute(pool).await?;

    Ok(())
}
