//! Database test utilities

use super::fixtures::{write_csv, write_xlsx};
use crm_import::{ImportPipeline, ImportSettings, TempUpload};
use sqlx::SqlitePool;
use std::path::PathBuf;
use tempfile::TempDir;

/// Create a file-backed test database with the full schema
///
/// Returns (TempDir, SqlitePool) - TempDir must be kept alive for duration of test
pub async fn create_test_db() -> (TempDir, SqlitePool) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("crm.db");
    let pool = crm_common::db::init_database(&db_path)
        .await
        .expect("Failed to initialize test database");
    (temp_dir, pool)
}

/// A root folder with database, uploads and summary directories
pub struct TestEnv {
    pub root: TempDir,
    pub pool: SqlitePool,
    pub settings: ImportSettings,
}

impl TestEnv {
    pub async fn new() -> Self {
        let (root, pool) = create_test_db().await;
        let settings = ImportSettings::with_root(root.path());
        std::fs::create_dir_all(&settings.uploads_dir).expect("Failed to create uploads dir");
        Self {
            root,
            pool,
            settings,
        }
    }

    pub fn pipeline(&self) -> ImportPipeline {
        ImportPipeline::new(self.pool.clone(), self.settings.clone())
    }

    /// Write an xlsx fixture straight into the uploads area
    pub fn upload_xlsx(&self, name: &str, rows: &[&[&str]]) -> (TempUpload, PathBuf) {
        let path = self.settings.uploads_dir.join(name);
        write_xlsx(&path, rows);
        (TempUpload::new(path.clone()), path)
    }

    /// Write a delimited-text fixture straight into the uploads area
    pub fn upload_csv(&self, name: &str, content: &str) -> (TempUpload, PathBuf) {
        let path = self.settings.uploads_dir.join(name);
        write_csv(&path, content);
        (TempUpload::new(path.clone()), path)
    }

    /// Files left in the uploads area (the summaries directory excluded)
    pub fn leftover_uploads(&self) -> Vec<PathBuf> {
        std::fs::read_dir(&self.settings.uploads_dir)
            .expect("Failed to list uploads")
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file())
            .collect()
    }
}
