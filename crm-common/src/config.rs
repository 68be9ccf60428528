//! Configuration loading and root folder resolution

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "CRM_ROOT_FOLDER";

/// Database file name inside the root folder
pub const DATABASE_FILE_NAME: &str = "crm.db";

/// Contents of `config.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Root folder holding the database and uploads
    #[serde(default)]
    pub root_folder: Option<String>,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Bulk import settings
    #[serde(default)]
    pub import: ImportSection,
}

/// `[logging]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default tracing filter directive (overridden by `RUST_LOG`)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// `[import]` section. Unset values fall back to the importer's defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportSection {
    /// Directory receiving reconciliation summary workbooks
    #[serde(default)]
    pub summary_dir: Option<String>,

    /// Country calling code stripped from phone numbers (e.g. "91")
    #[serde(default)]
    pub country_code: Option<String>,

    /// Minimum digit count for a phone token to be kept
    #[serde(default)]
    pub min_phone_digits: Option<usize>,
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Load the platform config file, falling back to defaults
///
/// A missing file is normal; an unparsable file is logged and ignored.
pub fn load_default_config() -> TomlConfig {
    let path = match config_file_path() {
        Ok(path) => path,
        Err(e) => {
            debug!("No config file: {}", e);
            return TomlConfig::default();
        }
    };

    match load_toml_config(&path) {
        Ok(config) => {
            debug!("Loaded config from {}", path.display());
            config
        }
        Err(e) => {
            warn!("Ignoring config file: {}", e);
            TomlConfig::default()
        }
    }
}

/// Root folder resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file
/// 4. OS-dependent default (fallback)
pub fn resolve_root_folder(
    cli_arg: Option<&str>,
    env_var_name: &str,
    config: &TomlConfig,
) -> PathBuf {
    if let Some(path) = cli_arg {
        return PathBuf::from(path);
    }

    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(root_folder) = &config.root_folder {
        return PathBuf::from(root_folder);
    }

    default_root_folder()
}

/// Create the root folder if missing and return the database path inside it
pub fn prepare_root_folder(root_folder: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(root_folder).map_err(|e| {
        Error::Config(format!(
            "Failed to create root folder {}: {}",
            root_folder.display(),
            e
        ))
    })?;
    Ok(root_folder.join(DATABASE_FILE_NAME))
}

/// Get configuration file path for the platform
fn config_file_path() -> Result<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("crm").join("config.toml"));

    if let Some(path) = user_config {
        if path.exists() {
            return Ok(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/crm/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }
    }

    Err(Error::Config("No config file found".to_string()))
}

/// Get OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        dirs::data_local_dir()
            .map(|d| d.join("crm"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/crm"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("crm"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/crm"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("crm"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\crm"))
    } else {
        PathBuf::from("./crm_data")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    const TEST_ENV: &str = "CRM_TEST_ROOT_FOLDER";

    #[test]
    #[serial]
    fn test_cli_argument_wins() {
        std::env::set_var(TEST_ENV, "/from/env");
        let config = TomlConfig {
            root_folder: Some("/from/toml".to_string()),
            ..Default::default()
        };

        let root = resolve_root_folder(Some("/from/cli"), TEST_ENV, &config);
        assert_eq!(root, PathBuf::from("/from/cli"));

        std::env::remove_var(TEST_ENV);
    }

    #[test]
    #[serial]
    fn test_env_overrides_toml() {
        std::env::set_var(TEST_ENV, "/from/env");
        let config = TomlConfig {
            root_folder: Some("/from/toml".to_string()),
            ..Default::default()
        };

        let root = resolve_root_folder(None, TEST_ENV, &config);
        assert_eq!(root, PathBuf::from("/from/env"));

        std::env::remove_var(TEST_ENV);
    }

    #[test]
    #[serial]
    fn test_toml_then_default() {
        std::env::remove_var(TEST_ENV);
        let config = TomlConfig {
            root_folder: Some("/from/toml".to_string()),
            ..Default::default()
        };
        assert_eq!(
            resolve_root_folder(None, TEST_ENV, &config),
            PathBuf::from("/from/toml")
        );

        let fallback = resolve_root_folder(None, TEST_ENV, &TomlConfig::default());
        assert!(fallback.ends_with("crm") || fallback.ends_with("crm_data"));
    }

    #[test]
    fn test_parse_import_section() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
root_folder = "/srv/crm"

[logging]
level = "debug"

[import]
summary_dir = "/srv/crm/summaries"
country_code = "44"
min_phone_digits = 11
"#,
        )
        .unwrap();

        let config = load_toml_config(&path).unwrap();
        assert_eq!(config.root_folder.as_deref(), Some("/srv/crm"));
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.import.country_code.as_deref(), Some("44"));
        assert_eq!(config.import.min_phone_digits, Some(11));
    }

    #[test]
    fn test_sections_are_optional() {
        let config: TomlConfig = toml::from_str("").unwrap();
        assert_eq!(config, TomlConfig::default());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "root_folder = [").unwrap();

        assert!(matches!(load_toml_config(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_prepare_root_folder_creates_directory() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("nested").join("root");

        let db_path = prepare_root_folder(&root).unwrap();
        assert!(root.is_dir());
        assert_eq!(db_path, root.join(DATABASE_FILE_NAME));
    }
}
