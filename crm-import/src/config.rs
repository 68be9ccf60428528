//! Import settings resolution
//!
//! Each setting resolves with ENV → TOML → default priority.

use crate::services::phone_canonicalizer::{PhoneRules, DEFAULT_COUNTRY_CODE, DEFAULT_MIN_DIGITS};
use crm_common::config::TomlConfig;
use crm_common::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Summary workbook directory override
pub const SUMMARY_DIR_ENV: &str = "CRM_SUMMARY_DIR";

/// Country calling code override
pub const COUNTRY_CODE_ENV: &str = "CRM_COUNTRY_CODE";

/// Minimum phone digit count override
pub const MIN_PHONE_DIGITS_ENV: &str = "CRM_MIN_PHONE_DIGITS";

/// Resolved settings for one import process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSettings {
    /// Directory holding staged uploads while a run is in progress
    pub uploads_dir: PathBuf,
    /// Directory receiving summary workbooks
    pub summary_dir: PathBuf,
    pub phone: PhoneRules,
}

impl ImportSettings {
    /// Defaults relative to a root folder
    pub fn with_root(root_folder: &Path) -> Self {
        Self {
            uploads_dir: uploads_dir(root_folder),
            summary_dir: uploads_dir(root_folder).join("summaries"),
            phone: PhoneRules::default(),
        }
    }
}

/// `<root>/uploads`
fn uploads_dir(root_folder: &Path) -> PathBuf {
    root_folder.join("uploads")
}

/// Resolve import settings from environment, TOML and defaults
pub fn resolve_import_settings(root_folder: &Path, config: &TomlConfig) -> Result<ImportSettings> {
    let section = &config.import;

    let summary_dir = match pick(SUMMARY_DIR_ENV, section.summary_dir.clone()) {
        Some(dir) => PathBuf::from(dir),
        None => uploads_dir(root_folder).join("summaries"),
    };

    let country_code = pick(COUNTRY_CODE_ENV, section.country_code.clone())
        .unwrap_or_else(|| DEFAULT_COUNTRY_CODE.to_string());
    let country_code = country_code.trim().trim_start_matches('+').to_string();
    if !country_code.chars().all(|c| c.is_ascii_digit()) {
        return Err(Error::Config(format!(
            "Country code must be digits, got '{}'",
            country_code
        )));
    }

    let min_digits = match pick(
        MIN_PHONE_DIGITS_ENV,
        section.min_phone_digits.map(|n| n.to_string()),
    ) {
        Some(raw) => raw.trim().parse::<usize>().map_err(|e| {
            Error::Config(format!("Invalid minimum phone digits '{}': {}", raw, e))
        })?,
        None => DEFAULT_MIN_DIGITS,
    };
    if min_digits == 0 {
        return Err(Error::Config(
            "Minimum phone digits must be greater than zero".to_string(),
        ));
    }

    let settings = ImportSettings {
        uploads_dir: uploads_dir(root_folder),
        summary_dir,
        phone: PhoneRules {
            country_code,
            min_digits,
        },
    };
    debug!(?settings, "Resolved import settings");
    Ok(settings)
}

/// Environment value if set and non-blank, else the TOML value
fn pick(env_var: &str, toml_value: Option<String>) -> Option<String> {
    let env_value = std::env::var(env_var).ok().filter(|v| !v.trim().is_empty());

    match (env_value, toml_value) {
        (Some(env), Some(_)) => {
            warn!("{} set in both environment and TOML; using environment", env_var);
            Some(env)
        }
        (Some(env), None) => Some(env),
        (None, toml) => toml,
    }
}
