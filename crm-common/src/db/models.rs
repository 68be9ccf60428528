//! Shared database models

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a master-data entry (campaign, type, sub-type)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MasterStatus {
    #[default]
    Active,
    Inactive,
}

impl MasterStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MasterStatus::Active => "Active",
            MasterStatus::Inactive => "Inactive",
        }
    }
}

impl fmt::Display for MasterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MasterStatus {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Active" => Ok(MasterStatus::Active),
            "Inactive" => Ok(MasterStatus::Inactive),
            other => Err(crate::Error::InvalidInput(format!(
                "Unknown master status: {}",
                other
            ))),
        }
    }
}
