//! Three-level classification master data: Campaign → Type → SubType

use crm_common::db::{MasterStatus, CAMPAIGNS_TABLE, LEAD_SUB_TYPES_TABLE, LEAD_TYPES_TABLE};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Level of a master-data entry in the classification tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MasterLevel {
    Campaign,
    Type,
    SubType,
}

impl MasterLevel {
    pub fn table(&self) -> &'static str {
        match self {
            MasterLevel::Campaign => CAMPAIGNS_TABLE,
            MasterLevel::Type => LEAD_TYPES_TABLE,
            MasterLevel::SubType => LEAD_SUB_TYPES_TABLE,
        }
    }
}

impl fmt::Display for MasterLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MasterLevel::Campaign => "campaign",
            MasterLevel::Type => "type",
            MasterLevel::SubType => "sub-type",
        };
        f.write_str(label)
    }
}

/// Parent scope a name is unique within
///
/// The scope determines the level: campaigns live at the root, types under a
/// campaign, sub-types under a (campaign, type) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MasterScope {
    Root,
    Campaign(Uuid),
    CampaignType { campaign_id: Uuid, type_id: Uuid },
}

impl MasterScope {
    pub fn level(&self) -> MasterLevel {
        match self {
            MasterScope::Root => MasterLevel::Campaign,
            MasterScope::Campaign(_) => MasterLevel::Type,
            MasterScope::CampaignType { .. } => MasterLevel::SubType,
        }
    }
}

/// Outcome of a find-or-create
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Found(Uuid),
    Created(Uuid),
}

impl Resolution {
    pub fn id(&self) -> Uuid {
        match self {
            Resolution::Found(id) | Resolution::Created(id) => *id,
        }
    }

    pub fn was_created(&self) -> bool {
        matches!(self, Resolution::Created(_))
    }
}

/// Stored master-data entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MasterEntity {
    pub guid: Uuid,
    pub level: MasterLevel,
    pub name: String,
    pub status: MasterStatus,
    /// Parent campaign (types and sub-types)
    pub campaign_id: Option<Uuid>,
    /// Parent type (sub-types)
    pub type_id: Option<Uuid>,
}

/// Reference to a resolved master entry, carrying its display name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MasterRef {
    pub id: Uuid,
    pub name: String,
}

/// Resolved classification of one lead. Unresolved levels are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub campaign: Option<MasterRef>,
    pub lead_type: Option<MasterRef>,
    pub sub_type: Option<MasterRef>,
}

impl Classification {
    pub fn campaign_name(&self) -> &str {
        self.campaign.as_ref().map(|r| r.name.as_str()).unwrap_or("")
    }

    pub fn type_name(&self) -> &str {
        self.lead_type.as_ref().map(|r| r.name.as_str()).unwrap_or("")
    }

    pub fn sub_type_name(&self) -> &str {
        self.sub_type.as_ref().map(|r| r.name.as_str()).unwrap_or("")
    }
}

/// Free-text classification names, trimmed; blank names are `None`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationNames {
    pub campaign: Option<String>,
    pub lead_type: Option<String>,
    pub sub_type: Option<String>,
}

impl ClassificationNames {
    pub fn new(
        campaign: Option<String>,
        lead_type: Option<String>,
        sub_type: Option<String>,
    ) -> Self {
        Self {
            campaign: clean_name(campaign),
            lead_type: clean_name(lead_type),
            sub_type: clean_name(sub_type),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.campaign.is_none() && self.lead_type.is_none() && self.sub_type.is_none()
    }

    /// Level-wise override: every name set in `overrides` replaces ours
    pub fn overridden_by(self, overrides: &ClassificationNames) -> Self {
        Self {
            campaign: overrides.campaign.clone().or(self.campaign),
            lead_type: overrides.lead_type.clone().or(self.lead_type),
            sub_type: overrides.sub_type.clone().or(self.sub_type),
        }
    }
}

fn clean_name(name: Option<String>) -> Option<String> {
    name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}
