//! Acting-user context supplied by the (external) authentication layer

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of the user on whose behalf an operation runs.
///
/// Resolved by the authentication/tenancy layer; the import engine only
/// stamps these values onto the records it persists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActingUser {
    pub id: Uuid,
    /// City the user is assigned to, if any
    pub city: Option<String>,
}

impl ActingUser {
    pub fn new(id: Uuid, city: Option<String>) -> Self {
        Self { id, city }
    }

    /// Assigned city, ignoring blank values
    pub fn assigned_city(&self) -> Option<&str> {
        self.city
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}
