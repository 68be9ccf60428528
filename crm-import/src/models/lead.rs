//! Lead records as they move through the import pipeline
//!
//! RawRow → (normalize) → FieldMap → CanonicalRecord → PersistedRecord

use crate::models::master::{Classification, ClassificationNames};
use crm_common::db::{CONTACTS_TABLE, CUSTOMERS_TABLE};
use crm_common::ActingUser;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Canonical field holding the lead's e-mail address (both kinds)
pub const EMAIL_FIELD: &str = "Email";

/// Canonical field holding the lead's city (both kinds)
pub const CITY_FIELD: &str = "City";

/// Kind of lead being imported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadKind {
    Contact,
    Customer,
}

impl LeadKind {
    /// Canonical field holding the person's name
    pub fn name_field(&self) -> &'static str {
        match self {
            LeadKind::Contact => "Name",
            LeadKind::Customer => "customerName",
        }
    }

    /// Canonical field holding the phone number(s)
    pub fn phone_field(&self) -> &'static str {
        match self {
            LeadKind::Contact => "ContactNo",
            LeadKind::Customer => "ContactNumber",
        }
    }

    /// Canonical fields for the campaign, type and sub-type names
    pub fn classification_fields(&self) -> [&'static str; 3] {
        match self {
            LeadKind::Contact => ["Campaign", "ContactType", "ContactSubType"],
            LeadKind::Customer => ["Campaign", "CustomerType", "CustomerSubType"],
        }
    }

    pub fn table(&self) -> &'static str {
        match self {
            LeadKind::Contact => CONTACTS_TABLE,
            LeadKind::Customer => CUSTOMERS_TABLE,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LeadKind::Contact => "contact",
            LeadKind::Customer => "customer",
        }
    }

    /// Plural title used for summary worksheet names
    pub fn plural_title(&self) -> &'static str {
        match self {
            LeadKind::Contact => "Contacts",
            LeadKind::Customer => "Customers",
        }
    }
}

impl fmt::Display for LeadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeadKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "contact" | "contacts" => Ok(LeadKind::Contact),
            "customer" | "customers" => Ok(LeadKind::Customer),
            other => Err(format!(
                "unknown lead kind '{}' (expected 'contact' or 'customer')",
                other
            )),
        }
    }
}

/// Ordered field-name → value map
///
/// Inserting an existing key replaces its value in place, so the first-seen
/// column order is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMap(Vec<(String, String)>);

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let index = self.0.iter().position(|(k, _)| k == key)?;
        Some(self.0.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// JSON object used for the `attributes` column
    pub fn to_json(&self) -> serde_json::Value {
        let object = self
            .0
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(object)
    }

    /// Inverse of [`FieldMap::to_json`]. Non-string values are rendered as JSON text.
    pub fn from_json(value: &serde_json::Value) -> Self {
        let mut map = FieldMap::new();
        if let Some(object) = value.as_object() {
            for (k, v) in object {
                let text = match v {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                map.insert(k.clone(), text);
            }
        }
        map
    }
}

impl FromIterator<(String, String)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut map = FieldMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl IntoIterator for FieldMap {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// One data row of the uploaded sheet, keyed by the raw header text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// 1-based sheet row number (the header is row 1)
    pub row_number: usize,
    pub cells: Vec<(String, String)>,
}

/// A row after header normalization and phone canonicalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRow {
    pub row_number: usize,
    pub fields: FieldMap,
}

/// A lead ready for reconciliation and persistence
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalRecord {
    pub row_number: usize,
    pub kind: LeadKind,
    pub name: String,
    /// Canonical phone key (comma-joined digit tokens)
    pub phone_key: String,
    pub email: Option<String>,
    pub city: String,
    pub classification: Classification,
    /// Every other canonical field
    pub attributes: FieldMap,
    pub created_by: Uuid,
    pub is_imported: bool,
}

impl CanonicalRecord {
    /// Build a record from a normalized row
    ///
    /// Returns `None` when the row fails the name + phone presence filter.
    /// The classification names are split off and returned alongside, to be
    /// resolved by the hierarchy reconciler.
    pub fn from_normalized(
        kind: LeadKind,
        row: NormalizedRow,
        actor: &ActingUser,
    ) -> Option<(Self, ClassificationNames)> {
        let mut fields = row.fields;

        let name = fields
            .remove(kind.name_field())
            .map(|n| n.trim().to_string())
            .unwrap_or_default();
        let phone_key = fields.remove(kind.phone_field()).unwrap_or_default();
        if name.is_empty() || phone_key.is_empty() {
            return None;
        }

        let email = fields
            .remove(EMAIL_FIELD)
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty());

        // Assigned city of the importing user wins over the sheet
        let row_city = fields.remove(CITY_FIELD);
        let city = actor
            .assigned_city()
            .map(str::to_string)
            .or_else(|| row_city.map(|c| c.trim().to_string()))
            .unwrap_or_default();

        let [campaign_field, type_field, sub_type_field] = kind.classification_fields();
        let names = ClassificationNames::new(
            fields.remove(campaign_field),
            fields.remove(type_field),
            fields.remove(sub_type_field),
        );

        let record = Self {
            row_number: row.row_number,
            kind,
            name,
            phone_key,
            email,
            city,
            classification: Classification::default(),
            attributes: fields,
            created_by: actor.id,
            is_imported: true,
        };

        Some((record, names))
    }
}

/// A lead as stored, with classification names resolved at read time
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersistedRecord {
    pub guid: Uuid,
    pub kind: LeadKind,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub city: String,
    pub campaign: Option<String>,
    pub lead_type: Option<String>,
    pub sub_type: Option<String>,
    pub attributes: FieldMap,
    pub created_by: Option<Uuid>,
    pub is_imported: bool,
}
