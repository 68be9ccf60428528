//! Caller-supplied import parameters

use crate::error::{ImportError, ImportResult};
use crate::models::lead::{FieldMap, LeadKind};
use crate::models::master::ClassificationNames;
use std::collections::BTreeMap;

/// Manual header mapping: lower-cased source header → canonical field name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMapping(BTreeMap<String, String>);

impl FieldMapping {
    /// Parse the JSON mapping payload
    ///
    /// The payload must be a flat JSON object of strings. Keys are trimmed and
    /// lower-cased; entries with a blank target are ignored.
    pub fn parse(payload: &str) -> ImportResult<Self> {
        let value: serde_json::Value = serde_json::from_str(payload)
            .map_err(|e| ImportError::validation(format!("Invalid fieldMapping JSON: {}", e)))?;

        let object = value.as_object().ok_or_else(|| {
            ImportError::validation("Invalid fieldMapping JSON: expected an object")
        })?;

        let mut mapping = BTreeMap::new();
        for (source, target) in object {
            let target = target.as_str().ok_or_else(|| {
                ImportError::validation(format!(
                    "Invalid fieldMapping JSON: value for '{}' is not a string",
                    source
                ))
            })?;
            if target.trim().is_empty() {
                continue;
            }
            mapping.insert(source.trim().to_lowercase(), target.trim().to_string());
        }

        Ok(Self(mapping))
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.as_ref().trim().to_lowercase(), v.into()))
                .collect(),
        )
    }

    /// Look up an already lower-cased header
    pub fn get(&self, lower_header: &str) -> Option<&str> {
        self.0.get(lower_header).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One import run's parameters
#[derive(Debug, Clone)]
pub struct ImportRequest {
    pub kind: LeadKind,
    /// Raw mapping payload, parsed at the start of the run
    pub field_mapping: Option<String>,
    /// Classification applied to every row, overriding per-row names
    pub batch_classification: ClassificationNames,
    /// Canonical fields stamped onto every row (e.g. `Range`)
    pub batch_fields: FieldMap,
}

impl ImportRequest {
    pub fn new(kind: LeadKind) -> Self {
        Self {
            kind,
            field_mapping: None,
            batch_classification: ClassificationNames::default(),
            batch_fields: FieldMap::new(),
        }
    }

    pub fn with_field_mapping(mut self, payload: impl Into<String>) -> Self {
        self.field_mapping = Some(payload.into());
        self
    }

    pub fn with_batch_classification(mut self, names: ClassificationNames) -> Self {
        self.batch_classification = names;
        self
    }

    pub fn with_batch_field(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.batch_fields.insert(field, value);
        self
    }

    /// Parse the mapping payload and check the batch classification is well formed
    pub fn validate(&self) -> ImportResult<FieldMapping> {
        let mapping = match &self.field_mapping {
            Some(payload) => FieldMapping::parse(payload)?,
            None => FieldMapping::default(),
        };

        let batch = &self.batch_classification;
        if batch.lead_type.is_some() && batch.campaign.is_none() {
            return Err(ImportError::validation(
                "Campaign is required when a type is supplied",
            ));
        }
        if batch.sub_type.is_some() && batch.lead_type.is_none() {
            return Err(ImportError::validation(
                "Type is required when a sub-type is supplied",
            ));
        }

        if let Some((field, _)) = self.batch_fields.iter().find(|(k, _)| k.trim().is_empty()) {
            return Err(ImportError::validation(format!(
                "Batch field name must not be blank (got '{}')",
                field
            )));
        }

        // Name and phone identify a row; they must come from the sheet
        let identity = [self.kind.name_field(), self.kind.phone_field()];
        if let Some((field, _)) = self
            .batch_fields
            .iter()
            .find(|(k, _)| identity.iter().any(|f| *f == k.trim()))
        {
            return Err(ImportError::validation(format!(
                "Batch field '{}' cannot be set for the whole batch",
                field
            )));
        }

        Ok(mapping)
    }
}
