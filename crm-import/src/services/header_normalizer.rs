//! Header normalization
//!
//! Maps arbitrary spreadsheet headers onto canonical lead fields. For each
//! cell the header is trimmed and lower-cased, then looked up in the caller's
//! manual mapping, then in the built-in synonym table for the lead kind.
//! Unknown headers pass through verbatim. Phone columns are canonicalized on
//! the spot.

use crate::models::{FieldMap, FieldMapping, LeadKind, NormalizedRow, RawRow};
use crate::services::phone_canonicalizer::PhoneCanonicalizer;

/// Headers whose values are always treated as phone numbers
pub const PHONE_HEADERS: &[&str] = &[
    "contactno",
    "contact no",
    "contact number",
    "contactnumber",
    "mobile",
    "mobile number",
    "phone",
    "phone number",
];

const CONTACT_SYNONYMS: &[(&str, &str)] = &[
    ("contact no", "ContactNo"),
    ("contactno", "ContactNo"),
    ("contact number", "ContactNo"),
    ("contactnumber", "ContactNo"),
    ("mobile", "ContactNo"),
    ("mobile number", "ContactNo"),
    ("phone", "ContactNo"),
    ("phone number", "ContactNo"),
    ("name", "Name"),
    ("fullname", "Name"),
    ("full name", "Name"),
    ("contact name", "Name"),
    ("person name", "Name"),
    ("email", "Email"),
    ("e-mail", "Email"),
    ("mail", "Email"),
    ("city", "City"),
    ("location", "Location"),
    ("address", "Address"),
    ("company", "CompanyName"),
    ("company name", "CompanyName"),
    ("website", "Website"),
    ("industry", "ContactIndustry"),
    ("functional area", "ContactFunctionalArea"),
    ("notes", "Notes"),
    ("facilities", "Facilities"),
    ("reference id", "ReferenceId"),
    ("range", "Range"),
    ("status", "Status"),
    ("campaign", "Campaign"),
    ("type", "ContactType"),
    ("contact type", "ContactType"),
    ("sub type", "ContactSubType"),
    ("subtype", "ContactSubType"),
    ("contact sub type", "ContactSubType"),
];

const CUSTOMER_SYNONYMS: &[(&str, &str)] = &[
    ("customer name", "customerName"),
    ("name", "customerName"),
    ("fullname", "customerName"),
    ("full name", "customerName"),
    ("contact no", "ContactNumber"),
    ("contactno", "ContactNumber"),
    ("contact number", "ContactNumber"),
    ("contactnumber", "ContactNumber"),
    ("mobile", "ContactNumber"),
    ("mobile number", "ContactNumber"),
    ("phone", "ContactNumber"),
    ("phone number", "ContactNumber"),
    ("email", "Email"),
    ("e-mail", "Email"),
    ("city", "City"),
    ("location", "Location"),
    ("area", "Area"),
    ("address", "Address"),
    ("facilities", "Facilities"),
    ("description", "Description"),
    ("reference id", "ReferenceId"),
    ("campaign", "Campaign"),
    ("type", "CustomerType"),
    ("customer type", "CustomerType"),
    ("customertype", "CustomerType"),
    ("sub type", "CustomerSubType"),
    ("subtype", "CustomerSubType"),
    ("customer sub type", "CustomerSubType"),
    ("customersubtype", "CustomerSubType"),
];

fn synonyms(kind: LeadKind) -> &'static [(&'static str, &'static str)] {
    match kind {
        LeadKind::Contact => CONTACT_SYNONYMS,
        LeadKind::Customer => CUSTOMER_SYNONYMS,
    }
}

/// Header normalizer for one lead kind and mapping
#[derive(Debug, Clone)]
pub struct HeaderNormalizer {
    kind: LeadKind,
    overrides: FieldMapping,
    phone: PhoneCanonicalizer,
}

impl HeaderNormalizer {
    pub fn new(kind: LeadKind, overrides: FieldMapping, phone: PhoneCanonicalizer) -> Self {
        Self {
            kind,
            overrides,
            phone,
        }
    }

    /// Canonical field name for a raw header
    pub fn canonical_header(&self, raw_header: &str) -> String {
        let lower = raw_header.trim().to_lowercase();

        if let Some(mapped) = self.overrides.get(&lower) {
            return mapped.to_string();
        }

        synonyms(self.kind)
            .iter()
            .find(|(synonym, _)| *synonym == lower)
            .map(|(_, canonical)| canonical.to_string())
            .unwrap_or_else(|| raw_header.to_string())
    }

    /// Normalize `(header, value)` cells into a canonical field map
    ///
    /// Blank values are dropped, as are phone cells with no usable number;
    /// a later column overwrites an earlier one mapped to the same field.
    pub fn normalize<I, K, V>(&self, cells: I) -> FieldMap
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut fields = FieldMap::new();

        for (header, value) in cells {
            let header = header.as_ref();
            let value = value.as_ref();
            if value.trim().is_empty() {
                continue;
            }

            let canonical = self.canonical_header(header);
            let value = if self.is_phone_column(header, &canonical) {
                self.phone.canonicalize(value)
            } else {
                value.to_string()
            };
            if value.is_empty() {
                continue;
            }

            fields.insert(canonical, value);
        }

        fields
    }

    pub fn normalize_row(&self, row: &RawRow) -> NormalizedRow {
        NormalizedRow {
            row_number: row.row_number,
            fields: self.normalize(row.cells.iter().map(|(h, v)| (h, v))),
        }
    }

    fn is_phone_column(&self, raw_header: &str, canonical: &str) -> bool {
        let lower = raw_header.trim().to_lowercase();
        PHONE_HEADERS.contains(&lower.as_str()) || canonical == self.kind.phone_field()
    }
}
