//! Phone number extraction and canonicalization
//!
//! A single spreadsheet cell may hold several numbers with mixed separators
//! and country-code noise ("+91-9998887776 / 09998887776"). The canonical
//! phone key is the comma-joined list of the distinct numbers found, in
//! first-seen order, each digit-only and at least `min_digits` long.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Separators that never occur inside a single number. A dash also
/// separates numbers, see [`PhoneCanonicalizer::canonicalize`].
const HARD_SEPARATORS: &[char] = &[',', '/', '|', ';', ':'];

/// Default country calling code stripped from numbers
pub const DEFAULT_COUNTRY_CODE: &str = "91";

/// Default minimum length of a kept number
pub const DEFAULT_MIN_DIGITS: usize = 10;

/// Country code and length rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneRules {
    pub country_code: String,
    pub min_digits: usize,
}

impl Default for PhoneRules {
    fn default() -> Self {
        Self {
            country_code: DEFAULT_COUNTRY_CODE.to_string(),
            min_digits: DEFAULT_MIN_DIGITS,
        }
    }
}

/// Phone canonicalizer
#[derive(Debug, Clone, Default)]
pub struct PhoneCanonicalizer {
    rules: PhoneRules,
}

impl PhoneCanonicalizer {
    pub fn new(rules: PhoneRules) -> Self {
        Self { rules }
    }

    /// Canonical phone key for a free-text cell (possibly empty)
    ///
    /// The cell is split on `, / | ; :` and then on `-`.
    pub fn canonicalize(&self, raw: &str) -> String {
        let mut seen = HashSet::new();
        let mut numbers: Vec<String> = Vec::new();

        for fragment in raw.split(HARD_SEPARATORS) {
            for number in self.dash_fragments(fragment) {
                if seen.insert(number.clone()) {
                    numbers.push(number);
                }
            }
        }

        numbers.join(",")
    }

    /// Valid numbers of one fragment, split on dashes
    ///
    /// When no dash-separated piece is long enough on its own the dashes were
    /// digit grouping ("091-987-654-3210"), and the whole fragment is used.
    fn dash_fragments(&self, fragment: &str) -> Vec<String> {
        let valid: Vec<String> = fragment
            .split('-')
            .map(|piece| self.clean_fragment(piece))
            .filter(|number| number.len() >= self.rules.min_digits)
            .collect();

        if !valid.is_empty() {
            return valid;
        }

        let whole = self.clean_fragment(fragment);
        if whole.len() >= self.rules.min_digits {
            vec![whole]
        } else {
            Vec::new()
        }
    }

    /// Digits of one fragment with country code and leading zeros removed
    ///
    /// The country code is only stripped when enough digits remain, so a
    /// national number that happens to start with the code is kept intact.
    fn clean_fragment(&self, fragment: &str) -> String {
        let digits: String = fragment.chars().filter(|c| c.is_ascii_digit()).collect();
        let mut number = digits.trim_start_matches('0');

        let code = self.rules.country_code.as_str();
        if !code.is_empty() {
            if let Some(rest) = number.strip_prefix(code) {
                if rest.trim_start_matches('0').len() >= self.rules.min_digits {
                    number = rest;
                }
            }
        }

        number.trim_start_matches('0').to_string()
    }
}

/// Canonicalize with the default rules
pub fn canonicalize(raw: &str) -> String {
    PhoneCanonicalizer::default().canonicalize(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_country_code_and_zero_variants_collapse() {
        assert_eq!(canonicalize("+91-9998887776 / 09998887776"), "9998887776");
    }

    #[test]
    fn test_multiple_numbers_keep_first_seen_order() {
        assert_eq!(
            canonicalize("9123456780; 9876543210 | 9123456780"),
            "9123456780,9876543210"
        );
    }

    #[test]
    fn test_every_separator_splits() {
        let raw = "9000000001,9000000002/9000000003|9000000004;9000000005:9000000006-9000000007";
        assert_eq!(canonicalize(raw).split(',').count(), 7);
    }

    #[test]
    fn test_short_fragments_dropped() {
        assert_eq!(canonicalize("12345"), "");
        assert_eq!(canonicalize(""), "");
        assert_eq!(canonicalize("ext 42, 9876543210"), "9876543210");
    }

    #[test]
    fn test_spaces_and_brackets_inside_a_number() {
        assert_eq!(canonicalize("(+91) 98765 43210"), "9876543210");
    }

    #[test]
    fn test_national_number_starting_with_code_kept() {
        // 10 digits beginning with "91" is a national number, not a prefixed one
        assert_eq!(canonicalize("9123456789"), "9123456789");
        assert_eq!(canonicalize("919123456789"), "9123456789");
    }

    #[test]
    fn test_code_kept_when_stripping_leaves_too_few_digits() {
        // Stripping "91" would leave 9 digits, so the 11-digit token is kept whole
        let key = canonicalize("91987654321");
        assert_eq!(key, "91987654321");
        assert_eq!(canonicalize(&key), key);
        assert_eq!(canonicalize("+91 98765 4321"), "91987654321");
    }

    #[test]
    fn test_dash_grouped_number_is_rejoined() {
        assert_eq!(canonicalize("091-987-654-3210"), "9876543210");
        assert_eq!(canonicalize("091-9876543210"), "9876543210");
        assert_eq!(canonicalize("9876543210-12"), "9876543210");
        assert_eq!(canonicalize("12-34"), "");
    }

    #[test]
    fn test_idempotent() {
        for raw in [
            "+91-9998887776 / 09998887776",
            "0919876543210",
            "9123456789, 919123456789",
            "98765 43210 | 9000000001",
        ] {
            let once = canonicalize(raw);
            assert_eq!(canonicalize(&once), once, "input {raw}");
        }
    }

    #[test]
    fn test_output_shape_invariant() {
        for raw in ["abc", "+1 (555) 010-9999", "0000000000000", "91 91 91", "9876543210,9876543210"] {
            let key = canonicalize(raw);
            if key.is_empty() {
                continue;
            }
            let tokens: Vec<&str> = key.split(',').collect();
            let unique: HashSet<&str> = tokens.iter().copied().collect();
            assert_eq!(unique.len(), tokens.len());
            for token in tokens {
                assert!(token.len() >= DEFAULT_MIN_DIGITS);
                assert!(token.chars().all(|c| c.is_ascii_digit()));
            }
        }
    }

    #[test]
    fn test_custom_rules() {
        let uk = PhoneCanonicalizer::new(PhoneRules {
            country_code: "44".to_string(),
            min_digits: 10,
        });
        assert_eq!(uk.canonicalize("+44 7700 900123"), "7700900123");
        assert_eq!(uk.canonicalize("+91 98765 43210"), "919876543210");
    }
}
