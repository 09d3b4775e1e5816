//! Member number value object.
//!
//! Human-readable, unique membership identifier printed on cards and quoted
//! by partner businesses when redeeming offers. Format: `WF-<year>-<sequence>`
//! with a zero-padded five digit sequence, e.g. `WF-2026-00042`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ValidationError;

/// Human-readable membership number, format `WF-<year>-<sequence>`.
///
/// Minted once at membership creation and never changed afterwards; revoked
/// and revived memberships keep their original number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberNumber(String);

impl MemberNumber {
    /// Mints a member number from a year and a per-year sequence value.
    pub fn mint(year: i32, sequence: u32) -> Self {
        Self(format!("WF-{}-{:05}", year, sequence))
    }

    /// Parses and validates an existing member number string.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let mut parts = s.splitn(3, '-');
        let prefix = parts.next().unwrap_or_default();
        let year = parts.next().unwrap_or_default();
        let sequence = parts.next().unwrap_or_default();

        if prefix != "WF" {
            return Err(ValidationError::invalid_format(
                "member_number",
                "must start with 'WF-'",
            ));
        }
        if year.len() != 4 || year.parse::<i32>().is_err() {
            return Err(ValidationError::invalid_format(
                "member_number",
                "year segment must be four digits",
            ));
        }
        if sequence.is_empty() || sequence.parse::<u32>().is_err() {
            return Err(ValidationError::invalid_format(
                "member_number",
                "sequence segment must be numeric",
            ));
        }

        Ok(Self(s.to_string()))
    }

    /// Returns the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the year segment.
    pub fn year(&self) -> i32 {
        // Validated at construction, the segment is always present.
        self.0
            .split('-')
            .nth(1)
            .and_then(|y| y.parse().ok())
            .unwrap_or_default()
    }
}

impl fmt::Display for MemberNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MemberNumber {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mint_formats_with_padded_sequence() {
        let number = MemberNumber::mint(2026, 42);
        assert_eq!(number.as_str(), "WF-2026-00042");
    }

    #[test]
    fn mint_does_not_truncate_large_sequences() {
        let number = MemberNumber::mint(2026, 123456);
        assert_eq!(number.as_str(), "WF-2026-123456");
    }

    #[test]
    fn parse_accepts_minted_numbers() {
        let minted = MemberNumber::mint(2026, 7);
        let parsed = MemberNumber::parse(minted.as_str()).unwrap();
        assert_eq!(parsed, minted);
    }

    #[test]
    fn parse_rejects_wrong_prefix() {
        assert!(MemberNumber::parse("XX-2026-00001").is_err());
    }

    #[test]
    fn parse_rejects_bad_year() {
        assert!(MemberNumber::parse("WF-26-00001").is_err());
        assert!(MemberNumber::parse("WF-year-00001").is_err());
    }

    #[test]
    fn parse_rejects_bad_sequence() {
        assert!(MemberNumber::parse("WF-2026-").is_err());
        assert!(MemberNumber::parse("WF-2026-abc").is_err());
    }

    #[test]
    fn parse_rejects_missing_segments() {
        assert!(MemberNumber::parse("WF-2026").is_err());
        assert!(MemberNumber::parse("").is_err());
    }

    #[test]
    fn year_returns_year_segment() {
        let number = MemberNumber::mint(2027, 3);
        assert_eq!(number.year(), 2027);
    }

    #[test]
    fn from_str_round_trips() {
        let number: MemberNumber = "WF-2026-00009".parse().unwrap();
        assert_eq!(number.to_string(), "WF-2026-00009");
    }

    #[test]
    fn serializes_transparently() {
        let number = MemberNumber::mint(2026, 1);
        let json = serde_json::to_string(&number).unwrap();
        assert_eq!(json, "\"WF-2026-00001\"");
    }
}
