//! Match strategies used by `search`.
//!
//! All comparisons are case-insensitive. Both sides are folded with
//! [`fold_case`], which applies Unicode lower-casing without any locale
//! tailoring, so names like "DASMARIÑAS" and "dasmariñas" compare equal.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::DirectoryError;

/// How a query string is compared against a field value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    /// Field contains the query anywhere
    #[default]
    Contains,
    /// Field starts with the query
    StartsWith,
    /// Field equals the query
    Exact,
}

impl MatchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchKind::Contains => "contains",
            MatchKind::StartsWith => "startswith",
            MatchKind::Exact => "exact",
        }
    }

    /// Predicate over already-folded `(field, query)` pairs.
    pub fn predicate(&self) -> fn(&str, &str) -> bool {
        match self {
            MatchKind::Contains => |field: &str, query: &str| field.contains(query),
            MatchKind::StartsWith => |field: &str, query: &str| field.starts_with(query),
            MatchKind::Exact => |field: &str, query: &str| field == query,
        }
    }

    /// Compare raw strings, folding both sides first.
    pub fn matches(&self, field: &str, query: &str) -> bool {
        (self.predicate())(&fold_case(field), &fold_case(query))
    }
}

impl std::fmt::Display for MatchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchKind {
    type Err = DirectoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "contains" => Ok(MatchKind::Contains),
            "startswith" | "starts_with" => Ok(MatchKind::StartsWith),
            "exact" => Ok(MatchKind::Exact),
            other => Err(DirectoryError::InvalidMatchKind(other.to_string())),
        }
    }
}

/// Case-fold a string for comparison.
pub fn fold_case(s: &str) -> String {
    s.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_match_kinds() {
        assert_eq!("contains".parse::<MatchKind>().unwrap(), MatchKind::Contains);
        assert_eq!("startswith".parse::<MatchKind>().unwrap(), MatchKind::StartsWith);
        assert_eq!("starts_with".parse::<MatchKind>().unwrap(), MatchKind::StartsWith);
        assert_eq!("exact".parse::<MatchKind>().unwrap(), MatchKind::Exact);
    }

    #[test]
    fn test_unknown_kind_fails_instead_of_defaulting() {
        let err = "bogus".parse::<MatchKind>().unwrap_err();
        assert_eq!(err, DirectoryError::InvalidMatchKind("bogus".to_string()));
        assert!("".parse::<MatchKind>().is_err());
    }

    #[test]
    fn test_contains() {
        assert!(MatchKind::Contains.matches("Makati", "kat"));
        assert!(MatchKind::Contains.matches("Makati", "MAKA"));
        assert!(!MatchKind::Contains.matches("Makati", "pasig"));
    }

    #[test]
    fn test_starts_with() {
        assert!(MatchKind::StartsWith.matches("San Juan", "san"));
        assert!(!MatchKind::StartsWith.matches("Pasig", "sig"));
    }

    #[test]
    fn test_exact() {
        assert!(MatchKind::Exact.matches("Cavite", "cavite"));
        assert!(!MatchKind::Exact.matches("Cavite City", "cavite"));
    }

    #[test]
    fn test_empty_query_is_vacuous_for_prefix_and_substring() {
        assert!(MatchKind::Contains.matches("Ermita", ""));
        assert!(MatchKind::StartsWith.matches("Ermita", ""));
        assert!(!MatchKind::Exact.matches("Ermita", ""));
    }

    #[test]
    fn test_non_ascii_folding() {
        assert_eq!(fold_case("DASMARIÑAS"), "dasmariñas");
        assert!(MatchKind::Exact.matches("Dasmariñas", "DASMARIÑAS"));
        assert!(MatchKind::Contains.matches("Las Piñas", "PIÑA"));
        assert!(!MatchKind::Contains.matches("Las Piñas", "pina"));
    }
}
