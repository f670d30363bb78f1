//! Searchable record fields.
//!
//! Field names coming from callers are validated against this closed set
//! before a search runs, so an unknown name is an [`DirectoryError::InvalidField`]
//! rather than a silent miss.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::ZipRecord;
use crate::error::DirectoryError;

/// A record attribute that `search` can match against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchField {
    CityMunicipality,
    Province,
    Region,
}

impl SearchField {
    /// All searchable fields in canonical order
    pub fn all() -> &'static [SearchField] {
        &[
            SearchField::CityMunicipality,
            SearchField::Province,
            SearchField::Region,
        ]
    }

    /// Get the field name as used in records and query arguments
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchField::CityMunicipality => "city_municipality",
            SearchField::Province => "province",
            SearchField::Region => "region",
        }
    }

    /// Read this field from a record
    pub fn value<'a>(&self, record: &'a ZipRecord) -> &'a str {
        match self {
            SearchField::CityMunicipality => &record.city_municipality,
            SearchField::Province => &record.province,
            SearchField::Region => &record.region,
        }
    }

    fn bit(&self) -> u8 {
        match self {
            SearchField::CityMunicipality => 0b001,
            SearchField::Province => 0b010,
            SearchField::Region => 0b100,
        }
    }
}

impl std::fmt::Display for SearchField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchField {
    type Err = DirectoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "city_municipality" => Ok(SearchField::CityMunicipality),
            "province" => Ok(SearchField::Province),
            "region" => Ok(SearchField::Region),
            other => Err(DirectoryError::InvalidField(other.to_string())),
        }
    }
}

/// Normalized set of fields to search.
///
/// Order and duplicates in the caller's list do not matter, so two requests
/// naming the same fields share one cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldSet(u8);

impl FieldSet {
    pub fn all() -> Self {
        Self::from_fields(SearchField::all().iter().copied())
    }

    pub fn empty() -> Self {
        Self(0)
    }

    pub fn from_fields(fields: impl IntoIterator<Item = SearchField>) -> Self {
        Self(fields.into_iter().fold(0, |mask, f| mask | f.bit()))
    }

    /// Parse field names, failing on the first unknown one.
    pub fn parse<S: AsRef<str>>(names: &[S]) -> Result<Self, DirectoryError> {
        let fields = names
            .iter()
            .map(|n| n.as_ref().parse::<SearchField>())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_fields(fields))
    }

    pub fn contains(&self, field: SearchField) -> bool {
        self.0 & field.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Iterate the selected fields in canonical order
    pub fn iter(&self) -> impl Iterator<Item = SearchField> + '_ {
        SearchField::all()
            .iter()
            .copied()
            .filter(move |f| self.contains(*f))
    }
}

impl Default for FieldSet {
    fn default() -> Self {
        Self::all()
    }
}

impl FromIterator<SearchField> for FieldSet {
    fn from_iter<I: IntoIterator<Item = SearchField>>(iter: I) -> Self {
        Self::from_fields(iter)
    }
}
