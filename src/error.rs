//! Error types for loading the dataset and running queries.
//!
//! Not-found is never an error: lookups return `None` or an empty sequence.

use std::path::PathBuf;

use thiserror::Error;

use crate::models::ZipRecord;

/// Failure to build the record store from its source.
///
/// The error is cached alongside the store slot, so it must be `Clone`;
/// I/O and parser errors are flattened to their messages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataLoadError {
    #[error("data file not found: {}", .path.display())]
    Missing { path: PathBuf },

    #[error("failed to read data file {}: {reason}", .path.display())]
    Read { path: PathBuf, reason: String },

    #[error("malformed data in {source_name}: {reason}")]
    Malformed { source_name: String, reason: String },

    #[error("data source {source_name} contains no zip codes")]
    Empty { source_name: String },

    #[error(
        "zip code {code} listed twice with different locations: {} vs {}",
        describe(.first),
        describe(.second)
    )]
    ConflictingDuplicate {
        code: String,
        first: Box<ZipRecord>,
        second: Box<ZipRecord>,
    },
}

fn describe(record: &ZipRecord) -> String {
    format!(
        "{} / {} / {}",
        record.region, record.province, record.city_municipality
    )
}

/// Errors surfaced by [`crate::ZipDirectory`] operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    #[error(transparent)]
    DataLoad(#[from] DataLoadError),

    #[error("invalid match kind: {0:?} (expected contains, startswith or exact)")]
    InvalidMatchKind(String),

    #[error("invalid search field: {0:?} (expected city_municipality, province or region)")]
    InvalidField(String),
}

pub type Result<T> = std::result::Result<T, DirectoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_message_names_both_locations() {
        let err = DataLoadError::ConflictingDuplicate {
            code: "2000".to_string(),
            first: Box::new(ZipRecord::new("2000", "San Fernando", "Pampanga", "Region 3")),
            second: Box::new(ZipRecord::new("2000", "Angeles", "Pampanga", "Region 3")),
        };
        let msg = err.to_string();
        assert!(msg.contains("2000"));
        assert!(msg.contains("San Fernando"));
        assert!(msg.contains("Angeles"));
    }

    #[test]
    fn test_load_error_converts_into_directory_error() {
        let err: DirectoryError = DataLoadError::Empty {
            source_name: "bundled".to_string(),
        }
        .into();
        assert!(matches!(err, DirectoryError::DataLoad(_)));
    }
}
