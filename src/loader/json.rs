//! JSON source: `{ region: { province: { city: ["code", ...] } } }`.

use std::io::Read;

use super::Hierarchy;
use crate::error::DataLoadError;

pub(super) fn parse_str(text: &str, source_name: &str) -> Result<Hierarchy, DataLoadError> {
    serde_json::from_str(text).map_err(|e| malformed(source_name, e))
}

pub(super) fn parse_reader<R: Read>(reader: R, source_name: &str) -> Result<Hierarchy, DataLoadError> {
    serde_json::from_reader(reader).map_err(|e| malformed(source_name, e))
}

fn malformed(source_name: &str, err: serde_json::Error) -> DataLoadError {
    DataLoadError::Malformed {
        source_name: source_name.to_string(),
        reason: err.to_string(),
    }
}
