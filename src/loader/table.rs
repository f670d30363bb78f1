//! CSV source with one zip code per row.
//!
//! Rows are grouped by region, province and city in first-seen order, which
//! gives the same traversal as the equivalent nested JSON document.

use serde::Deserialize;
use std::io::Read;

use super::Hierarchy;
use crate::error::DataLoadError;

#[derive(Debug, Deserialize)]
struct Row {
    region: String,
    province: String,
    city_municipality: String,
    code: String,
}

pub(super) fn parse_reader<R: Read>(reader: R, source_name: &str) -> Result<Hierarchy, DataLoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut hierarchy = Hierarchy::new();

    for result in rdr.deserialize::<Row>() {
        let row = result.map_err(|e| DataLoadError::Malformed {
            source_name: source_name.to_string(),
            reason: e.to_string(),
        })?;

        hierarchy
            .entry_or_default(&row.region)
            .entry_or_default(&row.province)
            .entry_or_default(&row.city_municipality)
            .push(row.code);
    }

    Ok(hierarchy)
}
