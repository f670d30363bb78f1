//! Builds the record store from a nested region → province → city → codes
//! source.
//!
//! Two on-disk layouts are understood, either optionally gzip-compressed:
//! - JSON: `{ region: { province: { city: ["code", ...] } } }`
//! - CSV: header `region,province,city_municipality,code`, one code per row
//!
//! Both are parsed into the same ordered [`Hierarchy`], so record order always
//! follows the traversal order of the source. Names and codes are trimmed.

mod json;
mod ordered;
mod table;

use flate2::read::GzDecoder;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

use crate::error::DataLoadError;
use crate::models::ZipRecord;
use crate::store::{DuplicatePolicy, RecordStore};

pub use ordered::OrderedMap;

/// Parsed source shape: region → province → city/municipality → zip codes.
pub type Hierarchy = OrderedMap<OrderedMap<OrderedMap<Vec<String>>>>;

/// Dataset compiled into the library.
pub const BUNDLED_DATA: &str = include_str!("../../data/ph_zip_codes.json");

/// On-disk encoding of a data file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataFormat {
    Json,
    Csv,
}

impl DataFormat {
    /// Guess the format from the file extension, looking through a trailing `.gz`.
    pub fn detect(path: &Path) -> Option<Self> {
        let path = if is_gzip(path) {
            Path::new(path.file_stem()?)
        } else {
            path
        };

        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "json" => Some(DataFormat::Json),
            "csv" => Some(DataFormat::Csv),
            _ => None,
        }
    }
}

/// Where the dataset comes from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DataSource {
    /// The JSON dataset shipped inside the crate
    #[default]
    Bundled,
    /// A file on disk; format detected from the extension when `None`
    File {
        path: PathBuf,
        format: Option<DataFormat>,
    },
}

impl DataSource {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        DataSource::File {
            path: path.into(),
            format: None,
        }
    }

    /// Human-readable name for logs and errors
    pub fn name(&self) -> String {
        match self {
            DataSource::Bundled => "bundled dataset".to_string(),
            DataSource::File { path, .. } => path.display().to_string(),
        }
    }
}

/// Parse a source into a record store.
pub fn load(source: &DataSource, policy: DuplicatePolicy) -> Result<RecordStore, DataLoadError> {
    let started = Instant::now();
    let source_name = source.name();
    debug!("Loading zip codes from {}", source_name);

    let hierarchy = match source {
        DataSource::Bundled => json::parse_str(BUNDLED_DATA, &source_name)?,
        DataSource::File { path, format } => load_file(path, *format)?,
    };

    let store = build_store(hierarchy, &source_name, policy)?;

    info!(
        source = %source_name,
        records = store.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Zip code store built"
    );

    Ok(store)
}

fn load_file(path: &Path, format: Option<DataFormat>) -> Result<Hierarchy, DataLoadError> {
    let source_name = path.display().to_string();
    let format = format
        .or_else(|| DataFormat::detect(path))
        .ok_or_else(|| DataLoadError::Malformed {
            source_name: source_name.clone(),
            reason: "cannot tell the data format from the file extension".to_string(),
        })?;

    let file = File::open(path).map_err(|e| read_error(path, e))?;
    let reader: Box<dyn Read> = if is_gzip(path) {
        Box::new(GzDecoder::new(BufReader::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };

    match format {
        DataFormat::Json => json::parse_reader(reader, &source_name),
        DataFormat::Csv => table::parse_reader(reader, &source_name),
    }
}

fn is_gzip(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("gz"))
}

fn read_error(path: &Path, err: io::Error) -> DataLoadError {
    if err.kind() == io::ErrorKind::NotFound {
        DataLoadError::Missing {
            path: path.to_path_buf(),
        }
    } else {
        DataLoadError::Read {
            path: path.to_path_buf(),
            reason: err.to_string(),
        }
    }
}

/// Flatten the hierarchy into records, validating names and codes.
pub fn build_store(
    hierarchy: Hierarchy,
    source_name: &str,
    policy: DuplicatePolicy,
) -> Result<RecordStore, DataLoadError> {
    let malformed = |reason: String| DataLoadError::Malformed {
        source_name: source_name.to_string(),
        reason,
    };

    let mut builder = RecordStore::builder(policy);

    for (region, provinces) in hierarchy {
        let region = region.trim();
        if region.is_empty() {
            return Err(malformed("empty region name".to_string()));
        }
        for (province, cities) in provinces {
            let province = province.trim();
            if province.is_empty() {
                return Err(malformed(format!("empty province name in {region}")));
            }
            for (city, codes) in cities {
                let city = city.trim();
                if city.is_empty() {
                    return Err(malformed(format!(
                        "empty city/municipality name in {province}, {region}"
                    )));
                }
                for code in codes {
                    let code = code.trim();
                    if code.is_empty() {
                        return Err(malformed(format!("empty zip code for {city}, {province}")));
                    }
                    builder.insert(ZipRecord::new(code, city, province, region))?;
                }
            }
        }
    }

    if builder.is_empty() {
        return Err(DataLoadError::Empty {
            source_name: source_name.to_string(),
        });
    }

    Ok(builder.finish())
}
