//! phzip - Philippine zip code lookup.
//!
//! A read-only directory over a region → province → city/municipality → zip
//! code dataset. The dataset ships inside the crate; a JSON or CSV file can be
//! configured instead.
//!
//! ```
//! let record = phzip::find_by_zip("4114").unwrap().unwrap();
//! assert_eq!(record.province, "Cavite");
//! ```
//!
//! The free functions here use [`ZipDirectory::global`]. Build a
//! [`ZipDirectory`] directly to use another data source or cache policy.

pub mod cache;
pub mod config;
pub mod directory;
pub mod error;
pub mod loader;
pub mod matching;
pub mod models;
pub mod store;

use std::sync::Arc;

pub use cache::{CachePolicy, CacheStats};
pub use config::DirectoryConfig;
pub use directory::{SearchParams, ZipDirectory};
pub use error::{DataLoadError, DirectoryError, Result};
pub use loader::{DataFormat, DataSource};
pub use matching::MatchKind;
pub use models::{CityZip, FieldSet, SearchField, ZipRecord};
pub use store::{DuplicatePolicy, RecordStore};

pub fn find_by_zip(code: &str) -> Result<Option<&'static ZipRecord>> {
    ZipDirectory::global().find_by_zip(code)
}

pub fn find_by_city(name: &str) -> Result<Arc<[CityZip]>> {
    ZipDirectory::global().find_by_city(name)
}

pub fn search(params: &SearchParams) -> Result<Arc<[ZipRecord]>> {
    ZipDirectory::global().search(params)
}

pub fn search_by_names<S: AsRef<str>>(
    text: &str,
    fields: &[S],
    match_kind: &str,
) -> Result<Arc<[ZipRecord]>> {
    ZipDirectory::global().search_by_names(text, fields, match_kind)
}

pub fn get_regions() -> Result<Arc<[String]>> {
    ZipDirectory::global().get_regions()
}

pub fn get_provinces(region: &str) -> Result<Arc<[String]>> {
    ZipDirectory::global().get_provinces(region)
}

pub fn get_cities(province: &str) -> Result<Arc<[String]>> {
    ZipDirectory::global().get_cities(province)
}
