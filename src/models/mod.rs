//! Core data models for the zip code directory.

pub mod field;
pub mod record;

pub use field::{FieldSet, SearchField};
pub use record::{CityZip, ZipRecord};
