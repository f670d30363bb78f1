//! Zip code records as stored and returned by the directory.

use serde::{Deserialize, Serialize};

/// One zip code with the location it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ZipRecord {
    /// Zip code, unique across the dataset (e.g. "4114")
    pub code: String,

    /// City or municipality name (e.g. "Dasmariñas")
    pub city_municipality: String,

    /// Province name (e.g. "Cavite")
    pub province: String,

    /// Region name (e.g. "Region 4A (CALABARZON)")
    pub region: String,
}

impl ZipRecord {
    pub fn new(
        code: impl Into<String>,
        city_municipality: impl Into<String>,
        province: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            city_municipality: city_municipality.into(),
            province: province.into(),
            region: region.into(),
        }
    }

    /// Project to the row returned by a city/municipality lookup
    pub fn to_city_zip(&self) -> CityZip {
        CityZip {
            zip_code: self.code.clone(),
            province: self.province.clone(),
            region: self.region.clone(),
        }
    }
}

impl std::fmt::Display for ZipRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {}, {}, {}",
            self.code, self.city_municipality, self.province, self.region
        )
    }
}

/// A zip code found by city/municipality name, with its parent areas.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CityZip {
    pub zip_code: String,
    pub province: String,
    pub region: String,
}
