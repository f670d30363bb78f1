//! Directory configuration, loadable from a TOML file.
//!
//! ```toml
//! duplicates = "error"        # or "last_write_wins"
//!
//! [data]
//! path = "/srv/zips.csv.gz"   # omit to use the bundled dataset
//! format = "csv"              # optional, otherwise taken from the extension
//!
//! [cache]
//! enabled = true
//! capacity = 1000
//! ttl_secs = 3600
//! ```

use anyhow::{ensure, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cache::{CachePolicy, DEFAULT_CAPACITY, DEFAULT_TTL, MAX_TTL};
use crate::loader::{DataFormat, DataSource};
use crate::store::DuplicatePolicy;

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct DirectoryConfig {
    pub data: DataConfig,
    pub cache: CacheConfig,
    pub duplicates: DuplicatePolicy,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct DataConfig {
    pub path: Option<PathBuf>,
    pub format: Option<DataFormat>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    pub enabled: bool,
    pub capacity: u64,
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: DEFAULT_CAPACITY,
            ttl_secs: DEFAULT_TTL.as_secs(),
        }
    }
}

impl DirectoryConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: DirectoryConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.cache.ttl_secs <= MAX_TTL.as_secs(),
            "cache.ttl_secs = {} exceeds the maximum of {} seconds",
            self.cache.ttl_secs,
            MAX_TTL.as_secs()
        );
        Ok(())
    }

    /// Config reading `path` instead of the bundled dataset
    pub fn with_data_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.data.path = Some(path.into());
        self
    }
}

impl DataConfig {
    pub fn source(&self) -> DataSource {
        match &self.path {
            Some(path) => DataSource::File {
                path: path.clone(),
                format: self.format,
            },
            None => DataSource::Bundled,
        }
    }
}

impl CacheConfig {
    pub fn policy(&self) -> CachePolicy {
        if !self.enabled || self.capacity == 0 {
            return CachePolicy::Disabled;
        }
        CachePolicy::Bounded {
            capacity: self.capacity,
            ttl: Duration::from_secs(self.ttl_secs),
        }
    }
}
