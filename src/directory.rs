//! Query engine over the zip code store.
//!
//! The store is parsed on first use and shared read-only afterwards. Every
//! operation that scans the whole table goes through the [`ResultCache`].

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use tracing::debug;

use crate::cache::{CachePolicy, CacheStats, QueryKey, ResultCache};
use crate::config::DirectoryConfig;
use crate::error::{DataLoadError, Result};
use crate::loader::{self, DataSource};
use crate::matching::{fold_case, MatchKind};
use crate::models::{CityZip, FieldSet, SearchField, ZipRecord};
use crate::store::{DuplicatePolicy, RecordStore};

/// Search parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchParams {
    pub text: String,
    pub fields: FieldSet,
    pub match_kind: MatchKind,
}

impl SearchParams {
    /// Contains-match over all fields
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Build from caller-supplied names.
    ///
    /// The match kind is validated before the fields, so a request with both
    /// wrong reports `InvalidMatchKind`.
    pub fn parse<S: AsRef<str>>(
        text: impl Into<String>,
        fields: &[S],
        match_kind: &str,
    ) -> Result<Self> {
        let match_kind = match_kind.parse::<MatchKind>()?;
        let fields = FieldSet::parse(fields)?;
        Ok(Self {
            text: text.into(),
            fields,
            match_kind,
        })
    }

    pub fn fields(mut self, fields: FieldSet) -> Self {
        self.fields = fields;
        self
    }

    pub fn match_kind(mut self, match_kind: MatchKind) -> Self {
        self.match_kind = match_kind;
        self
    }
}

/// Read-only zip code directory.
pub struct ZipDirectory {
    source: DataSource,
    duplicates: DuplicatePolicy,
    store: OnceLock<std::result::Result<RecordStore, DataLoadError>>,
    cache: ResultCache,
    scans: AtomicU64,
    loads: AtomicU64,
}

impl ZipDirectory {
    /// Create a directory; the data source is not read until the first query.
    pub fn new(config: DirectoryConfig) -> Self {
        Self {
            source: config.data.source(),
            duplicates: config.duplicates,
            store: OnceLock::new(),
            cache: ResultCache::new(config.cache.policy()),
            scans: AtomicU64::new(0),
            loads: AtomicU64::new(0),
        }
    }

    /// Directory over the dataset compiled into the crate
    pub fn bundled() -> Self {
        Self::new(DirectoryConfig::default())
    }

    /// Wrap an already built store.
    pub fn from_store(store: RecordStore, cache: CachePolicy) -> Self {
        Self {
            source: DataSource::Bundled,
            duplicates: DuplicatePolicy::default(),
            store: OnceLock::from(Ok(store)),
            cache: ResultCache::new(cache),
            scans: AtomicU64::new(0),
            loads: AtomicU64::new(0),
        }
    }

    /// Process-wide directory over the bundled dataset.
    pub fn global() -> &'static ZipDirectory {
        static INSTANCE: OnceLock<ZipDirectory> = OnceLock::new();
        INSTANCE.get_or_init(ZipDirectory::bundled)
    }

    /// The record store, loading it on first call.
    ///
    /// A load failure is kept and returned to every later caller; the data
    /// is static, so loading again would fail the same way.
    pub fn store(&self) -> Result<&RecordStore> {
        self.store
            .get_or_init(|| {
                self.loads.fetch_add(1, Ordering::Relaxed);
                loader::load(&self.source, self.duplicates)
            })
            .as_ref()
            .map_err(|e| e.clone().into())
    }

    pub fn is_loaded(&self) -> bool {
        self.store.get().is_some()
    }

    /// Look up one zip code. Unknown codes give `Ok(None)`.
    pub fn find_by_zip(&self, code: &str) -> Result<Option<&ZipRecord>> {
        Ok(self.store()?.get(code))
    }

    /// All zip codes of a city/municipality, matched case-insensitively.
    pub fn find_by_city(&self, name: &str) -> Result<Arc<[CityZip]>> {
        let store = self.store()?;
        let name = fold_case(name);

        let rows: Arc<[CityZip]> = self
            .cache
            .get_or_compute(QueryKey::FindByCity(name.clone()), || {
                self.record_scan("find_by_city");
                store
                    .iter_folded()
                    .filter(|(_, folded)| folded.get(SearchField::CityMunicipality) == name)
                    .map(|(record, _)| record.to_city_zip())
                    .collect()
            });

        Ok(rows)
    }

    /// Records where any requested field matches the query text.
    pub fn search(&self, params: &SearchParams) -> Result<Arc<[ZipRecord]>> {
        let store = self.store()?;
        let query = fold_case(&params.text);
        let fields = params.fields;
        let key = QueryKey::Search {
            query: query.clone(),
            fields,
            match_kind: params.match_kind,
        };

        let records: Arc<[ZipRecord]> = self.cache.get_or_compute(key, || {
            self.record_scan("search");
            let matches = params.match_kind.predicate();
            store
                .iter_folded()
                .filter(|(_, folded)| fields.iter().any(|f| matches(folded.get(f), &query)))
                .map(|(record, _)| record.clone())
                .collect()
        });

        Ok(records)
    }

    /// `search` with field and match-kind names as given by a caller.
    pub fn search_by_names<S: AsRef<str>>(
        &self,
        text: &str,
        fields: &[S],
        match_kind: &str,
    ) -> Result<Arc<[ZipRecord]>> {
        let params = SearchParams::parse(text, fields, match_kind)?;
        self.search(&params)
    }

    /// Sorted distinct region names
    pub fn get_regions(&self) -> Result<Arc<[String]>> {
        let store = self.store()?;
        Ok(self.cache.get_or_compute(QueryKey::Regions, || {
            self.record_scan("get_regions");
            sorted_unique(store.iter().map(|r| r.region.as_str()))
        }))
    }

    /// Sorted distinct provinces of `region` (exact name).
    pub fn get_provinces(&self, region: &str) -> Result<Arc<[String]>> {
        let store = self.store()?;
        Ok(self
            .cache
            .get_or_compute(QueryKey::Provinces(region.to_string()), || {
                self.record_scan("get_provinces");
                sorted_unique(
                    store
                        .iter()
                        .filter(|r| r.region == region)
                        .map(|r| r.province.as_str()),
                )
            }))
    }

    /// Sorted distinct cities/municipalities of `province` (exact name).
    pub fn get_cities(&self, province: &str) -> Result<Arc<[String]>> {
        let store = self.store()?;
        Ok(self
            .cache
            .get_or_compute(QueryKey::Cities(province.to_string()), || {
                self.record_scan("get_cities");
                sorted_unique(
                    store
                        .iter()
                        .filter(|r| r.province == province)
                        .map(|r| r.city_municipality.as_str()),
                )
            }))
    }

    /// Number of full-table scans performed so far
    pub fn scan_count(&self) -> u64 {
        self.scans.load(Ordering::Relaxed)
    }

    /// Number of times the data source has been read
    pub fn load_count(&self) -> u64 {
        self.loads.load(Ordering::Relaxed)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    fn record_scan(&self, operation: &str) {
        self.scans.fetch_add(1, Ordering::Relaxed);
        debug!(operation, "Cache miss, scanning store");
    }
}

impl std::fmt::Debug for ZipDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZipDirectory")
            .field("source", &self.source)
            .field("loaded", &self.is_loaded())
            .field("cache", &self.cache)
            .finish()
    }
}

fn sorted_unique<'a>(names: impl Iterator<Item = &'a str>) -> Arc<[String]> {
    names
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DirectoryError;

    fn sample() -> ZipDirectory {
        let doc = r#"{
            "NCR (National Capital Region)": {
                "Metro Manila": {
                    "Ermita": ["1000"],
                    "Makati": ["1200", "1209"],
                    "San Juan": ["1500"]
                }
            },
            "Region 4A (CALABARZON)": {
                "Cavite": {
                    "Dasmariñas": ["4114", "4115"],
                    "Bacoor": ["4102"]
                },
                "Batangas": {
                    "San Juan": ["4226"]
                }
            }
        }"#;
        let hierarchy = serde_json::from_str(doc).unwrap();
        let store = loader::build_store(hierarchy, "sample", DuplicatePolicy::Error).unwrap();
        ZipDirectory::from_store(store, CachePolicy::default())
    }

    fn codes(records: &[ZipRecord]) -> Vec<&str> {
        records.iter().map(|r| r.code.as_str()).collect()
    }

    #[test]
    fn test_find_by_zip() {
        let dir = sample();
        let record = dir.find_by_zip("4114").unwrap().unwrap();
        assert_eq!(record.city_municipality, "Dasmariñas");
        assert!(dir.find_by_zip("99999").unwrap().is_none());
        assert!(dir.find_by_zip("").unwrap().is_none());
    }

    #[test]
    fn test_find_by_city_case_insensitive_and_ordered() {
        let dir = sample();
        let rows = dir.find_by_city("SAN JUAN").unwrap();
        let zips: Vec<&str> = rows.iter().map(|r| r.zip_code.as_str()).collect();
        assert_eq!(zips, vec!["1500", "4226"]);
        assert_eq!(rows[1].province, "Batangas");

        let rows = dir.find_by_city("dasmariñas").unwrap();
        assert_eq!(rows.len(), 2);

        assert!(dir.find_by_city("Atlantis").unwrap().is_empty());
        // Exact, not substring
        assert!(dir.find_by_city("San").unwrap().is_empty());
    }

    #[test]
    fn test_search_contains_all_fields() {
        let dir = sample();
        let results = dir.search(&SearchParams::new("cav")).unwrap();
        assert_eq!(codes(&results), vec!["4114", "4115", "4102"]);
    }

    #[test]
    fn test_search_empty_query_matches_everything() {
        let dir = sample();
        let store_len = dir.store().unwrap().len();
        assert_eq!(dir.search(&SearchParams::new("")).unwrap().len(), store_len);

        let prefix = SearchParams::new("").match_kind(MatchKind::StartsWith);
        assert_eq!(dir.search(&prefix).unwrap().len(), store_len);
    }

    #[test]
    fn test_search_case_variants_are_identical() {
        let dir = sample();
        let lower = dir.search(&SearchParams::new("manila")).unwrap();
        let upper = dir.search(&SearchParams::new("MANILA")).unwrap();
        assert_eq!(lower, upper);
        assert_eq!(lower.len(), 4);
    }

    #[test]
    fn test_search_match_kinds_are_subsets_of_contains() {
        let dir = sample();
        let contains = dir.search(&SearchParams::new("san")).unwrap();
        let starts = dir
            .search(&SearchParams::new("san").match_kind(MatchKind::StartsWith))
            .unwrap();
        let exact = dir
            .search(&SearchParams::new("san juan").match_kind(MatchKind::Exact))
            .unwrap();

        assert_eq!(codes(&starts), vec!["1500", "4226"]);
        assert_eq!(codes(&exact), vec!["1500", "4226"]);
        for record in starts.iter() {
            assert!(contains.contains(record));
        }
    }

    #[test]
    fn test_search_restricted_fields() {
        let dir = sample();
        let params = SearchParams::new("NCR").fields(FieldSet::from_fields([SearchField::Region]));
        let results = dir.search(&params).unwrap();
        assert_eq!(results.len(), 4);
        assert!(results.iter().all(|r| r.region == "NCR (National Capital Region)"));

        // "Cavite" is a province, not a city name
        let params = SearchParams::new("cavite")
            .fields(FieldSet::from_fields([SearchField::CityMunicipality]));
        assert!(dir.search(&params).unwrap().is_empty());
    }

    #[test]
    fn test_search_empty_field_set_matches_nothing() {
        let dir = sample();
        let params = SearchParams::new("").fields(FieldSet::empty());
        assert!(dir.search(&params).unwrap().is_empty());
    }

    #[test]
    fn test_search_by_names_validates() {
        let dir = sample();
        let err = dir
            .search_by_names("x", &["no_such_field"], "contains")
            .unwrap_err();
        assert_eq!(err, DirectoryError::InvalidField("no_such_field".to_string()));

        let err = dir
            .search_by_names("x", &["region"], "bogus")
            .unwrap_err();
        assert_eq!(err, DirectoryError::InvalidMatchKind("bogus".to_string()));

        let err = dir.search_by_names("x", &["nope"], "bogus").unwrap_err();
        assert!(matches!(err, DirectoryError::InvalidMatchKind(_)));

        let ok = dir
            .search_by_names("makati", &["city_municipality"], "exact")
            .unwrap();
        assert_eq!(codes(&ok), vec!["1200", "1209"]);
    }

    #[test]
    fn test_hierarchy_enumeration() {
        let dir = sample();
        assert_eq!(
            &*dir.get_regions().unwrap(),
            &["NCR (National Capital Region)", "Region 4A (CALABARZON)"]
        );
        assert_eq!(
            &*dir.get_provinces("Region 4A (CALABARZON)").unwrap(),
            &["Batangas", "Cavite"]
        );
        assert_eq!(&*dir.get_cities("Cavite").unwrap(), &["Bacoor", "Dasmariñas"]);

        assert!(dir.get_provinces("Atlantis").unwrap().is_empty());
        assert!(dir.get_cities("Atlantis").unwrap().is_empty());
        // Names are matched exactly
        assert!(dir.get_provinces("region 4a (calabarzon)").unwrap().is_empty());
    }

    #[test]
    fn test_repeated_calls_hit_cache() {
        let dir = sample();
        let first = dir.search(&SearchParams::new("san")).unwrap();
        let scans = dir.scan_count();

        let second = dir.search(&SearchParams::new("SAN")).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(dir.scan_count(), scans);

        let regions = dir.get_regions().unwrap();
        let again = dir.get_regions().unwrap();
        assert!(Arc::ptr_eq(&regions, &again));
        assert_eq!(dir.scan_count(), scans + 1);

        let stats = dir.cache_stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 2);
    }

    #[test]
    fn test_disabled_cache_rescans_but_results_equal() {
        let doc = r#"{"R": {"P": {"C": ["1"]}}}"#;
        let store = loader::build_store(
            serde_json::from_str(doc).unwrap(),
            "test",
            DuplicatePolicy::Error,
        )
        .unwrap();
        let dir = ZipDirectory::from_store(store, CachePolicy::Disabled);

        let a = dir.get_regions().unwrap();
        let b = dir.get_regions().unwrap();
        assert_eq!(a, b);
        assert_eq!(dir.scan_count(), 2);
    }

    #[test]
    fn test_load_failure_is_reported_to_every_call() {
        let config = DirectoryConfig::default().with_data_path("/no/such/zips.json");
        let dir = ZipDirectory::new(config);
        assert!(!dir.is_loaded());

        let err = dir.find_by_zip("1000").unwrap_err();
        assert!(matches!(
            err,
            DirectoryError::DataLoad(DataLoadError::Missing { .. })
        ));
        assert!(dir.is_loaded());

        assert!(matches!(dir.get_regions(), Err(DirectoryError::DataLoad(_))));
        assert!(matches!(
            dir.search(&SearchParams::new("x")),
            Err(DirectoryError::DataLoad(_))
        ));
    }

    #[test]
    fn test_concurrent_first_access_loads_once() {
        let dir = Arc::new(ZipDirectory::bundled());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let dir = Arc::clone(&dir);
                std::thread::spawn(move || dir.store().map(|s| s as *const RecordStore as usize))
            })
            .collect();

        let addrs: Vec<usize> = handles
            .into_iter()
            .map(|h| h.join().unwrap().unwrap())
            .collect();
        assert!(addrs.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(dir.load_count(), 1);

        dir.get_regions().unwrap();
        assert_eq!(dir.load_count(), 1);
    }

    #[test]
    fn test_prebuilt_store_is_never_loaded() {
        let dir = sample();
        dir.find_by_zip("1000").unwrap();
        assert_eq!(dir.load_count(), 0);
    }

    #[test]
    fn test_oversized_ttl_does_not_panic() {
        let mut config = DirectoryConfig::default();
        config.cache.ttl_secs = u64::MAX;
        let dir = ZipDirectory::new(config);

        let first = dir.get_regions().unwrap();
        let second = dir.get_regions().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
