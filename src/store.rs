//! Immutable in-memory index of zip code records.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::DataLoadError;
use crate::matching::fold_case;
use crate::models::{SearchField, ZipRecord};

/// What to do when the source lists the same zip code twice with
/// different locations. Identical repeats are always collapsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Reject the source with `ConflictingDuplicate`
    #[default]
    Error,
    /// Keep the later record at the earlier record's position
    LastWriteWins,
}

/// Lower-cased copies of the searchable fields, computed once at build time.
#[derive(Debug, Clone)]
struct FoldedFields {
    city_municipality: String,
    province: String,
    region: String,
}

impl FoldedFields {
    fn new(record: &ZipRecord) -> Self {
        Self {
            city_municipality: fold_case(&record.city_municipality),
            province: fold_case(&record.province),
            region: fold_case(&record.region),
        }
    }

    fn get(&self, field: SearchField) -> &str {
        match field {
            SearchField::CityMunicipality => &self.city_municipality,
            SearchField::Province => &self.province,
            SearchField::Region => &self.region,
        }
    }
}

/// All records keyed by zip code, iterated in source order.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Vec<ZipRecord>,
    folded: Vec<FoldedFields>,
    by_code: HashMap<String, usize>,
}

impl RecordStore {
    pub fn builder(policy: DuplicatePolicy) -> RecordStoreBuilder {
        RecordStoreBuilder {
            policy,
            store: RecordStore::default(),
        }
    }

    /// O(1) lookup by zip code
    pub fn get(&self, code: &str) -> Option<&ZipRecord> {
        self.by_code.get(code).map(|&idx| &self.records[idx])
    }

    /// Iterate records in source traversal order
    pub fn iter(&self) -> impl Iterator<Item = &ZipRecord> {
        self.records.iter()
    }

    /// Iterate records paired with a view of their case-folded fields
    pub(crate) fn iter_folded(&self) -> impl Iterator<Item = (&ZipRecord, FoldedView<'_>)> {
        self.records
            .iter()
            .zip(self.folded.iter().map(FoldedView))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Read access to a record's case-folded fields.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FoldedView<'a>(&'a FoldedFields);

impl<'a> FoldedView<'a> {
    pub(crate) fn get(&self, field: SearchField) -> &'a str {
        self.0.get(field)
    }
}

/// Accumulates records in order, enforcing code uniqueness.
#[derive(Debug)]
pub struct RecordStoreBuilder {
    policy: DuplicatePolicy,
    store: RecordStore,
}

impl RecordStoreBuilder {
    pub fn insert(&mut self, record: ZipRecord) -> Result<(), DataLoadError> {
        let store = &mut self.store;

        if let Some(&idx) = store.by_code.get(&record.code) {
            let existing = &store.records[idx];
            if *existing == record {
                return Ok(());
            }

            return match self.policy {
                DuplicatePolicy::Error => Err(DataLoadError::ConflictingDuplicate {
                    code: record.code.clone(),
                    first: Box::new(existing.clone()),
                    second: Box::new(record),
                }),
                DuplicatePolicy::LastWriteWins => {
                    warn!(
                        code = %record.code,
                        previous = %existing,
                        "Duplicate zip code, keeping later entry"
                    );
                    store.folded[idx] = FoldedFields::new(&record);
                    store.records[idx] = record;
                    Ok(())
                }
            };
        }

        store.by_code.insert(record.code.clone(), store.records.len());
        store.folded.push(FoldedFields::new(&record));
        store.records.push(record);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn finish(self) -> RecordStore {
        self.store
    }
}
