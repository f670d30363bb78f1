//! Memoization of scan-based query results.
//!
//! Entries are keyed by the operation and its normalized arguments. Values
//! are `Arc`-shared slices, so a cache hit hands back the same allocation as
//! the call that populated it.

use moka::policy::EvictionPolicy;
use moka::sync::Cache;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::matching::MatchKind;
use crate::models::{CityZip, FieldSet, ZipRecord};

/// Default maximum number of cached results.
pub const DEFAULT_CAPACITY: u64 = 1000;

/// Default time-to-live for a cached result.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Longest accepted time-to-live (100 years). moka refuses anything past
/// 1000 years, so longer values are clamped to this.
pub const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Retention policy for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// At most `capacity` entries, least-recently-used evicted first,
    /// each entry expiring `ttl` after it was computed
    Bounded { capacity: u64, ttl: Duration },
    /// Every call recomputes
    Disabled,
}

impl Default for CachePolicy {
    fn default() -> Self {
        CachePolicy::Bounded {
            capacity: DEFAULT_CAPACITY,
            ttl: DEFAULT_TTL,
        }
    }
}

/// Operation plus normalized arguments.
///
/// Text arguments of case-insensitive operations are stored case-folded, so
/// "MANILA" and "manila" share an entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    FindByCity(String),
    Search {
        query: String,
        fields: FieldSet,
        match_kind: MatchKind,
    },
    Regions,
    Provinces(String),
    Cities(String),
}

#[derive(Debug, Clone)]
pub enum CachedValue {
    Records(Arc<[ZipRecord]>),
    CityZips(Arc<[CityZip]>),
    Names(Arc<[String]>),
}

/// Result types that can live in the cache.
pub trait Cacheable: Sized {
    fn into_cached(self) -> CachedValue;
    fn from_cached(value: CachedValue) -> Option<Self>;
}

impl Cacheable for Arc<[ZipRecord]> {
    fn into_cached(self) -> CachedValue {
        CachedValue::Records(self)
    }

    fn from_cached(value: CachedValue) -> Option<Self> {
        match value {
            CachedValue::Records(v) => Some(v),
            _ => None,
        }
    }
}

impl Cacheable for Arc<[CityZip]> {
    fn into_cached(self) -> CachedValue {
        CachedValue::CityZips(self)
    }

    fn from_cached(value: CachedValue) -> Option<Self> {
        match value {
            CachedValue::CityZips(v) => Some(v),
            _ => None,
        }
    }
}

impl Cacheable for Arc<[String]> {
    fn into_cached(self) -> CachedValue {
        CachedValue::Names(self)
    }

    fn from_cached(value: CachedValue) -> Option<Self> {
        match value {
            CachedValue::Names(v) => Some(v),
            _ => None,
        }
    }
}

/// Hit/miss counters since construction (or the last `clear`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: u64,
}

pub struct ResultCache {
    inner: Option<Cache<QueryKey, CachedValue>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResultCache {
    pub fn new(policy: CachePolicy) -> Self {
        let inner = match policy {
            CachePolicy::Bounded { capacity, ttl } => Some(
                Cache::builder()
                    .max_capacity(capacity)
                    .time_to_live(ttl.min(MAX_TTL))
                    .eviction_policy(EvictionPolicy::lru())
                    .build(),
            ),
            CachePolicy::Disabled => None,
        };

        Self {
            inner,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Return the cached value for `key`, computing and storing it on a miss.
    ///
    /// Concurrent callers missing on the same key wait for a single
    /// computation.
    pub fn get_or_compute<T, F>(&self, key: QueryKey, compute: F) -> T
    where
        T: Cacheable,
        F: Fn() -> T,
    {
        let Some(cache) = &self.inner else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return compute();
        };

        let mut computed = false;
        let value = cache.get_with(key, || {
            computed = true;
            compute().into_cached()
        });

        if computed {
            self.misses.fetch_add(1, Ordering::Relaxed);
        } else {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }

        T::from_cached(value).unwrap_or_else(|| {
            debug!("Cached value has unexpected type, recomputing");
            compute()
        })
    }

    pub fn stats(&self) -> CacheStats {
        let entries = self
            .inner
            .as_ref()
            .map(|c| {
                c.run_pending_tasks();
                c.entry_count()
            })
            .unwrap_or(0);

        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries,
        }
    }

    /// Drop all entries and reset counters
    pub fn clear(&self) {
        if let Some(cache) = &self.inner {
            cache.invalidate_all();
            cache.run_pending_tasks();
        }
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(CachePolicy::default())
    }
}

impl std::fmt::Debug for ResultCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultCache")
            .field("enabled", &self.inner.is_some())
            .field("hits", &self.hits.load(Ordering::Relaxed))
            .field("misses", &self.misses.load(Ordering::Relaxed))
            .finish()
    }
}
