//! In-memory cache for list (page-loader) responses.
//!
//! Every write invalidates all list caches: customer writes change address
//! counts, pet writes change customer counts, and so on.

use std::{
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use db::models::{
    address::AddressWithCustomerCount, customer::CustomerSummary, pet::PetSummary,
    schedule::ScheduleWithPet,
};
use moka::future::Cache;
use serde::Serialize;
use ts_rs::TS;
use utils::pagination::Page;

const MAX_ENTRIES_PER_CACHE: u64 = 1_000;

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub name: String,
    pub entries: u64,
    pub hits: u64,
    pub misses: u64,
    pub invalidations: u64,
    pub hit_rate: f64,
}

pub struct QueryCache<V> {
    name: &'static str,
    cache: Cache<String, V>,
    generation: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    invalidations: AtomicU64,
}

impl<V> QueryCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new(name: &'static str, ttl: Duration) -> Self {
        Self {
            name,
            cache: Cache::builder()
                .max_capacity(MAX_ENTRIES_PER_CACHE)
                .time_to_live(ttl)
                .build(),
            generation: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            invalidations: AtomicU64::new(0),
        }
    }

    /// Return the cached value for `key` or run `load` and cache its result.
    ///
    /// A result loaded across an invalidation is returned but not cached.
    pub async fn get_or_load<F, Fut, E>(&self, key: String, load: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.cache.get(&key).await {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(value);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let generation = self.generation.load(Ordering::Acquire);
        let value = load().await?;
        if self.generation.load(Ordering::Acquire) == generation {
            self.cache.insert(key, value.clone()).await;
        }
        Ok(value)
    }

    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.invalidations.fetch_add(1, Ordering::Relaxed);
        self.cache.invalidate_all();
    }

    pub async fn stats(&self) -> CacheStats {
        self.cache.run_pending_tasks().await;
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let lookups = hits + misses;
        CacheStats {
            name: self.name.to_string(),
            entries: self.cache.entry_count(),
            hits,
            misses,
            invalidations: self.invalidations.load(Ordering::Relaxed),
            hit_rate: if lookups == 0 {
                0.0
            } else {
                hits as f64 / lookups as f64
            },
        }
    }
}

struct ListCachesInner {
    addresses: QueryCache<Page<AddressWithCustomerCount>>,
    customers: QueryCache<Page<CustomerSummary>>,
    pets: QueryCache<Page<PetSummary>>,
    schedules: QueryCache<Page<ScheduleWithPet>>,
}

/// One cache per list endpoint, shared across requests.
#[derive(Clone)]
pub struct ListCaches {
    inner: Arc<ListCachesInner>,
}

impl ListCaches {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(ListCachesInner {
                addresses: QueryCache::new("addresses", ttl),
                customers: QueryCache::new("customers", ttl),
                pets: QueryCache::new("pets", ttl),
                schedules: QueryCache::new("schedules", ttl),
            }),
        }
    }

    pub fn addresses(&self) -> &QueryCache<Page<AddressWithCustomerCount>> {
        &self.inner.addresses
    }

    pub fn customers(&self) -> &QueryCache<Page<CustomerSummary>> {
        &self.inner.customers
    }

    pub fn pets(&self) -> &QueryCache<Page<PetSummary>> {
        &self.inner.pets
    }

    pub fn schedules(&self) -> &QueryCache<Page<ScheduleWithPet>> {
        &self.inner.schedules
    }

    pub fn invalidate_all(&self) {
        self.inner.addresses.invalidate();
        self.inner.customers.invalidate();
        self.inner.pets.invalidate();
        self.inner.schedules.invalidate();
    }

    pub async fn stats(&self) -> Vec<CacheStats> {
        vec![
            self.inner.addresses.stats().await,
            self.inner.customers.stats().await,
            self.inner.pets.stats().await,
            self.inner.schedules.stats().await,
        ]
    }
}
