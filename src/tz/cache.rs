use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        RwLock, RwLockReadGuard, RwLockWriteGuard,
    },
    time::{Duration, Instant as MonotonicInstant},
};

use crate::tz::TimeZone;

/// A bounded cache of loaded zones, keyed by a provider's zone index.
///
/// When the cache holds `capacity` zones, inserting another evicts the
/// least recently used one. When a TTL is set, an entry older than the TTL
/// is treated as absent and must be reloaded by the caller. Either way,
/// eviction only ever makes a provider go back to its store.
#[derive(Debug)]
pub(crate) struct ZoneCache {
    capacity: usize,
    ttl: Option<Duration>,
    entries: RwLock<BTreeMap<usize, CachedZone>>,
    clock: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

#[derive(Debug)]
struct CachedZone {
    tz: TimeZone,
    expiration: Expiration,
    last_used: AtomicU64,
}

impl ZoneCache {
    pub(crate) const DEFAULT_CAPACITY: usize = 64;

    /// Creates an empty cache. A capacity of zero is treated as one.
    pub(crate) fn new(capacity: usize, ttl: Option<Duration>) -> ZoneCache {
        ZoneCache {
            capacity: capacity.max(1),
            ttl,
            entries: RwLock::new(BTreeMap::new()),
            clock: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Returns the resident, unexpired zone for the given key.
    pub(crate) fn get(&self, key: usize) -> Option<TimeZone> {
        let entries = self.read();
        let Some(czone) = entries.get(&key) else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        };
        if czone.expiration.is_expired() {
            debug!("cached zone {} expired, reloading it", czone.tz.id());
            self.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        }
        czone.last_used.store(self.tick(), Ordering::Relaxed);
        self.hits.fetch_add(1, Ordering::Relaxed);
        Some(czone.tz.clone())
    }

    /// Publishes a freshly loaded zone and returns the zone callers should
    /// use.
    ///
    /// If another thread published an unexpired zone for the same key in
    /// the meantime, that zone wins and the given one is dropped. This way
    /// concurrent loads of the same key all hand out one value.
    pub(crate) fn insert(&self, key: usize, tz: TimeZone) -> TimeZone {
        let mut entries = self.write();
        if let Some(czone) = entries.get(&key) {
            if !czone.expiration.is_expired() {
                czone.last_used.store(self.tick(), Ordering::Relaxed);
                return czone.tz.clone();
            }
        }
        if !entries.contains_key(&key) && entries.len() >= self.capacity {
            self.evict_one(&mut entries);
        }
        let expiration = match self.ttl {
            None => Expiration::never(),
            Some(ttl) => Expiration::after(ttl),
        };
        let last_used = AtomicU64::new(self.tick());
        let czone = CachedZone { tz: tz.clone(), expiration, last_used };
        entries.insert(key, czone);
        tz
    }

    /// Drops every resident zone.
    pub(crate) fn clear(&self) {
        let mut entries = self.write();
        let evicted = u64::try_from(entries.len()).unwrap_or(u64::MAX);
        self.evictions.fetch_add(evicted, Ordering::Relaxed);
        trace!("clearing {} cached zones", entries.len());
        entries.clear();
    }

    pub(crate) fn stats(&self) -> CacheStats {
        CacheStats {
            resident: self.read().len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    fn evict_one(&self, entries: &mut BTreeMap<usize, CachedZone>) {
        let lru = entries
            .iter()
            .min_by_key(|(_, czone)| czone.last_used.load(Ordering::Relaxed))
            .map(|(&key, _)| key);
        if let Some(czone) = lru.and_then(|key| entries.remove(&key)) {
            trace!("evicted zone {} from cache", czone.tz.id());
            self.evictions.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<usize, CachedZone>> {
        self.entries.read().unwrap_or_else(|err| err.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<usize, CachedZone>> {
        self.entries.write().unwrap_or_else(|err| err.into_inner())
    }
}

/// A snapshot of a provider's zone cache counters.
///
/// This is returned by
/// [`TableProvider::cache_stats`](crate::tz::TableProvider::cache_stats).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CacheStats {
    resident: usize,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl CacheStats {
    /// The number of zones currently held by the cache.
    pub fn resident(&self) -> usize {
        self.resident
    }

    /// The number of lookups answered from the cache.
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// The number of lookups that had to go to the store, including
    /// lookups of expired entries.
    pub fn misses(&self) -> u64 {
        self.misses
    }

    /// The number of zones dropped to make room or by an explicit clear.
    pub fn evictions(&self) -> u64 {
        self.evictions
    }
}

#[derive(Clone, Copy, Debug)]
struct Expiration(Option<MonotonicInstant>);

impl Expiration {
    /// Returns an expiration time for which `is_expired` returns true after
    /// the given duration has elapsed from this instant. A duration too big
    /// to represent never expires.
    fn after(ttl: Duration) -> Expiration {
        Expiration(MonotonicInstant::now().checked_add(ttl))
    }

    /// Returns an expiration time for which `is_expired` never returns true.
    fn never() -> Expiration {
        Expiration(None)
    }

    fn is_expired(self) -> bool {
        self.0.map_or(false, |t| MonotonicInstant::now() > t)
    }
}
