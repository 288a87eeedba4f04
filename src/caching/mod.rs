//! # Caching Module
//!
//! Thread-safe memo stores for fitness values. Two scopes use them: the
//! evaluator's external cache maps a whole decoded bicluster list to its
//! objective vector, and each objective may hold an internal cache mapping a
//! single bicluster key to its raw score.
//!
//! Values are deterministic for a given key, so a miss is computed outside
//! any lock and the first writer wins; a concurrent duplicate computation is
//! wasted work but never changes the stored value.
//!
//! Three backings are available:
//!
//! - [`LocalCache`]: one concurrent map shared by all workers (`dashmap`).
//! - [`BoundedCache`]: a shared map that evicts its oldest entries.
//! - [`PerWorkerCache`]: one map per worker thread (`thread_local`).

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::fmt::Debug;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use thread_local::ThreadLocal;

use crate::error::{MoebaError, OptionExt, Result, ResultExt};
use crate::options::ComponentSpec;

/// A key→value memo that can be shared between worker threads.
pub trait CacheStore<V>: Send + Sync + Debug {
    /// Looks a key up. Every call counts as one getter access.
    fn get(&self, key: &str) -> Option<V>;

    /// Stores `value` unless the key is already present and returns the
    /// value held by the cache afterwards.
    fn insert(&self, key: String, value: V) -> V;

    /// Number of stored entries.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of lookups performed so far.
    fn num_getters(&self) -> usize;

    /// Returns the cached value or computes, stores and returns it.
    fn get_or_insert_with(&self, key: &str, compute: &mut dyn FnMut() -> V) -> V {
        match self.get(key) {
            Some(value) => value,
            None => self.insert(key.to_string(), compute()),
        }
    }

    /// Like [`CacheStore::get_or_insert_with`] for a computation that can
    /// fail. A failed computation stores nothing.
    fn try_get_or_insert_with(
        &self,
        key: &str,
        compute: &mut dyn FnMut() -> Result<V>,
    ) -> Result<V> {
        match self.get(key) {
            Some(value) => Ok(value),
            None => Ok(self.insert(key.to_string(), compute()?)),
        }
    }
}

/// Which store to build for a cache scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBacking {
    Local,
    Bounded(usize),
    PerWorker,
}

impl CacheBacking {
    /// Parses `local`, `perworker` or `bounded(capacity=n)`.
    pub fn parse(raw: &str) -> Result<Self> {
        let spec = ComponentSpec::parse(raw)?;
        match spec.name.as_str() {
            "local" => Ok(Self::Local),
            "perworker" => Ok(Self::PerWorker),
            "bounded" => {
                let capacity = spec.get("capacity").ok_or_else_moeba(|| {
                    MoebaError::Configuration("bounded cache needs a capacity".to_string())
                })?;
                let capacity = capacity
                    .parse::<usize>()
                    .context(format!("invalid cache capacity {:?}", capacity))?;
                if capacity == 0 {
                    return Err(MoebaError::Configuration(
                        "cache capacity must be positive".to_string(),
                    ));
                }
                Ok(Self::Bounded(capacity))
            }
            other => Err(MoebaError::Configuration(format!(
                "unknown cache backing: {}",
                other
            ))),
        }
    }

    pub fn build<V>(self) -> Arc<dyn CacheStore<V>>
    where
        V: Clone + Send + Sync + Debug + 'static,
    {
        match self {
            Self::Local => Arc::new(LocalCache::new()),
            Self::Bounded(capacity) => Arc::new(BoundedCache::new(capacity)),
            Self::PerWorker => Arc::new(PerWorkerCache::new()),
        }
    }
}

/// Shared concurrent map.
#[derive(Debug)]
pub struct LocalCache<V> {
    map: DashMap<String, V>,
    getters: AtomicUsize,
}

impl<V> LocalCache<V> {
    pub fn new() -> Self {
        Self {
            map: DashMap::new(),
            getters: AtomicUsize::new(0),
        }
    }
}

impl<V> Default for LocalCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> CacheStore<V> for LocalCache<V>
where
    V: Clone + Send + Sync + Debug,
{
    fn get(&self, key: &str) -> Option<V> {
        self.getters.fetch_add(1, Ordering::Relaxed);
        self.map.get(key).map(|entry| entry.value().clone())
    }

    fn insert(&self, key: String, value: V) -> V {
        self.map.entry(key).or_insert(value).value().clone()
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn num_getters(&self) -> usize {
        self.getters.load(Ordering::Relaxed)
    }
}

#[derive(Debug)]
struct BoundedInner<V> {
    map: HashMap<String, V>,
    order: VecDeque<String>,
}

/// Shared map holding at most `capacity` entries; the oldest insertion is
/// evicted first.
#[derive(Debug)]
pub struct BoundedCache<V> {
    capacity: usize,
    inner: Mutex<BoundedInner<V>>,
    getters: AtomicUsize,
}

impl<V> BoundedCache<V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(BoundedInner {
                map: HashMap::new(),
                order: VecDeque::new(),
            }),
            getters: AtomicUsize::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BoundedInner<V>> {
        // entries are plain values, a panic elsewhere cannot leave them half written
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<V> CacheStore<V> for BoundedCache<V>
where
    V: Clone + Send + Sync + Debug,
{
    fn get(&self, key: &str) -> Option<V> {
        self.getters.fetch_add(1, Ordering::Relaxed);
        self.lock().map.get(key).cloned()
    }

    fn insert(&self, key: String, value: V) -> V {
        let mut inner = self.lock();
        if let Some(existing) = inner.map.get(&key) {
            return existing.clone();
        }
        while inner.map.len() >= self.capacity {
            match inner.order.pop_front() {
                Some(oldest) => {
                    inner.map.remove(&oldest);
                }
                None => break,
            }
        }
        inner.order.push_back(key.clone());
        inner.map.insert(key, value.clone());
        value
    }

    fn len(&self) -> usize {
        self.lock().map.len()
    }

    fn num_getters(&self) -> usize {
        self.getters.load(Ordering::Relaxed)
    }
}

/// One private map per thread. `len` counts entries across all threads.
#[derive(Debug)]
pub struct PerWorkerCache<V: Send> {
    cache: ThreadLocal<RefCell<HashMap<String, V>>>,
    entries: AtomicUsize,
    getters: AtomicUsize,
}

impl<V: Send> PerWorkerCache<V> {
    pub fn new() -> Self {
        Self {
            cache: ThreadLocal::new(),
            entries: AtomicUsize::new(0),
            getters: AtomicUsize::new(0),
        }
    }

    /// Entries stored by the calling thread.
    pub fn local_len(&self) -> usize {
        self.cache
            .get()
            .and_then(|cell| cell.try_borrow().ok())
            .map_or(0, |cache| cache.len())
    }
}

impl<V: Send> Default for PerWorkerCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> CacheStore<V> for PerWorkerCache<V>
where
    V: Clone + Send + Sync + Debug,
{
    fn get(&self, key: &str) -> Option<V> {
        self.getters.fetch_add(1, Ordering::Relaxed);
        self.cache
            .get()
            .and_then(|cell| cell.try_borrow().ok())
            .and_then(|cache| cache.get(key).cloned())
    }

    fn insert(&self, key: String, value: V) -> V {
        let cell = self.cache.get_or(|| RefCell::new(HashMap::new()));
        let Ok(mut cache) = cell.try_borrow_mut() else {
            return value;
        };
        if let Some(existing) = cache.get(&key) {
            return existing.clone();
        }
        cache.insert(key, value.clone());
        self.entries.fetch_add(1, Ordering::Relaxed);
        value
    }

    fn len(&self) -> usize {
        self.entries.load(Ordering::Relaxed)
    }

    fn num_getters(&self) -> usize {
        self.getters.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn counting_compute(counter: &AtomicUsize, value: f64) -> impl FnMut() -> f64 + '_ {
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            value
        }
    }

    #[test]
    fn test_local_cache_computes_once() {
        let cache: LocalCache<f64> = LocalCache::new();
        let calls = AtomicUsize::new(0);

        let first = cache.get_or_insert_with("a", &mut counting_compute(&calls, 0.25));
        let second = cache.get_or_insert_with("a", &mut counting_compute(&calls, 0.99));

        assert_eq!(first, 0.25);
        assert_eq!(second, 0.25);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.num_getters(), 2);
    }

    #[test]
    fn test_failed_computation_stores_nothing() {
        let cache: BoundedCache<f64> = BoundedCache::new(4);
        let failed = cache.try_get_or_insert_with("a", &mut || {
            Err(MoebaError::FitnessCalculation("NaN".to_string()))
        });
        assert!(failed.is_err());
        assert!(cache.is_empty());

        let stored = cache.try_get_or_insert_with("a", &mut || Ok(0.5)).unwrap();
        let reused = cache.try_get_or_insert_with("a", &mut || Ok(0.75)).unwrap();
        assert_eq!((stored, reused), (0.5, 0.5));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.num_getters(), 3);
    }

    #[test]
    fn test_first_writer_wins() {
        let cache: LocalCache<f64> = LocalCache::new();
        assert_eq!(cache.insert("k".to_string(), 1.0), 1.0);
        assert_eq!(cache.insert("k".to_string(), 2.0), 1.0);
        assert_eq!(cache.get("k"), Some(1.0));
    }

    #[test]
    fn test_bounded_cache_evicts_oldest() {
        let cache: BoundedCache<f64> = BoundedCache::new(2);
        cache.insert("a".to_string(), 1.0);
        cache.insert("b".to_string(), 2.0);
        cache.insert("c".to_string(), 3.0);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), Some(2.0));
        assert_eq!(cache.get("c"), Some(3.0));
        assert_eq!(cache.num_getters(), 3);
    }

    #[test]
    fn test_per_worker_cache_is_private_per_thread() {
        let cache: Arc<PerWorkerCache<f64>> = Arc::new(PerWorkerCache::new());
        cache.insert("k".to_string(), 1.0);

        let remote = Arc::clone(&cache);
        let seen = thread::spawn(move || {
            let before = remote.get("k");
            remote.insert("k".to_string(), 2.0);
            (before, remote.get("k"))
        })
        .join()
        .unwrap();

        assert_eq!(seen, (None, Some(2.0)));
        assert_eq!(cache.get("k"), Some(1.0));
        assert_eq!(cache.local_len(), 1);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_concurrent_writers_agree() {
        let cache: Arc<dyn CacheStore<Vec<f64>>> = CacheBacking::Local.build();
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || cache.insert("shared".to_string(), vec![i as f64]))
            })
            .collect();
        let stored: Vec<Vec<f64>> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let winner = cache.get("shared").unwrap();
        assert!(stored.iter().all(|v| *v == winner));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_parse_backing() {
        assert_eq!(CacheBacking::parse("Local").unwrap(), CacheBacking::Local);
        assert_eq!(CacheBacking::parse("perWorker").unwrap(), CacheBacking::PerWorker);
        assert_eq!(
            CacheBacking::parse("Bounded(capacity=64)").unwrap(),
            CacheBacking::Bounded(64)
        );
        assert!(CacheBacking::parse("bounded").is_err());
        assert!(CacheBacking::parse("bounded(capacity=0)").is_err());
        assert!(CacheBacking::parse("redis").is_err());
    }
}
