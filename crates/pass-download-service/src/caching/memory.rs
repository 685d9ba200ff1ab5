use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tokio::task::AbortHandle;
use tokio::time::Instant;

use super::CacheConfig;

// Inner result carries `Arc`s since a `Shared` future hands out clones of its output to every
// waiter.
type Computation<T, E> = Shared<BoxFuture<'static, Result<Arc<T>, Arc<E>>>>;

enum EntryState<T, E> {
    /// A computation is in flight. Every caller awaits the same shared future.
    Pending(Computation<T, E>),
    /// The computation succeeded. The value is immutable until the entry is evicted.
    Ready {
        value: Arc<T>,
        ready_at: Instant,
        /// The task evicting this entry once it reached its maximum age.
        expiry: Option<AbortHandle>,
    },
}

struct Slot<T, E> {
    /// Distinguishes this entry from earlier or later entries for the same key.
    generation: u64,
    /// Value of the access clock when this entry was last requested.
    last_access: u64,
    state: EntryState<T, E>,
}

impl<T, E> Drop for Slot<T, E> {
    fn drop(&mut self) {
        if let EntryState::Ready {
            expiry: Some(expiry),
            ..
        } = &self.state
        {
            expiry.abort();
        }
    }
}

struct Entries<K, T, E> {
    slots: HashMap<K, Slot<T, E>>,
    access_clock: u64,
    next_generation: u64,
}

impl<K: Eq + Hash, T, E> Entries<K, T, E> {
    fn tick(&mut self) -> u64 {
        self.access_clock += 1;
        self.access_clock
    }

    /// Removes the entry for `key`, but only if it still belongs to `generation`.
    fn remove_generation(&mut self, key: &K, generation: u64) -> bool {
        match self.slots.get(key) {
            Some(slot) if slot.generation == generation => {
                self.slots.remove(key);
                true
            }
            _ => false,
        }
    }

    /// Evicts least recently used entries until at most `max_size` remain.
    ///
    /// Only ready entries are evicted. While computations are pending, the map may hold more
    /// than `max_size` entries until they settle.
    fn evict_to(&mut self, max_size: usize) -> usize
    where
        K: Clone,
    {
        let mut evicted = 0;
        while self.slots.len() > max_size {
            let lru = self
                .slots
                .iter()
                .filter(|(_, slot)| matches!(slot.state, EntryState::Ready { .. }))
                .min_by_key(|(_, slot)| slot.last_access)
                .map(|(key, _)| key.clone());
            let Some(key) = lru else {
                break;
            };
            self.slots.remove(&key);
            evicted += 1;
        }
        evicted
    }
}

enum Claim<T, E> {
    Ready(Arc<T>),
    Wait(Computation<T, E>),
}

struct Inner<K, T, E> {
    name: &'static str,
    config: CacheConfig,
    entries: Mutex<Entries<K, T, E>>,
}

impl<K, T, E> Inner<K, T, E> {
    fn lock(&self) -> MutexGuard<'_, Entries<K, T, E>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// An in-memory cache that memoizes the results of fallible asynchronous computations.
///
/// The cache does request coalescing: concurrent calls to [`get_or_add`](Self::get_or_add) for
/// the same key result in a single computation, and all callers observe its outcome.
///
/// Successful results are kept until either of two independent triggers evicts them:
///
/// - the number of entries exceeds [`CacheConfig::max_size`], in which case the least recently
///   accessed ready entry is evicted, or
/// - the entry is older than [`CacheConfig::max_age`]. A background task removes it at that
///   point, and reads treat such an entry as missing in any case.
///
/// Pending computations are never evicted, so there is at most one computation per key at any
/// time. The cache can briefly hold more than `max_size` entries while they are pending.
///
/// Failed computations are never cached. Their error is handed to every waiting caller, and the
/// next call for the same key starts a new computation.
///
/// Dropping the cache cancels all pending eviction tasks.
pub struct MemoizingCache<K, T, E> {
    inner: Arc<Inner<K, T, E>>,
}

impl<K, T, E> fmt::Debug for MemoizingCache<K, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.inner.entries.try_lock().map(|e| e.slots.len()).ok();
        f.debug_struct("MemoizingCache")
            .field("name", &self.inner.name)
            .field("config", &self.inner.config)
            .field("entries", &entries)
            .finish()
    }
}

impl<K, T, E> MemoizingCache<K, T, E>
where
    K: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static,
    T: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    /// Creates a new cache.
    ///
    /// The `name` is used for logging and metrics. Zero limits in `config` fall back to the
    /// defaults.
    pub fn new(name: &'static str, config: CacheConfig) -> Self {
        let inner = Inner {
            name,
            config: config.normalized(),
            entries: Mutex::new(Entries {
                slots: HashMap::new(),
                access_clock: 0,
                next_generation: 0,
            }),
        };

        Self {
            inner: Arc::new(inner),
        }
    }

    /// The effective size and age limits of this cache.
    pub fn config(&self) -> CacheConfig {
        self.inner.config
    }

    /// Returns the number of entries, including the ones still being computed.
    pub fn len(&self) -> usize {
        self.inner.lock().slots.len()
    }

    /// Returns `true` if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the cached value for `key`, or computes it using `fetch`.
    ///
    /// `fetch` is only invoked if there is neither a cached value nor a running computation for
    /// `key`. Otherwise this waits for the running computation and returns its outcome, which
    /// can be the same error the computation failed with.
    ///
    /// The computation is driven by whichever caller polls it, so it keeps going even if the
    /// caller that started it goes away.
    pub async fn get_or_add<F, Fut>(&self, key: K, fetch: F) -> Result<Arc<T>, Arc<E>>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        match self.claim(key, fetch) {
            Claim::Ready(value) => Ok(value),
            Claim::Wait(computation) => computation.await,
        }
    }

    /// Looks up `key` and creates a pending entry if there is none, all under a single lock.
    fn claim<F, Fut>(&self, key: K, fetch: F) -> Claim<T, E>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let name = self.inner.name;
        let max_age = self.inner.config.max_age;
        metric!(counter("caches.access") += 1, "cache" => name);

        let mut entries = self.inner.lock();
        let now = entries.tick();

        let mut expired = None;
        if let Some(slot) = entries.slots.get_mut(&key) {
            match &slot.state {
                EntryState::Ready {
                    value, ready_at, ..
                } if ready_at.elapsed() < max_age => {
                    slot.last_access = now;
                    metric!(counter("caches.memory.hit") += 1, "cache" => name);
                    return Claim::Ready(Arc::clone(value));
                }
                EntryState::Ready { .. } => expired = Some(slot.generation),
                EntryState::Pending(computation) => {
                    slot.last_access = now;
                    metric!(counter("caches.channel.hit") += 1, "cache" => name);
                    return Claim::Wait(computation.clone());
                }
            }
        }
        if let Some(generation) = expired {
            tracing::trace!("Entry for {:?} in {} cache outlived its max age", key, name);
            entries.remove_generation(&key, generation);
        }

        entries.next_generation += 1;
        let generation = entries.next_generation;
        let computation = self.computation(key.clone(), generation, fetch);
        entries.slots.insert(
            key,
            Slot {
                generation,
                last_access: now,
                state: EntryState::Pending(computation.clone()),
            },
        );

        evict(&mut entries, &self.inner);

        Claim::Wait(computation)
    }

    /// Wraps `fetch` into a shared computation that settles its cache entry when done.
    fn computation<F, Fut>(&self, key: K, generation: u64, fetch: F) -> Computation<T, E>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let name = self.inner.name;
        let inner = Arc::downgrade(&self.inner);

        async move {
            tracing::trace!("Computing {:?} for {} cache", key, name);
            metric!(counter("caches.computation") += 1, "cache" => name);

            let result = fetch().await.map(Arc::new).map_err(Arc::new);
            if let Some(inner) = inner.upgrade() {
                settle(&inner, key, generation, &result);
            }
            result
        }
        .boxed()
        .shared()
    }
}

/// Transitions the pending entry of `generation` to ready, or removes it on failure.
///
/// Entries that were evicted in the meantime are left alone.
fn settle<K, T, E>(
    inner: &Arc<Inner<K, T, E>>,
    key: K,
    generation: u64,
    result: &Result<Arc<T>, Arc<E>>,
) where
    K: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static,
    T: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    let mut entries = inner.lock();
    match result {
        Ok(value) => {
            let Some(slot) = entries.slots.get_mut(&key) else {
                return;
            };
            if slot.generation != generation {
                return;
            }
            let expiry = schedule_expiry(Arc::downgrade(inner), key, generation);
            slot.state = EntryState::Ready {
                value: Arc::clone(value),
                ready_at: Instant::now(),
                expiry,
            };
            evict(&mut entries, inner);
        }
        Err(_) => {
            if entries.remove_generation(&key, generation) {
                tracing::debug!("Computation of {:?} failed, not caching", key);
            }
        }
    }
}

/// Trims the cache to its configured size.
fn evict<K, T, E>(entries: &mut Entries<K, T, E>, inner: &Inner<K, T, E>)
where
    K: Eq + Hash + Clone,
{
    let evicted = entries.evict_to(inner.config.max_size);
    if evicted > 0 {
        metric!(counter("caches.eviction") += evicted as i64, "cache" => inner.name);
    }
}

/// Spawns a task removing the entry of `generation` once it reaches its maximum age.
///
/// The task only holds a weak reference, and is aborted when the entry goes away first.
fn schedule_expiry<K, T, E>(
    inner: Weak<Inner<K, T, E>>,
    key: K,
    generation: u64,
) -> Option<AbortHandle>
where
    K: Eq + Hash + Send + Sync + 'static,
    T: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    let max_age = inner.upgrade()?.config.max_age;
    let runtime = tokio::runtime::Handle::try_current().ok()?;

    let task = runtime.spawn(async move {
        tokio::time::sleep(max_age).await;
        if let Some(inner) = inner.upgrade() {
            inner.lock().remove_generation(&key, generation);
        }
    });
    Some(task.abort_handle())
}
