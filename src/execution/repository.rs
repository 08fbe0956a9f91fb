//! Memoized specification repository.
//!
//! Resolves a type (or an explicit key) to its compiled [`ModelScope`]. Each
//! producing function runs at most once per key; later lookups return the cached
//! scope. Because nested models are resolved lazily at evaluation time, mutually
//! recursive types can reference each other by type before either is built.

use crate::core::error::{EngineError, EngineResult};
use crate::rules::ScopeProducer;
use crate::scope::ModelScope;
use parking_lot::{Mutex, RwLock};
use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, OnceLock};

type ErasedScope = Arc<dyn Any + Send + Sync>;
type ErasedProducer = Arc<dyn Fn() -> EngineResult<ErasedScope> + Send + Sync>;

/// Key of a repository entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RepositoryKey {
    /// Entry for a model type.
    Type {
        /// Type identifier.
        id: TypeId,
        /// Type name, for error messages.
        name: &'static str,
    },
    /// Entry under a caller-chosen key.
    Named(String),
}

impl RepositoryKey {
    /// Key for the type `T`.
    pub fn of<T: 'static>() -> Self {
        RepositoryKey::Type {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Key for an explicit name.
    pub fn named(key: impl Into<String>) -> Self {
        RepositoryKey::Named(key.into())
    }
}

impl fmt::Display for RepositoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepositoryKey::Type { name, .. } => f.write_str(name),
            RepositoryKey::Named(key) => f.write_str(key),
        }
    }
}

/// Repository statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepositoryStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that had to run a producer.
    pub misses: u64,
    /// Producers that completed successfully.
    pub initializations: u64,
}

#[derive(Default)]
struct Entry {
    scope: OnceLock<ErasedScope>,
    init: Mutex<()>,
}

/// Thread-safe, lazily populated cache of model scopes.
///
/// Populated entries are read under a shared lock. First population of a key is
/// serialized by a per-entry guard, so concurrent lookups of the same key run its
/// producer once. A producer must not resolve its own key.
pub struct Repository {
    entries: RwLock<HashMap<RepositoryKey, Arc<Entry>>>,
    producers: RwLock<HashMap<TypeId, ErasedProducer>>,
    checked: Mutex<HashSet<(RepositoryKey, usize)>>,
    stats: Mutex<RepositoryStats>,
}

impl Repository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            producers: RwLock::new(HashMap::new()),
            checked: Mutex::new(HashSet::new()),
            stats: Mutex::new(RepositoryStats::default()),
        }
    }

    /// Register the global producer for `T`.
    ///
    /// Used whenever `T` (or a named key resolved as `T`) is not cached and no
    /// explicit producer is supplied. Registering again replaces the producer but
    /// never an already cached scope.
    pub fn register<T, F>(&self, producer: F)
    where
        T: 'static,
        F: Fn() -> EngineResult<ModelScope<T>> + Send + Sync + 'static,
    {
        let erased: ErasedProducer =
            Arc::new(move || producer().map(|scope| Arc::new(scope) as ErasedScope));
        self.producers.write().insert(TypeId::of::<T>(), erased);
    }

    /// Whether a global producer exists for `T`.
    pub fn is_registered<T: 'static>(&self) -> bool {
        self.producers.read().contains_key(&TypeId::of::<T>())
    }

    /// Get the scope of `T`, producing it on first use.
    ///
    /// An explicit `producer` is preferred over the registered one. Once cached,
    /// neither is invoked again.
    pub fn get_or_init<T: 'static>(
        &self,
        producer: Option<ScopeProducer<T>>,
    ) -> EngineResult<Arc<ModelScope<T>>> {
        self.resolve(RepositoryKey::of::<T>(), producer)
    }

    /// Get the scope stored under `key`, producing it on first use.
    pub fn get_or_init_named<T: 'static>(
        &self,
        key: &str,
        producer: Option<ScopeProducer<T>>,
    ) -> EngineResult<Arc<ModelScope<T>>> {
        self.resolve(RepositoryKey::named(key), producer)
    }

    /// Get the scope of `T` using the registered producer.
    pub fn get<T: 'static>(&self) -> EngineResult<Arc<ModelScope<T>>> {
        self.get_or_init::<T>(None)
    }

    /// Get the scope stored under `key` using the producer registered for `T`.
    pub fn get_named<T: 'static>(&self, key: &str) -> EngineResult<Arc<ModelScope<T>>> {
        self.get_or_init_named::<T>(key, None)
    }

    /// Whether `key` has a cached scope.
    pub fn contains(&self, key: &RepositoryKey) -> bool {
        self.entries
            .read()
            .get(key)
            .map_or(false, |entry| entry.scope.get().is_some())
    }

    /// Number of cached scopes.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .values()
            .filter(|entry| entry.scope.get().is_some())
            .count()
    }

    /// Whether nothing is cached yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the scope under `key` already passed the schema check at `max_depth`.
    pub(crate) fn is_checked(&self, key: &RepositoryKey, max_depth: usize) -> bool {
        self.checked.lock().contains(&(key.clone(), max_depth))
    }

    pub(crate) fn mark_checked(&self, key: RepositoryKey, max_depth: usize) {
        self.checked.lock().insert((key, max_depth));
    }

    /// Get repository statistics.
    pub fn stats(&self) -> RepositoryStats {
        *self.stats.lock()
    }

    fn resolve<T: 'static>(
        &self,
        key: RepositoryKey,
        producer: Option<ScopeProducer<T>>,
    ) -> EngineResult<Arc<ModelScope<T>>> {
        let entry = self.entry(&key);
        if let Some(scope) = entry.scope.get() {
            self.stats.lock().hits += 1;
            return downcast(&key, scope);
        }

        let _guard = entry.init.lock();
        if let Some(scope) = entry.scope.get() {
            self.stats.lock().hits += 1;
            return downcast(&key, scope);
        }

        self.stats.lock().misses += 1;
        let produced: ErasedScope = match producer {
            Some(producer) => Arc::new(producer()?),
            None => {
                let registered = self.producers.read().get(&TypeId::of::<T>()).cloned();
                match registered {
                    Some(producer) => producer()?,
                    None => {
                        return Err(EngineError::MissingSpecification {
                            key: key.to_string(),
                        })
                    }
                }
            }
        };

        let scope = entry.scope.get_or_init(|| produced);
        self.stats.lock().initializations += 1;
        log::debug!("cached specification for '{}'", key);
        downcast(&key, scope)
    }

    fn entry(&self, key: &RepositoryKey) -> Arc<Entry> {
        if let Some(entry) = self.entries.read().get(key) {
            return entry.clone();
        }
        self.entries
            .write()
            .entry(key.clone())
            .or_default()
            .clone()
    }
}

fn downcast<T: 'static>(key: &RepositoryKey, scope: &ErasedScope) -> EngineResult<Arc<ModelScope<T>>> {
    scope
        .clone()
        .downcast::<ModelScope<T>>()
        .map_err(|_| EngineError::SpecificationTypeMismatch {
            key: key.to_string(),
            expected: std::any::type_name::<T>(),
        })
}

impl Default for Repository {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("cached", &self.len())
            .field("registered", &self.producers.read().len())
            .field("stats", &self.stats())
            .finish()
    }
}

/// A repository shared across validators or threads.
pub type SharedRepository = Arc<Repository>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::Scope;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;

    struct Tag {
        label: Option<String>,
    }

    struct Other;

    fn tag_scope() -> ModelScope<Tag> {
        ModelScope::builder()
            .member("Label", |t: &Tag| t.label.as_ref(), Scope::builder().build().unwrap())
            .build()
    }

    fn counting_producer(calls: Arc<AtomicUsize>) -> ScopeProducer<Tag> {
        Arc::new(move || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(tag_scope())
        })
    }

    #[test]
    fn test_producer_runs_once_and_scope_is_shared() {
        let repository = Repository::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let first = repository
            .get_or_init(Some(counting_producer(calls.clone())))
            .unwrap();
        for _ in 0..5 {
            let again = repository
                .get_or_init(Some(counting_producer(calls.clone())))
                .unwrap();
            assert!(Arc::ptr_eq(&first, &again));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let stats = repository.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 5);
        assert_eq!(stats.initializations, 1);
        assert!(repository.contains(&RepositoryKey::of::<Tag>()));
    }

    #[test]
    fn test_explicit_producer_preferred_over_registered() {
        let repository = Repository::new();
        let registered = Arc::new(AtomicUsize::new(0));
        let explicit = Arc::new(AtomicUsize::new(0));

        let counter = registered.clone();
        repository.register(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(tag_scope())
        });

        repository
            .get_or_init(Some(counting_producer(explicit.clone())))
            .unwrap();
        repository.get::<Tag>().unwrap();

        assert_eq!(explicit.load(Ordering::SeqCst), 1);
        assert_eq!(registered.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_registered_producer_is_used_lazily() {
        let repository = Repository::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        repository.register(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(tag_scope())
        });

        assert!(repository.is_registered::<Tag>());
        assert!(repository.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let scope = repository.get::<Tag>().unwrap();
        assert_eq!(scope.member_keys(), vec!["Label"]);
        assert_eq!(repository.len(), 1);
    }

    #[test]
    fn test_missing_specification() {
        let repository = Repository::new();
        let err = repository.get::<Other>().unwrap_err();
        match err {
            EngineError::MissingSpecification { key } => assert!(key.ends_with("Other")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_named_keys_are_separate_entries() {
        let repository = Repository::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let strict = repository
            .get_or_init_named("tag.strict", Some(counting_producer(calls.clone())))
            .unwrap();
        let loose = repository
            .get_or_init_named("tag.loose", Some(counting_producer(calls.clone())))
            .unwrap();
        let strict_again = repository.get_named::<Tag>("tag.strict").unwrap();

        assert!(!Arc::ptr_eq(&strict, &loose));
        assert!(Arc::ptr_eq(&strict, &strict_again));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_named_key_type_mismatch() {
        let repository = Repository::new();
        repository
            .get_or_init_named("shared", Some(counting_producer(Arc::new(AtomicUsize::new(0)))))
            .unwrap();

        let err = repository.get_named::<Other>("shared").unwrap_err();
        assert!(matches!(err, EngineError::SpecificationTypeMismatch { .. }));
    }

    #[test]
    fn test_failed_producer_is_not_cached() {
        let repository = Repository::new();
        let failing: ScopeProducer<Tag> = Arc::new(|| {
            Err(EngineError::DuplicateModifier {
                modifier: crate::core::error::modifier::NAME,
            })
        });

        assert!(repository.get_or_init(Some(failing)).is_err());
        assert!(!repository.contains(&RepositoryKey::of::<Tag>()));

        let calls = Arc::new(AtomicUsize::new(0));
        repository
            .get_or_init(Some(counting_producer(calls.clone())))
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_concurrent_first_population_runs_producer_once() {
        let repository = Repository::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let barrier = Barrier::new(8);

        std::thread::scope(|s| {
            for _ in 0..8 {
                let producer = counting_producer(calls.clone());
                let repository = &repository;
                let barrier = &barrier;
                s.spawn(move || {
                    barrier.wait();
                    repository.get_or_init(Some(producer)).unwrap();
                });
            }
        });

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(repository.len(), 1);
    }

    #[test]
    fn test_checked_keys_are_per_depth() {
        let repository = Repository::new();
        let key = RepositoryKey::of::<Tag>();
        assert!(!repository.is_checked(&key, 10));

        repository.mark_checked(key.clone(), 10);
        assert!(repository.is_checked(&key, 10));
        assert!(!repository.is_checked(&key, 3));
        assert!(!repository.is_checked(&RepositoryKey::named("tag"), 10));
    }
}
