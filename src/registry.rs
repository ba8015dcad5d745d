//! Registry of lazily loaded configurations.
//!
//! # Responsibilities
//! - Map each key to exactly one [`Configuration`] for the registry's lifetime
//! - Run bootstrap (loader creation + initial load) at most once per key,
//!   even when many threads ask for the same key at the same time
//! - Never cache a failed bootstrap
//!
//! # Concurrency
//! ```text
//! entries: DashMap<KeyId, Arc<Slot>>      shard lock: slot lookup/insert only
//! Slot.instance: OnceLock                 lock-free hits once published
//! Slot.bootstrap: Mutex                   held by the one thread bootstrapping;
//!                                         racers for the same key wait here
//! ```
//!
//! # Design Decisions
//! - One mutex per key: unrelated keys never wait on each other's I/O
//! - Callers that waited on a failed attempt receive that attempt's error;
//!   callers arriving after it retry from scratch
//! - Failures are returned as values, never panics

use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use dashmap::DashMap;

use crate::configuration::Configuration;
use crate::error::{ConfigError, ConfigResult};
use crate::format::Format;
use crate::key::{ConfigKey, KeyId};
use crate::loader::{FormatLoaderFactory, Loader, LoaderFactory};
use crate::observability::metrics;
use crate::settings::RegistrySettings;

type Instance = Arc<dyn Any + Send + Sync>;

/// A bootstrap attempt that failed, numbered by `Slot::failures`.
struct Failure {
    attempt: u64,
    error: Arc<ConfigError>,
}

#[derive(Default)]
struct Slot {
    instance: OnceLock<Instance>,
    bootstrap: Mutex<Option<Failure>>,
    /// Completed failed attempts. Only incremented under `bootstrap`.
    failures: AtomicU64,
}

/// Concurrent, lazily populated cache of configurations.
///
/// Construct one per process (or per test) and share it by reference.
pub struct ConfigRegistry {
    entries: DashMap<KeyId, Arc<Slot>>,
    settings: RegistrySettings,
    default_factory: Arc<dyn LoaderFactory>,
}

impl ConfigRegistry {
    /// Registry with default settings.
    pub fn new() -> Self {
        Self::with_settings(RegistrySettings::default())
    }

    /// Registry whose default factory and key root come from `settings`.
    pub fn with_settings(settings: RegistrySettings) -> Self {
        let factory = FormatLoaderFactory::new(settings.default_format).missing_file(settings.missing_file);
        Self {
            entries: DashMap::new(),
            settings,
            default_factory: Arc::new(factory),
        }
    }

    /// Replace the factory used by [`get_or_create_default`](Self::get_or_create_default).
    pub fn with_default_factory(mut self, factory: impl LoaderFactory + 'static) -> Self {
        self.default_factory = Arc::new(factory);
        self
    }

    pub fn settings(&self) -> &RegistrySettings {
        &self.settings
    }

    /// Key for `<root>/<name>.<ext>` using the configured root and default format.
    pub fn key<T>(&self, name: impl Into<String>) -> ConfigKey<T> {
        self.key_with_format(name, self.settings.default_format)
    }

    /// Key for `<root>/<name>.<ext>` in an explicit format.
    pub fn key_with_format<T>(&self, name: impl Into<String>, format: Format) -> ConfigKey<T> {
        ConfigKey::in_dir(&self.settings.root, name, format)
    }

    /// Return the configuration for `key`, bootstrapping it with `factory` on first use.
    ///
    /// Bootstrap creates the loader, builds the configuration and performs its
    /// initial load. It runs at most once per key; concurrent callers wait for
    /// it and share its result. Once a key is initialized, `factory` is ignored.
    pub fn get_or_create<T, F>(&self, factory: &F, key: &ConfigKey<T>) -> ConfigResult<Arc<Configuration<T>>>
    where
        T: 'static,
        F: LoaderFactory + ?Sized,
    {
        self.get_or_bootstrap(key, || factory.create(key.id()))
    }

    /// Like [`get_or_create`](Self::get_or_create) with an already built loader.
    pub fn get_or_create_with_loader<T>(
        &self,
        loader: Arc<dyn Loader>,
        key: &ConfigKey<T>,
    ) -> ConfigResult<Arc<Configuration<T>>>
    where
        T: 'static,
    {
        self.get_or_bootstrap(key, move || Ok(loader))
    }

    /// Like [`get_or_create`](Self::get_or_create) with the registry's default factory.
    pub fn get_or_create_default<T>(&self, key: &ConfigKey<T>) -> ConfigResult<Arc<Configuration<T>>>
    where
        T: 'static,
    {
        let factory = Arc::clone(&self.default_factory);
        self.get_or_create(&*factory, key)
    }

    /// The initialized configuration for `key`, without bootstrapping.
    pub fn get<T>(&self, key: &ConfigKey<T>) -> ConfigResult<Option<Arc<Configuration<T>>>>
    where
        T: 'static,
    {
        let instance = self
            .entries
            .get(key.id())
            .and_then(|slot| slot.instance.get().cloned());

        instance.map(|instance| downcast(key, instance)).transpose()
    }

    /// True once `key` has been successfully initialized.
    pub fn contains(&self, key: &KeyId) -> bool {
        self.entries
            .get(key)
            .is_some_and(|slot| slot.instance.get().is_some())
    }

    /// Number of initialized configurations.
    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.value().instance.get().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ids of all initialized configurations, sorted.
    pub fn keys(&self) -> Vec<KeyId> {
        let mut keys: Vec<KeyId> = self
            .entries
            .iter()
            .filter(|entry| entry.value().instance.get().is_some())
            .map(|entry| entry.key().clone())
            .collect();
        keys.sort();
        keys
    }

    fn slot(&self, id: &KeyId) -> Arc<Slot> {
        if let Some(slot) = self.entries.get(id) {
            return Arc::clone(slot.value());
        }
        Arc::clone(self.entries.entry(id.clone()).or_default().value())
    }

    fn get_or_bootstrap<T, L>(&self, key: &ConfigKey<T>, make_loader: L) -> ConfigResult<Arc<Configuration<T>>>
    where
        T: 'static,
        L: FnOnce() -> ConfigResult<Arc<dyn Loader>>,
    {
        // The shard guard is released here; only the slot is held from now on.
        let slot = self.slot(key.id());

        if let Some(instance) = slot.instance.get() {
            tracing::trace!(key = %key.name(), "Configuration cache hit");
            return downcast(key, Arc::clone(instance));
        }

        let seen_failures = slot.failures.load(Ordering::Acquire);
        let mut last_failure = slot.bootstrap.lock().unwrap_or_else(PoisonError::into_inner);

        // Another caller finished bootstrap while we waited.
        if let Some(instance) = slot.instance.get() {
            return downcast(key, Arc::clone(instance));
        }
        if let Some(failure) = last_failure.as_ref().filter(|f| f.attempt > seen_failures) {
            return Err(bootstrap_error(key, Arc::clone(&failure.error)));
        }

        match bootstrap(key, make_loader) {
            Ok(configuration) => {
                let configuration = Arc::new(configuration);
                let instance: Instance = configuration.clone();
                if slot.instance.set(instance).is_err() {
                    // Unreachable: `instance` is only set while `bootstrap` is held.
                    tracing::error!(key = %key.name(), "Configuration initialized twice");
                }
                *last_failure = None;
                drop(last_failure);

                metrics::record_bootstrap(true);
                metrics::record_entries(self.len());
                tracing::info!(
                    key = %key.name(),
                    path = %configuration.path().display(),
                    format = %configuration.format(),
                    "Configuration initialized"
                );
                Ok(configuration)
            }
            Err(error) => {
                let error = Arc::new(error);
                let attempt = slot.failures.fetch_add(1, Ordering::AcqRel) + 1;
                *last_failure = Some(Failure {
                    attempt,
                    error: Arc::clone(&error),
                });
                drop(last_failure);

                metrics::record_bootstrap(false);
                tracing::warn!(key = %key.name(), attempt, error = %error, "Configuration bootstrap failed");
                Err(bootstrap_error(key, error))
            }
        }
    }
}

impl Default for ConfigRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConfigRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigRegistry")
            .field("settings", &self.settings)
            .field("initialized", &self.len())
            .finish_non_exhaustive()
    }
}

fn bootstrap<T, L>(key: &ConfigKey<T>, make_loader: L) -> ConfigResult<Configuration<T>>
where
    L: FnOnce() -> ConfigResult<Arc<dyn Loader>>,
{
    let loader = make_loader()?;
    let configuration = Configuration::new(key.clone(), loader);
    configuration.load()?;
    Ok(configuration)
}

fn downcast<T: 'static>(key: &ConfigKey<T>, instance: Instance) -> ConfigResult<Arc<Configuration<T>>> {
    instance
        .downcast::<Configuration<T>>()
        .map_err(|_| ConfigError::TypeMismatch {
            key: key.name().to_string(),
            expected: std::any::type_name::<T>(),
        })
}

fn bootstrap_error<T>(key: &ConfigKey<T>, source: Arc<ConfigError>) -> ConfigError {
    ConfigError::Bootstrap {
        key: key.name().to_string(),
        source,
    }
}
