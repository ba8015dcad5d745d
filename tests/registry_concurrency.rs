//! Concurrency tests for registry bootstrap.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use config_registry::{
    ConfigError, ConfigKey, ConfigRegistry, ConfigResult, Format, FormatLoaderFactory, KeyId, Loader,
    LoaderFactory,
};
use serde_json::{json, Value};
use tempfile::TempDir;

mod common;
use common::CountingFactory;

#[test]
fn test_concurrent_first_access_bootstraps_once() {
    let dir = TempDir::new().unwrap();
    let registry = ConfigRegistry::new();
    let key: ConfigKey<Value> = ConfigKey::new("shared", dir.path().join("shared.json"));
    std::fs::write(key.path(), "{\"a\": 1}").unwrap();

    let factory = CountingFactory::new(Format::Json).with_delay(Duration::from_millis(50));
    let threads = 16;
    let barrier = Barrier::new(threads);

    let results: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = (0..threads)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    registry.get_or_create(&factory, &key).unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(factory.calls(), 1);
    assert_eq!(factory.loads(), 1);
    for config in &results {
        assert!(Arc::ptr_eq(config, &results[0]));
        assert_eq!(config.node(), json!({ "a": 1 }));
    }
}

#[test]
fn test_cache_hit_performs_no_io() {
    let dir = TempDir::new().unwrap();
    let registry = ConfigRegistry::new();
    let key: ConfigKey<Value> = ConfigKey::new("app", dir.path().join("app.yml"));
    let factory = CountingFactory::new(Format::Yaml);

    let first = registry.get_or_create(&factory, &key).unwrap();
    let second = registry.get_or_create(&factory, &key).unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(factory.calls(), 1);
    assert_eq!(factory.loads(), 1);
}

#[test]
fn test_different_keys_do_not_block_each_other() {
    let dir = TempDir::new().unwrap();
    let registry = ConfigRegistry::new();
    let slow_key: ConfigKey<Value> = ConfigKey::new("slow", dir.path().join("slow.toml"));
    let fast_key: ConfigKey<Value> = ConfigKey::new("fast", dir.path().join("fast.toml"));

    let (started_tx, started_rx) = mpsc::channel::<()>();
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let release_rx = std::sync::Mutex::new(release_rx);
    let started_tx = std::sync::Mutex::new(started_tx);

    let gated = |key: &KeyId| -> ConfigResult<Arc<dyn Loader>> {
        started_tx.lock().unwrap().send(()).unwrap();
        release_rx
            .lock()
            .unwrap()
            .recv_timeout(Duration::from_secs(10))
            .unwrap();
        FormatLoaderFactory::toml().create(key)
    };

    thread::scope(|s| {
        let slow = s.spawn(|| registry.get_or_create(&gated, &slow_key));

        started_rx.recv_timeout(Duration::from_secs(10)).unwrap();
        // The slow key is mid-bootstrap; the fast key must still go through.
        let fast = registry.get_or_create(&FormatLoaderFactory::toml(), &fast_key);
        assert!(fast.is_ok());
        assert!(registry.contains(fast_key.id()));
        assert!(!registry.contains(slow_key.id()));

        release_tx.send(()).unwrap();
        assert!(slow.join().unwrap().is_ok());
    });

    assert_eq!(registry.len(), 2);
}

#[test]
fn test_waiters_share_a_failed_attempt() {
    let dir = TempDir::new().unwrap();
    let registry = ConfigRegistry::new();
    let key: ConfigKey<Value> = ConfigKey::new("broken", dir.path().join("broken.json"));

    let (started_tx, started_rx) = mpsc::channel::<()>();
    let started_tx = std::sync::Mutex::new(started_tx);
    let failing = |key: &KeyId| -> ConfigResult<Arc<dyn Loader>> {
        started_tx.lock().unwrap().send(()).unwrap();
        thread::sleep(Duration::from_millis(300));
        Err(ConfigError::PathResolution {
            path: key.path().to_path_buf(),
            message: "unavailable".to_string(),
        })
    };

    let retries = AtomicUsize::new(0);
    let counting = |key: &KeyId| -> ConfigResult<Arc<dyn Loader>> {
        retries.fetch_add(1, Ordering::SeqCst);
        FormatLoaderFactory::json().create(key)
    };

    let waiters = 4;
    let barrier = Barrier::new(waiters);

    thread::scope(|s| {
        let winner = s.spawn(|| registry.get_or_create(&failing, &key));
        started_rx.recv_timeout(Duration::from_secs(10)).unwrap();

        let handles: Vec<_> = (0..waiters)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    registry.get_or_create(&counting, &key)
                })
            })
            .collect();

        let err = winner.join().unwrap().unwrap_err();
        assert!(matches!(err.root_cause(), ConfigError::PathResolution { .. }));

        for handle in handles {
            let err = handle.join().unwrap().unwrap_err();
            assert!(matches!(err, ConfigError::Bootstrap { .. }));
            assert!(matches!(err.root_cause(), ConfigError::PathResolution { .. }));
        }
    });

    assert_eq!(retries.load(Ordering::SeqCst), 0);
    assert!(!registry.contains(key.id()));

    // A call arriving after the failure starts over.
    let config = registry.get_or_create(&counting, &key).unwrap();
    assert_eq!(retries.load(Ordering::SeqCst), 1);
    assert_eq!(config.node(), json!({}));
}

#[test]
fn test_registries_are_isolated() {
    let dir = TempDir::new().unwrap();
    let key: ConfigKey<Value> = ConfigKey::new("app", dir.path().join("app.json"));
    let first = ConfigRegistry::new();
    let second = ConfigRegistry::new();

    let a = first.get_or_create(&FormatLoaderFactory::json(), &key).unwrap();
    let b = second.get_or_create(&FormatLoaderFactory::json(), &key).unwrap();

    assert!(!Arc::ptr_eq(&a, &b));
}
