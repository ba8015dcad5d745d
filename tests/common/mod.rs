//! Shared utilities for registry integration tests.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use config_registry::{
    create_loader, CodecError, ConfigResult, FileLoader, Format, KeyId, Loader, LoaderFactory, Node,
};

/// File loader that counts reads and can be slowed down.
pub struct CountingLoader {
    inner: FileLoader,
    loads: Arc<AtomicUsize>,
    delay: Duration,
}

impl Loader for CountingLoader {
    fn path(&self) -> &Path {
        self.inner.path()
    }

    fn format(&self) -> Format {
        self.inner.format()
    }

    fn load(&self) -> Result<Node, CodecError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(self.delay);
        self.inner.load()
    }

    fn save(&self, node: &Node) -> Result<(), CodecError> {
        self.inner.save(node)
    }
}

/// Factory producing [`CountingLoader`]s and counting its own invocations.
#[derive(Clone)]
pub struct CountingFactory {
    pub format: Format,
    pub delay: Duration,
    pub calls: Arc<AtomicUsize>,
    pub loads: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl CountingFactory {
    pub fn new(format: Format) -> Self {
        Self {
            format,
            delay: Duration::ZERO,
            calls: Arc::new(AtomicUsize::new(0)),
            loads: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl LoaderFactory for CountingFactory {
    fn create(&self, key: &KeyId) -> ConfigResult<Arc<dyn Loader>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        create_loader(key, |path| {
            Arc::new(CountingLoader {
                inner: FileLoader::new(path, self.format),
                loads: Arc::clone(&self.loads),
                delay: self.delay,
            }) as Arc<dyn Loader>
        })
    }
}
