use super::cache::FileCache;
use super::config::RegistryConfig;
use super::error::RegistryError;
use super::registry::{Registry, Resolution};
use std::path::Path;
use tracing::info;

/// One unit of work against a registry: every candidate processed through a session
/// shares its staged filesystem state until [`Session::commit`].
#[derive(Debug)]
pub struct Session {
    registry: Registry,
    cache: FileCache,
}

impl Session {
    pub fn new(config: RegistryConfig) -> Result<Self, RegistryError> {
        Ok(Self {
            registry: Registry::new(config)?,
            cache: FileCache::new(),
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn cache(&self) -> &FileCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut FileCache {
        &mut self.cache
    }

    /// Split borrow for callers that drive the registry themselves.
    pub fn parts_mut(&mut self) -> (&mut Registry, &mut FileCache) {
        (&mut self.registry, &mut self.cache)
    }

    pub fn resolve(&mut self, dir: &Path) -> Result<Resolution, RegistryError> {
        self.registry.resolve(&mut self.cache, dir)
    }

    pub fn process_candidate(&mut self, dir: &Path) -> Result<Option<String>, RegistryError> {
        self.registry.process_candidate(&mut self.cache, dir)
    }

    pub fn commit(&mut self) -> Result<(), RegistryError> {
        self.cache.commit()?;
        info!(root = %self.registry.root().display(), "Committed session");
        Ok(())
    }

    /// Drops everything staged since the session started.
    pub fn discard(&mut self) {
        self.cache.clear();
        self.registry.reset_session();
    }
}
