//! Memory Cache Storage Module
//!
//! In-memory `CacheStorage`: an ordered list of generations, each a HashMap
//! from request key to cached entry.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::cache::{CacheStorage, CachedEntry, GenerationHandle, RequestKey, StorageStats};
use crate::error::Result;
use crate::models::AgentResponse;

#[derive(Debug)]
struct Generation {
    name: String,
    id: u64,
    entries: HashMap<RequestKey, CachedEntry>,
}

impl Generation {
    fn new(name: &str, id: u64) -> Self {
        Self {
            name: name.to_string(),
            id,
            entries: HashMap::new(),
        }
    }

    fn handle(&self) -> GenerationHandle {
        GenerationHandle::new(self.name.clone(), self.id)
    }
}

#[derive(Debug, Default)]
struct Inner {
    /// Generations in creation order
    generations: Vec<Generation>,
    next_id: u64,
    stats: StorageStats,
}

impl Inner {
    fn position(&self, name: &str) -> Option<usize> {
        self.generations.iter().position(|g| g.name == name)
    }

    fn open(&mut self, name: &str) -> &mut Generation {
        let index = match self.position(name) {
            Some(index) => index,
            None => {
                self.next_id += 1;
                debug!(generation = name, id = self.next_id, "creating cache generation");
                self.generations.push(Generation::new(name, self.next_id));
                self.stats.set_generations(self.generations.len());
                self.generations.len() - 1
            }
        };
        &mut self.generations[index]
    }

    fn record_lookup(&mut self, found: bool) {
        if found {
            self.stats.record_hit();
        } else {
            self.stats.record_miss();
        }
    }
}

// == Memory Cache Storage ==
/// Thread-safe in-memory cache storage.
///
/// Each operation takes the lock for its own duration only, so concurrent
/// requests interleave freely and the last put on a key wins.
#[derive(Debug, Default)]
pub struct MemoryCacheStorage {
    inner: RwLock<Inner>,
}

impl MemoryCacheStorage {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Stats ==
    /// Returns current storage statistics.
    pub async fn stats(&self) -> StorageStats {
        self.inner.read().await.stats.clone()
    }

    // == Entry Count ==
    /// Number of entries in a generation, or None if it does not exist.
    pub async fn entry_count(&self, generation: &str) -> Option<usize> {
        let inner = self.inner.read().await;
        inner
            .position(generation)
            .map(|index| inner.generations[index].entries.len())
    }
}

#[async_trait]
impl CacheStorage for MemoryCacheStorage {
    async fn open(&self, generation: &str) -> Result<GenerationHandle> {
        Ok(self.inner.write().await.open(generation).handle())
    }

    async fn has(&self, generation: &str) -> Result<bool> {
        Ok(self.inner.read().await.position(generation).is_some())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let inner = self.inner.read().await;
        Ok(inner.generations.iter().map(|g| g.name.clone()).collect())
    }

    async fn delete(&self, generation: &str) -> Result<bool> {
        let mut inner = self.inner.write().await;
        match inner.position(generation) {
            Some(index) => {
                let removed = inner.generations.remove(index);
                let remaining = inner.generations.len();
                inner.stats.set_generations(remaining);
                debug!(
                    generation,
                    entries = removed.entries.len(),
                    "deleted cache generation"
                );
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn lookup(&self, generation: &str, key: &RequestKey) -> Result<Option<CachedEntry>> {
        // Write lock: the lookup updates hit/miss counters
        let mut inner = self.inner.write().await;
        let found = inner
            .position(generation)
            .and_then(|index| inner.generations[index].entries.get(key).cloned());
        inner.record_lookup(found.is_some());
        Ok(found)
    }

    async fn lookup_any(&self, key: &RequestKey) -> Result<Option<CachedEntry>> {
        let mut inner = self.inner.write().await;
        let found = inner
            .generations
            .iter()
            .find_map(|g| g.entries.get(key).cloned());
        inner.record_lookup(found.is_some());
        Ok(found)
    }

    async fn put(
        &self,
        generation: &GenerationHandle,
        key: RequestKey,
        response: AgentResponse,
    ) -> Result<bool> {
        let mut guard = self.inner.write().await;
        let inner = &mut *guard;
        let live = inner
            .generations
            .iter_mut()
            .find(|g| g.id == generation.id() && g.name == generation.name());
        match live {
            Some(live) => {
                live.entries.insert(key, CachedEntry::new(response));
                inner.stats.record_write();
                Ok(true)
            }
            None => {
                debug!(generation = %generation, key = %key, "dropping write to deleted generation");
                Ok(false)
            }
        }
    }
}
