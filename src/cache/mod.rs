//! Cache Module
//!
//! Named, versioned cache generations behind the `CacheStorage` seam, plus
//! the in-memory implementation used by the host and by tests.

mod entry;
mod key;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

use std::fmt;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::AgentResponse;

// Re-export public types
pub use entry::CachedEntry;
pub use key::RequestKey;
pub use stats::StorageStats;
pub use store::MemoryCacheStorage;

// == Generation Role ==
/// The two generations that coexist for a given version tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationRole {
    /// Pre-populated essential assets
    Core,
    /// Opportunistically populated responses
    Runtime,
}

impl GenerationRole {
    pub fn as_str(self) -> &'static str {
        match self {
            GenerationRole::Core => "core",
            GenerationRole::Runtime => "runtime",
        }
    }

    /// `<role>-<version-tag>`.
    pub fn generation_name(self, version_tag: &str) -> String {
        format!("{}-{}", self.as_str(), version_tag)
    }
}

impl fmt::Display for GenerationRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// == Generation Handle ==
/// An opened generation. A handle keeps naming the generation it was opened
/// on: once that generation is deleted, writes through the handle are dropped
/// even if a generation with the same name is created again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationHandle {
    name: String,
    id: u64,
}

impl GenerationHandle {
    pub fn new(name: impl Into<String>, id: u64) -> Self {
        Self {
            name: name.into(),
            id,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Identity of the generation instance, unique within one storage.
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl fmt::Display for GenerationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.id)
    }
}

// == Cache Storage ==
/// Store of named generations, shared by every in-flight request.
///
/// Implementations must tolerate concurrent readers and writers. Writes to the
/// same key are last-write-wins; callers never hold a lock across a
/// lookup-then-put sequence.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Opens a generation, creating it empty if absent.
    async fn open(&self, generation: &str) -> Result<GenerationHandle>;

    /// Returns true if the generation exists.
    async fn has(&self, generation: &str) -> Result<bool>;

    /// Generation names in creation order.
    async fn keys(&self) -> Result<Vec<String>>;

    /// Deletes a generation with all its entries. Returns false if absent.
    async fn delete(&self, generation: &str) -> Result<bool>;

    /// Looks up an entry in one generation. A missing generation is a miss.
    async fn lookup(&self, generation: &str, key: &RequestKey) -> Result<Option<CachedEntry>>;

    /// Looks up an entry across all generations, oldest generation first.
    async fn lookup_any(&self, key: &RequestKey) -> Result<Option<CachedEntry>>;

    /// Stores a response in the handle's generation, replacing any previous
    /// entry for the key. Returns false, storing nothing, if that generation
    /// has been deleted since the handle was opened.
    async fn put(
        &self,
        generation: &GenerationHandle,
        key: RequestKey,
        response: AgentResponse,
    ) -> Result<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_names() {
        assert_eq!(GenerationRole::Core.generation_name("v1"), "core-v1");
        assert_eq!(GenerationRole::Runtime.generation_name("2024.06"), "runtime-2024.06");
        assert_eq!(GenerationRole::Runtime.to_string(), "runtime");
    }

    #[test]
    fn test_generation_handle_display() {
        let handle = GenerationHandle::new("core-v1", 3);
        assert_eq!(handle.name(), "core-v1");
        assert_eq!(handle.to_string(), "core-v1#3");
    }
}
