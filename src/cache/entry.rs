//! Cached Entry Module
//!
//! Immutable snapshot of a response at the time it was stored.

use chrono::{DateTime, Duration, Utc};

use crate::models::AgentResponse;

// == Cached Entry ==
/// A stored response plus the time it was written.
///
/// Entries are replaced wholesale by newer fetches and never expire on their
/// own; only deleting the whole generation removes them.
#[derive(Debug, Clone)]
pub struct CachedEntry {
    response: AgentResponse,
    /// Time the entry was written
    pub stored_at: DateTime<Utc>,
}

impl CachedEntry {
    // == Constructor ==
    pub fn new(response: AgentResponse) -> Self {
        Self {
            response,
            stored_at: Utc::now(),
        }
    }

    /// Borrow the stored response.
    pub fn response(&self) -> &AgentResponse {
        &self.response
    }

    /// Copy of the stored response; the snapshot itself stays untouched.
    pub fn to_response(&self) -> AgentResponse {
        self.response.clone()
    }

    pub fn into_response(self) -> AgentResponse {
        self.response
    }

    /// Time elapsed since the entry was written.
    pub fn age(&self) -> Duration {
        Utc::now() - self.stored_at
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_snapshot_is_independent() {
        let entry = CachedEntry::new(AgentResponse::ok("text/plain", "original"));

        let mut copy = entry.to_response();
        copy.body = "changed".into();

        assert_eq!(&entry.response().body[..], b"original");
    }

    #[test]
    fn test_entry_age_is_non_negative() {
        let entry = CachedEntry::new(AgentResponse::ok("text/plain", "x"));
        assert!(entry.age() >= Duration::zero());
    }
}
