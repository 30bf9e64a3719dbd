//! Response DTOs for the host control endpoints
//!
//! Defines the JSON bodies of `/__agent/health` and `/__agent/stats`.

use serde::Serialize;

use crate::cache::StorageStats;

/// Response body for the health endpoint (GET /__agent/health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Lifecycle state of the agent
    pub agent_state: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy(agent_state: impl Into<String>) -> Self {
        Self {
            status: "healthy".to_string(),
            agent_state: agent_state.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Response body for the stats endpoint (GET /__agent/stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Deployed version tag
    pub version: String,
    /// Generation names currently present in storage
    pub generations: Vec<String>,
    /// Number of cache lookups that found an entry
    pub hits: u64,
    /// Number of cache lookups that found nothing
    pub misses: u64,
    /// Number of entries written
    pub writes: u64,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    /// Revalidations still running in the background
    pub pending_revalidations: usize,
}

impl StatsResponse {
    pub fn new(
        version: impl Into<String>,
        generations: Vec<String>,
        stats: &StorageStats,
        pending_revalidations: usize,
    ) -> Self {
        Self {
            version: version.into(),
            generations,
            hits: stats.hits,
            misses: stats.misses,
            writes: stats.writes,
            hit_rate: stats.hit_rate(),
            pending_revalidations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy("activated");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("activated"));
        assert!(json.contains("timestamp"));
    }

    #[test]
    fn test_stats_response_hit_rate() {
        let stats = StorageStats {
            hits: 3,
            misses: 1,
            writes: 2,
            generations: 2,
        };
        let resp = StatsResponse::new("v1", vec!["core-v1".into()], &stats, 0);
        assert!((resp.hit_rate - 0.75).abs() < 0.001);
        assert_eq!(resp.writes, 2);
    }
}
