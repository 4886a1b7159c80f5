//! Static configuration: the village roster and network adjacency are the
//! only persisted state in the system.

use crate::error::SwarmResult;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One village in the fixed roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VillageSpec {
    /// Canonical identifier (e.g. "v1")
    pub key: String,
    /// Display name (e.g. "Navi Mumbai")
    pub name: String,
    /// Coordinate pair (latitude, longitude)
    pub location: (f64, f64),
}

impl VillageSpec {
    pub fn new(key: &str, name: &str, location: (f64, f64)) -> Self {
        Self {
            key: key.to_string(),
            name: name.to_string(),
            location,
        }
    }
}

/// Configuration for the swarm coordinator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SwarmConfig {
    /// Fixed village roster; index order defines agent ids
    pub villages: Vec<VillageSpec>,
    /// Adjacency table keyed by village key; must be symmetric
    pub adjacency: HashMap<String, Vec<String>>,
    /// Timeout for a single neighbor query, vote, or merge
    pub peer_timeout_ms: u64,
    /// Timeout for the escalation collaborator call
    pub escalation_timeout_ms: u64,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        let villages = vec![
            VillageSpec::new("v1", "Dharavi", (19.04, 72.86)),
            VillageSpec::new("v2", "Kalyan", (19.24, 73.14)),
            VillageSpec::new("v3", "Thane", (19.22, 72.97)),
            VillageSpec::new("v4", "Navi Mumbai", (19.03, 73.01)),
        ];
        let adjacency = HashMap::from([
            ("v1".to_string(), vec!["v2".to_string(), "v3".to_string()]),
            ("v2".to_string(), vec!["v1".to_string(), "v3".to_string()]),
            (
                "v3".to_string(),
                vec!["v1".to_string(), "v2".to_string(), "v4".to_string()],
            ),
            ("v4".to_string(), vec!["v3".to_string()]),
        ]);
        Self {
            villages,
            adjacency,
            peer_timeout_ms: 5_000,
            escalation_timeout_ms: 10_000,
        }
    }
}

impl SwarmConfig {
    /// Load a configuration from a JSON document. Missing fields fall back
    /// to the defaults.
    pub fn from_json(raw: &str) -> SwarmResult<Self> {
        let config: SwarmConfig =
            serde_json::from_str(raw).map_err(|e| anyhow::anyhow!("invalid swarm config: {e}"))?;
        Ok(config)
    }
}
