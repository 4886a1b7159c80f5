//! Static network topology: who is whose neighbor
//!
//! Adjacency is validated once at construction and immutable afterwards.
//! Asymmetry, unknown villages, and self-loops are configuration errors,
//! not conditions to tolerate at runtime.

use crate::error::{SwarmError, SwarmResult};
use crate::types::AgentId;
use std::collections::HashMap;

/// Symmetric neighbor-adjacency graph over roster indices.
#[derive(Debug, Clone)]
pub struct NetworkTopology {
    neighbors: Vec<Vec<AgentId>>,
}

impl NetworkTopology {
    /// Build and validate a topology. `keys[i]` is the village key for
    /// `AgentId(i)`; villages absent from the adjacency table have no
    /// neighbors.
    pub fn from_config(
        adjacency: &HashMap<String, Vec<String>>,
        keys: &[String],
    ) -> SwarmResult<Self> {
        let index: HashMap<&str, AgentId> = keys
            .iter()
            .enumerate()
            .map(|(i, k)| (k.as_str(), AgentId(i)))
            .collect();

        let mut neighbors: Vec<Vec<AgentId>> = vec![Vec::new(); keys.len()];
        for (key, adjacent) in adjacency {
            let id = *index
                .get(key.as_str())
                .ok_or_else(|| SwarmError::UnknownVillage(key.clone()))?;
            for other in adjacent {
                let other_id = *index
                    .get(other.as_str())
                    .ok_or_else(|| SwarmError::UnknownVillage(other.clone()))?;
                if other_id == id {
                    return Err(SwarmError::SelfAdjacency(key.clone()));
                }
                neighbors[id.0].push(other_id);
            }
        }

        for list in &mut neighbors {
            list.sort_unstable();
            list.dedup();
        }

        // b in neighbors(a) must imply a in neighbors(b)
        for (i, list) in neighbors.iter().enumerate() {
            for other in list {
                if !neighbors[other.0].contains(&AgentId(i)) {
                    return Err(SwarmError::AsymmetricTopology {
                        a: keys[i].clone(),
                        b: keys[other.0].clone(),
                    });
                }
            }
        }

        Ok(Self { neighbors })
    }

    /// Ordered neighbor set of a node.
    pub fn neighbors(&self, id: AgentId) -> &[AgentId] {
        &self.neighbors[id.0]
    }

    pub fn node_count(&self) -> usize {
        self.neighbors.len()
    }
}
