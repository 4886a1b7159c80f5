//! Consensus evaluation and voting
//!
//! This is a lightweight quorum approximation over last-known neighbor
//! beliefs: single round, no persistence, no leader election, no retries
//! across node failures. A neighbor with no known belief is simply absent
//! from the ratio denominator.

use crate::error::{SwarmError, SwarmResult};
use crate::types::{AgentId, AgentSnapshot, VoteDecision};
use crate::{CONSENSUS_RATIO, ESCALATION_THRESHOLD, NEIGHBOR_QUERY_THRESHOLD};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Per-node consensus rule.
///
/// With no known neighbor beliefs, consensus holds iff the proposer's own
/// belief clears the escalation threshold. Otherwise the proposer counts
/// itself on both sides of the ratio:
/// `(neighbors at/above 0.4 + 1) / (known neighbors + 1) >= 0.6`.
pub fn quorum_reached(own_belief: f64, neighbor_beliefs: &HashMap<AgentId, f64>) -> bool {
    if neighbor_beliefs.is_empty() {
        return own_belief >= ESCALATION_THRESHOLD;
    }
    let high = neighbor_beliefs
        .values()
        .filter(|b| **b >= NEIGHBOR_QUERY_THRESHOLD)
        .count();
    let ratio = (high + 1) as f64 / (neighbor_beliefs.len() + 1) as f64;
    ratio >= CONSENSUS_RATIO
}

/// Acknowledgement of an externally supplied vote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteReceipt {
    pub proposal_id: Uuid,
    pub decision: VoteDecision,
    pub confidence: f64,
    pub recorded_at: DateTime<Utc>,
}

/// Validate and record a vote supplied as raw strings (e.g. from an ingress
/// layer). A malformed decision is a structured error, not a crash;
/// confidence is clamped to `[0, 1]`.
pub fn cast_vote(proposal_id: Uuid, decision: &str, confidence: f64) -> SwarmResult<VoteReceipt> {
    let decision: VoteDecision = decision.parse()?;
    Ok(VoteReceipt {
        proposal_id,
        decision,
        confidence: confidence.clamp(0.0, 1.0),
        recorded_at: Utc::now(),
    })
}

/// Network-wide escalation rule, kept deliberately distinct from the
/// per-node quorum rule above: the two thresholds are independent policies.
#[derive(Debug, Clone)]
pub struct NetworkEscalationPolicy {
    /// Minimum number of agents at high/critical risk
    pub min_elevated_agents: usize,
    /// Network average belief that escalates on its own
    pub average_threshold: f64,
}

impl Default for NetworkEscalationPolicy {
    fn default() -> Self {
        Self {
            min_elevated_agents: 2,
            average_threshold: ESCALATION_THRESHOLD,
        }
    }
}

impl NetworkEscalationPolicy {
    pub fn should_escalate(&self, snapshots: &[AgentSnapshot]) -> bool {
        if snapshots.is_empty() {
            return false;
        }
        let elevated = snapshots.iter().filter(|s| s.risk_level.is_elevated()).count();
        elevated >= self.min_elevated_agents
            || average_belief(snapshots) >= self.average_threshold
    }
}

/// Simple mean of agent beliefs; 0 for an empty slice.
pub fn average_belief(snapshots: &[AgentSnapshot]) -> f64 {
    if snapshots.is_empty() {
        return 0.0;
    }
    snapshots.iter().map(|s| s.belief).sum::<f64>() / snapshots.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RiskLevel, Trend};

    fn beliefs(pairs: &[(usize, f64)]) -> HashMap<AgentId, f64> {
        pairs.iter().map(|(i, b)| (AgentId(*i), *b)).collect()
    }

    fn snapshot(belief: f64) -> AgentSnapshot {
        AgentSnapshot {
            id: "v1".to_string(),
            name: "Test".to_string(),
            location: (0.0, 0.0),
            belief,
            risk_level: RiskLevel::from_belief(belief),
            symptom_count: 0,
            trend: Trend::LowActivity,
        }
    }

    #[test]
    fn no_neighbors_falls_back_to_own_belief() {
        // belief 0.75 with empty neighbor map reaches consensus
        assert!(quorum_reached(0.75, &HashMap::new()));
        assert!(!quorum_reached(0.69, &HashMap::new()));
    }

    #[test]
    fn one_of_two_neighbors_high_reaches_consensus() {
        // (1 + 1) / (2 + 1) = 0.667 >= 0.6
        let map = beliefs(&[(1, 0.5), (2, 0.1)]);
        assert!(quorum_reached(0.7, &map));
    }

    #[test]
    fn zero_of_two_neighbors_high_fails() {
        // (0 + 1) / (2 + 1) = 0.333 < 0.6
        let map = beliefs(&[(1, 0.3), (2, 0.1)]);
        assert!(!quorum_reached(0.9, &map));
    }

    #[test]
    fn consensus_law_table() {
        // (k + 1) / (n + 1) >= 0.6 across neighbor counts
        let cases = [
            (1usize, 0usize, false), // 1/2
            (1, 1, true),            // 2/2
            (2, 1, true),            // 2/3
            (3, 1, false),           // 2/4
            (3, 2, true),            // 3/4
            (4, 2, true),            // 3/5
            (4, 1, false),           // 2/5
        ];
        for (n, k, expected) in cases {
            let map: HashMap<AgentId, f64> = (0..n)
                .map(|i| (AgentId(i), if i < k { 0.5 } else { 0.1 }))
                .collect();
            assert_eq!(quorum_reached(0.0, &map), expected, "n={n} k={k}");
        }
    }

    #[test]
    fn cast_vote_validates_decision() {
        let id = Uuid::new_v4();
        let receipt = cast_vote(id, "approve", 1.7).unwrap();
        assert_eq!(receipt.decision, VoteDecision::Approve);
        assert_eq!(receipt.confidence, 1.0);

        let err = cast_vote(id, "maybe", 0.5).unwrap_err();
        assert!(matches!(err, SwarmError::InvalidVote(d) if d == "maybe"));
    }

    #[test]
    fn network_policy_escalates_on_two_elevated() {
        let policy = NetworkEscalationPolicy::default();
        let low = vec![snapshot(0.1), snapshot(0.2), snapshot(0.3)];
        assert!(!policy.should_escalate(&low));

        let two_high = vec![snapshot(0.65), snapshot(0.7), snapshot(0.1), snapshot(0.0)];
        assert!(policy.should_escalate(&two_high));
    }

    #[test]
    fn network_policy_escalates_on_average() {
        let policy = NetworkEscalationPolicy::default();
        let hot = vec![snapshot(0.75), snapshot(0.72)];
        assert!(policy.should_escalate(&hot));
        assert!(average_belief(&hot) > 0.7);
        assert!(!policy.should_escalate(&[]));
    }
}
