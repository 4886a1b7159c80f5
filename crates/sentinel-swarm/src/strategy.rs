//! Pluggable decision strategies
//!
//! The deterministic rule-based strategy below is the reference
//! implementation. Alternative strategies (e.g. a language-model-driven one)
//! implement the same trait behind the same agent interface.

use crate::types::{AgentId, Proposal, ProposalKind, VoteDecision};
use crate::{DEFAULT_VOTE_THRESHOLD, ESCALATION_THRESHOLD, NEIGHBOR_QUERY_THRESHOLD};
use std::collections::HashMap;

/// Which threshold checks fired for a processed report. Both are independent
/// and may fire in the same call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportPlan {
    pub query_neighbors: bool,
    pub escalate: bool,
}

/// Decision-making seam of a village agent.
pub trait DecisionStrategy: Send + Sync {
    /// Decide which follow-up actions a belief value warrants.
    fn plan(&self, belief: f64) -> ReportPlan;

    /// Decide whether the proposer-plus-neighbor set has reached consensus.
    fn evaluate_consensus(&self, own_belief: f64, neighbor_beliefs: &HashMap<AgentId, f64>)
        -> bool;

    /// Cast a deterministic vote on a proposal given the voter's belief.
    fn vote(&self, proposal: &Proposal, own_belief: f64) -> VoteDecision;
}

/// Threshold-ladder strategy specified by the core design.
#[derive(Debug, Clone)]
pub struct RuleBasedStrategy {
    pub neighbor_threshold: f64,
    pub escalation_threshold: f64,
}

impl Default for RuleBasedStrategy {
    fn default() -> Self {
        Self {
            neighbor_threshold: NEIGHBOR_QUERY_THRESHOLD,
            escalation_threshold: ESCALATION_THRESHOLD,
        }
    }
}

impl RuleBasedStrategy {
    fn approval_threshold(kind: &ProposalKind) -> f64 {
        match kind {
            ProposalKind::QuantumEscalation => NEIGHBOR_QUERY_THRESHOLD,
            ProposalKind::Action(_) => DEFAULT_VOTE_THRESHOLD,
        }
    }
}

impl DecisionStrategy for RuleBasedStrategy {
    fn plan(&self, belief: f64) -> ReportPlan {
        ReportPlan {
            query_neighbors: belief >= self.neighbor_threshold,
            escalate: belief >= self.escalation_threshold,
        }
    }

    fn evaluate_consensus(
        &self,
        own_belief: f64,
        neighbor_beliefs: &HashMap<AgentId, f64>,
    ) -> bool {
        crate::consensus::quorum_reached(own_belief, neighbor_beliefs)
    }

    fn vote(&self, proposal: &Proposal, own_belief: f64) -> VoteDecision {
        if own_belief > Self::approval_threshold(&proposal.kind) {
            VoteDecision::Approve
        } else {
            VoteDecision::Reject
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RiskLevel;

    #[test]
    fn plan_fires_thresholds_independently() {
        let strategy = RuleBasedStrategy::default();
        assert_eq!(strategy.plan(0.1), ReportPlan { query_neighbors: false, escalate: false });
        assert_eq!(strategy.plan(0.4), ReportPlan { query_neighbors: true, escalate: false });
        assert_eq!(strategy.plan(0.7), ReportPlan { query_neighbors: true, escalate: true });
    }

    #[test]
    fn quantum_escalation_votes_at_lower_threshold() {
        let strategy = RuleBasedStrategy::default();
        let quantum = Proposal::new(
            ProposalKind::QuantumEscalation,
            AgentId(0),
            0.8,
            RiskLevel::Critical,
        );
        let generic = Proposal::new(
            ProposalKind::Action("alert_health_officials".to_string()),
            AgentId(0),
            0.8,
            RiskLevel::Critical,
        );
        assert_eq!(strategy.vote(&quantum, 0.45), VoteDecision::Approve);
        assert_eq!(strategy.vote(&generic, 0.45), VoteDecision::Reject);
        assert_eq!(strategy.vote(&generic, 0.55), VoteDecision::Approve);
        // exactly at threshold rejects
        assert_eq!(strategy.vote(&quantum, 0.4), VoteDecision::Reject);
    }

    #[test]
    fn votes_are_referentially_transparent() {
        let strategy = RuleBasedStrategy::default();
        let proposal = Proposal::new(
            ProposalKind::QuantumEscalation,
            AgentId(1),
            0.75,
            RiskLevel::High,
        );
        let first = strategy.vote(&proposal, 0.62);
        let second = strategy.vote(&proposal, 0.62);
        assert_eq!(first, second);
    }
}
