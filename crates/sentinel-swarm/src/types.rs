//! Common types for the outbreak early-warning swarm

use crate::error::SwarmError;
use crate::escalation::EscalationReport;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Index of a village agent in the roster fixed at startup.
///
/// The roster never grows or shrinks after construction, so indices are
/// stable for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub usize);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "agent#{}", self.0)
    }
}

/// Discretized bucket of outbreak belief, recomputed on every belief update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Normal,
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Threshold ladder: critical >= 0.8 > high >= 0.6 > medium >= 0.4
    /// > low >= 0.2 > normal.
    pub fn from_belief(belief: f64) -> Self {
        if belief >= 0.8 {
            RiskLevel::Critical
        } else if belief >= 0.6 {
            RiskLevel::High
        } else if belief >= 0.4 {
            RiskLevel::Medium
        } else if belief >= 0.2 {
            RiskLevel::Low
        } else {
            RiskLevel::Normal
        }
    }

    /// High or critical.
    pub fn is_elevated(&self) -> bool {
        matches!(self, RiskLevel::High | RiskLevel::Critical)
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskLevel::Normal => "normal",
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        };
        f.write_str(s)
    }
}

/// One entry in a village's append-only report history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymptomRecord {
    /// Raw symptom tokens as reported
    pub symptoms: Vec<String>,
    /// Free-form report metadata
    pub metadata: HashMap<String, serde_json::Value>,
    /// Report timestamp (from metadata when parseable, otherwise receipt time)
    pub timestamp: DateTime<Utc>,
    /// Whether the scored report crossed the anomaly threshold
    pub anomaly_detected: bool,
    /// Anomaly score at scoring time
    pub anomaly_score: f64,
}

/// Kind of action a proposal asks neighbors to vote on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalKind {
    /// Escalate to the heavyweight analysis collaborator
    QuantumEscalation,
    /// Any other collective action
    Action(String),
}

/// A node's request that its neighbors vote on a collective action.
///
/// Proposals live for exactly one voting round; there is no retry or
/// resubmission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: Uuid,
    pub kind: ProposalKind,
    pub proposer: AgentId,
    pub belief_at_proposal: f64,
    pub required_votes: usize,
}

impl Proposal {
    pub fn new(kind: ProposalKind, proposer: AgentId, belief: f64, risk: RiskLevel) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            proposer,
            belief_at_proposal: belief,
            required_votes: Self::required_votes_for(risk),
        }
    }

    /// Elevated-risk proposers need fewer votes to act.
    pub fn required_votes_for(risk: RiskLevel) -> usize {
        if risk.is_elevated() {
            2
        } else {
            3
        }
    }
}

/// Decision attached to a vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteDecision {
    Approve,
    Reject,
    Abstain,
}

impl FromStr for VoteDecision {
    type Err = SwarmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "approve" => Ok(VoteDecision::Approve),
            "reject" => Ok(VoteDecision::Reject),
            "abstain" => Ok(VoteDecision::Abstain),
            other => Err(SwarmError::InvalidVote(other.to_string())),
        }
    }
}

impl fmt::Display for VoteDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VoteDecision::Approve => "approve",
            VoteDecision::Reject => "reject",
            VoteDecision::Abstain => "abstain",
        };
        f.write_str(s)
    }
}

/// A single vote in a voting round. Derived deterministically from the
/// voter's current belief and never stored beyond the round's return value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    pub voter: AgentId,
    pub decision: VoteDecision,
    pub confidence: f64,
}

/// Actions an agent took while processing one report, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentAction {
    AnalyzedSymptoms,
    QueriedNeighbors,
    ProposedConsensus,
    EscalatedToQuantum,
    SharedData,
}

impl fmt::Display for AgentAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AgentAction::AnalyzedSymptoms => "analyzed_symptoms",
            AgentAction::QueriedNeighbors => "queried_neighbors",
            AgentAction::ProposedConsensus => "proposed_consensus",
            AgentAction::EscalatedToQuantum => "escalated_to_quantum",
            AgentAction::SharedData => "shared_data",
        };
        f.write_str(s)
    }
}

/// Coarse recent-activity signal derived from history length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Increasing,
    Stable,
    LowActivity,
}

impl Trend {
    pub fn from_history_len(len: usize) -> Self {
        if len > 5 {
            Trend::Increasing
        } else if len > 2 {
            Trend::Stable
        } else {
            Trend::LowActivity
        }
    }
}

/// What a neighbor is being asked about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    Status,
    Symptoms,
    RiskLevel,
}

/// Read-only snapshot returned to a neighbor query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub village: String,
    pub belief: f64,
    pub risk_level: RiskLevel,
    pub anomaly_detected: bool,
    pub symptom_count: usize,
    pub trend: Trend,
    pub recent_symptoms: Vec<String>,
}

/// Point-in-time view of one agent, used for status aggregation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub id: String,
    pub name: String,
    pub location: (f64, f64),
    pub belief: f64,
    pub risk_level: RiskLevel,
    pub symptom_count: usize,
    pub trend: Trend,
}

/// Per-agent entry in the network status, including topology neighbors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentStatusView {
    pub id: String,
    pub name: String,
    pub location: (f64, f64),
    pub belief: f64,
    pub risk_level: RiskLevel,
    pub symptom_count: usize,
    pub neighbors: Vec<String>,
}

/// Aggregated state of the whole network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkStatus {
    pub total_agents: usize,
    pub network_topology: HashMap<String, Vec<String>>,
    pub agents: HashMap<String, AgentStatusView>,
}

/// Result of routing one symptom report through its village agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportOutcome {
    /// Village that actually processed the report
    pub village: String,
    /// Identifier the caller supplied
    pub requested_village: String,
    /// True when resolution missed and the report was routed to the
    /// default agent
    pub resolution_fallback: bool,
    pub analysis: crate::analysis::SymptomAnalysis,
    pub belief: f64,
    pub risk_level: RiskLevel,
    pub actions_taken: Vec<AgentAction>,
    /// Total reports held by the village after this one
    pub symptom_count: usize,
    /// Votes returned by the neighbor round, if one was held
    pub votes: Vec<Vote>,
    /// Escalation report, if the trigger fired
    pub escalation: Option<EscalationReport>,
}

/// Result of the network-wide outbreak detection workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowOutcome {
    pub average_belief: f64,
    pub elevated_agents: usize,
    pub escalated: bool,
    pub escalation: Option<EscalationReport>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_ladder_thresholds() {
        assert_eq!(RiskLevel::from_belief(0.0), RiskLevel::Normal);
        assert_eq!(RiskLevel::from_belief(0.19), RiskLevel::Normal);
        assert_eq!(RiskLevel::from_belief(0.2), RiskLevel::Low);
        assert_eq!(RiskLevel::from_belief(0.4), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_belief(0.6), RiskLevel::High);
        assert_eq!(RiskLevel::from_belief(0.8), RiskLevel::Critical);
        assert_eq!(RiskLevel::from_belief(1.0), RiskLevel::Critical);
    }

    #[test]
    fn risk_ladder_is_monotone() {
        let beliefs = [0.0, 0.1, 0.2, 0.35, 0.4, 0.55, 0.6, 0.75, 0.8, 1.0];
        for pair in beliefs.windows(2) {
            assert!(RiskLevel::from_belief(pair[0]) <= RiskLevel::from_belief(pair[1]));
        }
    }

    #[test]
    fn vote_decision_parsing() {
        assert_eq!("approve".parse::<VoteDecision>().unwrap(), VoteDecision::Approve);
        assert_eq!(" Reject ".parse::<VoteDecision>().unwrap(), VoteDecision::Reject);
        assert_eq!("ABSTAIN".parse::<VoteDecision>().unwrap(), VoteDecision::Abstain);
        assert!(matches!(
            "request_more_data".parse::<VoteDecision>(),
            Err(SwarmError::InvalidVote(_))
        ));
    }

    #[test]
    fn required_votes_depend_on_risk() {
        assert_eq!(Proposal::required_votes_for(RiskLevel::High), 2);
        assert_eq!(Proposal::required_votes_for(RiskLevel::Critical), 2);
        assert_eq!(Proposal::required_votes_for(RiskLevel::Medium), 3);
        assert_eq!(Proposal::required_votes_for(RiskLevel::Normal), 3);
    }
}
