//! Per-village agent state machine
//!
//! Each agent exclusively owns its mutable state. The only way to reach an
//! agent is through its command queue: [`run`] drains the queue inside a
//! dedicated task, which makes the single-writer-per-node contract
//! structural rather than lock-based.

use crate::analysis::{analyze_symptoms, SymptomAnalysis};
use crate::config::VillageSpec;
use crate::protocol::AgentCommand;
use crate::strategy::{DecisionStrategy, ReportPlan};
use crate::types::{
    AgentId, AgentSnapshot, Proposal, ProposalKind, QueryKind, QueryResponse, RiskLevel,
    SymptomRecord, Trend, Vote,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

/// How many recent records feed the anomaly factor.
const ANOMALY_WINDOW: usize = 5;

/// What the agent decided while processing one report.
#[derive(Debug, Clone)]
pub struct ReportDecision {
    pub analysis: SymptomAnalysis,
    pub belief: f64,
    pub risk_level: RiskLevel,
    /// Total reports held after this one
    pub symptom_count: usize,
    pub plan: ReportPlan,
}

/// Outcome of an escalation evaluation.
#[derive(Debug, Clone)]
pub enum EscalationDecision {
    /// Quorum already holds; escalate immediately
    ConsensusReached { belief: f64 },
    /// No quorum yet; this proposal goes to the neighbors for a vote
    ProposalBroadcast(Proposal),
}

/// State machine for one village.
pub struct VillageAgent {
    id: AgentId,
    key: String,
    name: String,
    location: (f64, f64),
    history: Vec<SymptomRecord>,
    belief: f64,
    risk_level: RiskLevel,
    neighbor_beliefs: HashMap<AgentId, f64>,
    pending_proposal: Option<Proposal>,
    strategy: Box<dyn DecisionStrategy>,
}

impl VillageAgent {
    pub fn new(id: AgentId, spec: &VillageSpec, strategy: Box<dyn DecisionStrategy>) -> Self {
        Self {
            id,
            key: spec.key.clone(),
            name: spec.name.clone(),
            location: spec.location,
            history: Vec::new(),
            belief: 0.0,
            risk_level: RiskLevel::Normal,
            neighbor_beliefs: HashMap::new(),
            pending_proposal: None,
            strategy,
        }
    }

    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn belief(&self) -> f64 {
        self.belief
    }

    pub fn risk_level(&self) -> RiskLevel {
        self.risk_level
    }

    /// Score and append a report, then recompute belief wholesale.
    pub fn record_report(
        &mut self,
        symptoms: Vec<String>,
        metadata: HashMap<String, serde_json::Value>,
    ) -> ReportDecision {
        let analysis = analyze_symptoms(&symptoms, self.history.len());
        let timestamp = report_timestamp(&metadata);
        self.history.push(SymptomRecord {
            symptoms,
            metadata,
            timestamp,
            anomaly_detected: analysis.anomaly_detected,
            anomaly_score: analysis.anomaly_score,
        });
        self.update_belief();

        let plan = self.strategy.plan(self.belief);
        debug!(
            village = %self.name,
            belief = self.belief,
            risk = %self.risk_level,
            ?plan,
            "report recorded"
        );
        ReportDecision {
            analysis,
            belief: self.belief,
            risk_level: self.risk_level,
            symptom_count: self.history.len(),
            plan,
        }
    }

    /// Belief is a pure function of history and last-known neighbor beliefs:
    /// 0.4·history volume + 0.4·recent anomalies + 0.2·neighbor mean.
    /// All three components are in [0, 1] and the weights sum to 1, so the
    /// result needs no clamping.
    fn update_belief(&mut self) {
        let history_factor = (self.history.len() as f64 / 10.0).min(1.0);
        let anomaly_factor = if self.history.is_empty() {
            0.0
        } else {
            let recent = self
                .history
                .iter()
                .rev()
                .take(ANOMALY_WINDOW)
                .filter(|r| r.anomaly_detected)
                .count();
            recent as f64 / ANOMALY_WINDOW as f64
        };
        let neighbor_factor = if self.neighbor_beliefs.is_empty() {
            0.0
        } else {
            self.neighbor_beliefs.values().sum::<f64>() / self.neighbor_beliefs.len() as f64
        };

        self.belief = 0.4 * history_factor + 0.4 * anomaly_factor + 0.2 * neighbor_factor;
        self.risk_level = RiskLevel::from_belief(self.belief);
    }

    /// Overwrite last-known neighbor beliefs, last write wins per neighbor.
    pub fn merge_neighbor_beliefs(&mut self, beliefs: impl IntoIterator<Item = (AgentId, f64)>) {
        for (id, belief) in beliefs {
            self.neighbor_beliefs.insert(id, belief);
        }
    }

    /// Evaluate consensus; when quorum is missing, create a proposal for a
    /// single neighbor voting round.
    pub fn evaluate_escalation(&mut self) -> EscalationDecision {
        if self
            .strategy
            .evaluate_consensus(self.belief, &self.neighbor_beliefs)
        {
            EscalationDecision::ConsensusReached { belief: self.belief }
        } else {
            let proposal = Proposal::new(
                ProposalKind::QuantumEscalation,
                self.id,
                self.belief,
                self.risk_level,
            );
            self.pending_proposal = Some(proposal.clone());
            EscalationDecision::ProposalBroadcast(proposal)
        }
    }

    /// Deterministic vote from current belief; confidence is the belief.
    pub fn cast_vote(&self, proposal: &Proposal) -> Vote {
        Vote {
            voter: self.id,
            decision: self.strategy.vote(proposal, self.belief),
            confidence: self.belief,
        }
    }

    /// Close out a voting round. Proposals have no identity beyond one round.
    pub fn resolve_proposal(&mut self, proposal_id: Uuid) {
        if self
            .pending_proposal
            .as_ref()
            .is_some_and(|p| p.id == proposal_id)
        {
            self.pending_proposal = None;
        }
    }

    pub fn pending_proposal(&self) -> Option<&Proposal> {
        self.pending_proposal.as_ref()
    }

    /// Read-only answer to a neighbor or status query.
    pub fn respond(&self, _kind: QueryKind) -> QueryResponse {
        QueryResponse {
            village: self.name.clone(),
            belief: self.belief,
            risk_level: self.risk_level,
            anomaly_detected: self.risk_level.is_elevated(),
            symptom_count: self.history.len(),
            trend: Trend::from_history_len(self.history.len()),
            recent_symptoms: self
                .history
                .last()
                .map(|r| r.symptoms.clone())
                .unwrap_or_default(),
        }
    }

    pub fn snapshot(&self) -> AgentSnapshot {
        AgentSnapshot {
            id: self.key.clone(),
            name: self.name.clone(),
            location: self.location,
            belief: self.belief,
            risk_level: self.risk_level,
            symptom_count: self.history.len(),
            trend: Trend::from_history_len(self.history.len()),
        }
    }
}

fn report_timestamp(metadata: &HashMap<String, serde_json::Value>) -> DateTime<Utc> {
    metadata
        .get("timestamp")
        .and_then(|v| v.as_str())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(Utc::now)
}

/// Drive one agent from its command queue until all handles are dropped.
pub async fn run(mut agent: VillageAgent, mut rx: mpsc::Receiver<AgentCommand>) {
    debug!(village = %agent.name, "agent task started");
    while let Some(cmd) = rx.recv().await {
        match cmd {
            AgentCommand::Report {
                symptoms,
                metadata,
                reply,
            } => {
                let _ = reply.send(agent.record_report(symptoms, metadata));
            }
            AgentCommand::Query { kind, reply } => {
                let _ = reply.send(agent.respond(kind));
            }
            AgentCommand::MergeNeighborBeliefs { beliefs, reply } => {
                agent.merge_neighbor_beliefs(beliefs);
                let _ = reply.send(());
            }
            AgentCommand::EvaluateEscalation { reply } => {
                let _ = reply.send(agent.evaluate_escalation());
            }
            AgentCommand::CastVote { proposal, reply } => {
                let _ = reply.send(agent.cast_vote(&proposal));
            }
            AgentCommand::ResolveProposal { proposal_id, reply } => {
                agent.resolve_proposal(proposal_id);
                let _ = reply.send(());
            }
            AgentCommand::Snapshot { reply } => {
                let _ = reply.send(agent.snapshot());
            }
        }
    }
    debug!(village = %agent.name, "agent task stopped");
}
