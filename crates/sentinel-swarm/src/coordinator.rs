//! Swarm coordinator: the single message-routing hub
//!
//! Agents never hold references to each other. The coordinator owns every
//! agent handle and mediates reports, neighbor queries, voting rounds, and
//! escalation, so there is exactly one writer per agent queue sequence and
//! no cycle anywhere in the task graph.

use crate::agent::{self, EscalationDecision, VillageAgent};
use crate::config::SwarmConfig;
use crate::consensus::{average_belief, NetworkEscalationPolicy};
use crate::error::{SwarmError, SwarmResult};
use crate::escalation::{EscalationTrigger, QuantumAnalysis};
use crate::protocol::AgentHandle;
use crate::sharing::{self, DataCategory, SharingReceipt};
use crate::strategy::RuleBasedStrategy;
use crate::topology::NetworkTopology;
use crate::types::{
    AgentAction, AgentId, AgentStatusView, NetworkStatus, Proposal, QueryKind, QueryResponse,
    ReportOutcome, Vote, WorkflowOutcome,
};
use crate::AGENT_QUEUE_DEPTH;
use metrics::counter;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Orchestrates a fixed roster of village agents over a static topology.
#[derive(Debug)]
pub struct SwarmCoordinator {
    handles: Vec<AgentHandle>,
    /// Normalized key and name, both mapped to the roster index
    index: HashMap<String, AgentId>,
    topology: NetworkTopology,
    trigger: EscalationTrigger,
    policy: NetworkEscalationPolicy,
}

/// Lowercased, trimmed, spaces collapsed to underscores.
fn normalize(identifier: &str) -> String {
    identifier.trim().to_lowercase().replace(' ', "_")
}

impl SwarmCoordinator {
    /// Validate the configuration and spawn one agent task per village.
    pub fn new(config: SwarmConfig, quantum: Arc<dyn QuantumAnalysis>) -> SwarmResult<Self> {
        if config.villages.is_empty() {
            return Err(SwarmError::EmptyRegistry);
        }

        let keys: Vec<String> = config.villages.iter().map(|v| v.key.clone()).collect();
        let topology = NetworkTopology::from_config(&config.adjacency, &keys)?;

        let mut index = HashMap::new();
        let mut handles = Vec::with_capacity(config.villages.len());
        let peer_timeout = Duration::from_millis(config.peer_timeout_ms);

        for (i, spec) in config.villages.iter().enumerate() {
            let id = AgentId(i);
            for alias in [normalize(&spec.key), normalize(&spec.name)] {
                if index.insert(alias, id).is_some_and(|prev| prev != id) {
                    return Err(SwarmError::DuplicateVillage(spec.key.clone()));
                }
            }

            let (tx, rx) = mpsc::channel(AGENT_QUEUE_DEPTH);
            let villager =
                VillageAgent::new(id, spec, Box::new(RuleBasedStrategy::default()));
            tokio::spawn(agent::run(villager, rx));
            handles.push(AgentHandle::new(
                id,
                spec.key.clone(),
                spec.name.clone(),
                tx,
                peer_timeout,
            ));
        }

        info!(
            villages = handles.len(),
            peer_timeout_ms = config.peer_timeout_ms,
            "swarm coordinator started"
        );

        Ok(Self {
            handles,
            index,
            topology,
            trigger: EscalationTrigger::new(
                quantum,
                Duration::from_millis(config.escalation_timeout_ms),
            ),
            policy: NetworkEscalationPolicy::default(),
        })
    }

    /// Resolve an identifier to a roster index: exact key first, then
    /// case-insensitive name with spaces normalized.
    pub fn resolve(&self, identifier: &str) -> Option<AgentId> {
        self.index.get(&normalize(identifier)).copied()
    }

    /// Route one symptom report to its village and run the follow-up ladder:
    /// neighbor queries at belief 0.4, escalation evaluation at 0.7.
    pub async fn process_symptom_report(
        &self,
        identifier: &str,
        symptoms: Vec<String>,
        metadata: HashMap<String, serde_json::Value>,
    ) -> SwarmResult<ReportOutcome> {
        counter!("swarm_reports_total").increment(1);

        let (id, resolution_fallback) = match self.resolve(identifier) {
            Some(id) => (id, false),
            None => {
                warn!(identifier, fallback = %self.handles[0].name, "unknown village, routing to default agent");
                (AgentId(0), true)
            }
        };
        let handle = &self.handles[id.0];

        let decision = handle.report(symptoms, metadata).await?;
        let mut actions = vec![AgentAction::AnalyzedSymptoms];
        let mut votes = Vec::new();
        let mut escalation = None;

        if decision.plan.query_neighbors {
            let beliefs = self.query_neighbor_beliefs(id).await;
            handle.merge_neighbor_beliefs(beliefs).await?;
            actions.push(AgentAction::QueriedNeighbors);
        }

        if decision.plan.escalate {
            match handle.evaluate_escalation().await? {
                EscalationDecision::ConsensusReached { belief } => {
                    let snapshot = self.get_network_status().await?;
                    escalation = Some(self.trigger.fire(&handle.name, belief, &snapshot).await);
                    actions.push(AgentAction::EscalatedToQuantum);
                }
                EscalationDecision::ProposalBroadcast(proposal) => {
                    votes = self
                        .collect_votes(&proposal, self.topology.neighbors(id))
                        .await;
                    handle.resolve_proposal(proposal.id).await?;
                    actions.push(AgentAction::ProposedConsensus);
                }
            }
        }

        Ok(ReportOutcome {
            village: handle.name.clone(),
            requested_village: identifier.to_string(),
            resolution_fallback,
            analysis: decision.analysis,
            belief: decision.belief,
            risk_level: decision.risk_level,
            actions_taken: actions,
            symptom_count: decision.symptom_count,
            votes,
            escalation,
        })
    }

    /// Best-effort status sweep over a node's neighbors. Unreachable
    /// neighbors are skipped, never fatal.
    async fn query_neighbor_beliefs(&self, id: AgentId) -> Vec<(AgentId, f64)> {
        let mut beliefs = Vec::new();
        for neighbor in self.topology.neighbors(id) {
            match self.handles[neighbor.0].query(QueryKind::Status).await {
                Ok(response) => beliefs.push((*neighbor, response.belief)),
                Err(e) => {
                    debug!(neighbor = %self.handles[neighbor.0].key, error = %e, "skipping unreachable neighbor");
                }
            }
        }
        beliefs
    }

    /// Run one voting round. The proposer never votes on its own proposal;
    /// unreachable voters are omitted from the tally.
    pub async fn collect_votes(&self, proposal: &Proposal, voters: &[AgentId]) -> Vec<Vote> {
        counter!("swarm_voting_rounds_total").increment(1);
        let mut votes = Vec::new();
        for voter in voters {
            if *voter == proposal.proposer {
                continue;
            }
            match self.handles[voter.0].cast_vote(proposal.clone()).await {
                Ok(vote) => votes.push(vote),
                Err(e) => {
                    debug!(voter = %self.handles[voter.0].key, error = %e, "skipping unreachable voter");
                }
            }
        }
        votes
    }

    /// Query one agent by identifier. An unresolvable identifier here is a
    /// structured error, unlike report routing which falls back.
    pub async fn query_agent(
        &self,
        identifier: &str,
        kind: QueryKind,
    ) -> SwarmResult<QueryResponse> {
        let id = self
            .resolve(identifier)
            .ok_or_else(|| SwarmError::AgentNotFound(identifier.to_string()))?;
        self.handles[id.0].query(kind).await
    }

    /// Aggregate every agent's snapshot plus the static topology.
    pub async fn get_network_status(&self) -> SwarmResult<NetworkStatus> {
        let mut agents = HashMap::new();
        let mut network_topology = HashMap::new();

        for handle in &self.handles {
            let snapshot = handle.snapshot().await?;
            let neighbors: Vec<String> = self
                .topology
                .neighbors(handle.id)
                .iter()
                .map(|n| self.handles[n.0].key.clone())
                .collect();
            network_topology.insert(handle.key.clone(), neighbors.clone());
            agents.insert(
                handle.key.clone(),
                AgentStatusView {
                    id: snapshot.id,
                    name: snapshot.name,
                    location: snapshot.location,
                    belief: snapshot.belief,
                    risk_level: snapshot.risk_level,
                    symptom_count: snapshot.symptom_count,
                    neighbors,
                },
            );
        }

        Ok(NetworkStatus {
            total_agents: self.handles.len(),
            network_topology,
            agents,
        })
    }

    /// Status of a single agent, `None` when the identifier resolves to
    /// nothing.
    pub async fn get_agent_status(
        &self,
        identifier: &str,
    ) -> SwarmResult<Option<AgentStatusView>> {
        let Some(id) = self.resolve(identifier) else {
            return Ok(None);
        };
        let handle = &self.handles[id.0];
        let snapshot = handle.snapshot().await?;
        Ok(Some(AgentStatusView {
            id: snapshot.id,
            name: snapshot.name,
            location: snapshot.location,
            belief: snapshot.belief,
            risk_level: snapshot.risk_level,
            symptom_count: snapshot.symptom_count,
            neighbors: self
                .topology
                .neighbors(id)
                .iter()
                .map(|n| self.handles[n.0].key.clone())
                .collect(),
        }))
    }

    /// Network-wide sweep: escalate when at least two agents are elevated or
    /// the average belief crosses the escalation threshold.
    pub async fn trigger_outbreak_detection_workflow(&self) -> SwarmResult<WorkflowOutcome> {
        let mut snapshots = Vec::with_capacity(self.handles.len());
        for handle in &self.handles {
            snapshots.push(handle.snapshot().await?);
        }

        let average = average_belief(&snapshots);
        let elevated = snapshots
            .iter()
            .filter(|s| s.risk_level.is_elevated())
            .count();
        let escalated = self.policy.should_escalate(&snapshots);

        info!(
            average_belief = average,
            elevated_agents = elevated,
            escalated,
            "outbreak detection workflow complete"
        );

        let escalation = if escalated {
            let status = self.get_network_status().await?;
            Some(self.trigger.fire("network", average, &status).await)
        } else {
            None
        };

        Ok(WorkflowOutcome {
            average_belief: average,
            elevated_agents: elevated,
            escalated,
            escalation,
        })
    }

    /// Share an anonymized payload from one village to its topology
    /// neighbors. The category string is validated.
    pub async fn share_data(
        &self,
        identifier: &str,
        category: &str,
        payload: &serde_json::Value,
    ) -> SwarmResult<SharingReceipt> {
        let category: DataCategory = category.parse()?;
        let id = self
            .resolve(identifier)
            .ok_or_else(|| SwarmError::AgentNotFound(identifier.to_string()))?;
        let recipients: Vec<String> = self
            .topology
            .neighbors(id)
            .iter()
            .map(|n| self.handles[n.0].name.clone())
            .collect();
        counter!("swarm_shares_total").increment(1);
        Ok(sharing::share_data(
            &self.handles[id.0].name,
            category,
            payload,
            recipients,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escalation::NullQuantumAnalysis;

    fn coordinator() -> SwarmCoordinator {
        SwarmCoordinator::new(SwarmConfig::default(), Arc::new(NullQuantumAnalysis)).unwrap()
    }

    #[tokio::test]
    async fn resolves_keys_and_names() {
        let swarm = coordinator();
        assert_eq!(swarm.resolve("v1"), Some(AgentId(0)));
        assert_eq!(swarm.resolve("Dharavi"), Some(AgentId(0)));
        assert_eq!(swarm.resolve("navi mumbai"), Some(AgentId(3)));
        assert_eq!(swarm.resolve("NAVI_MUMBAI"), Some(AgentId(3)));
        assert_eq!(swarm.resolve("atlantis"), None);
    }

    #[tokio::test]
    async fn empty_roster_is_fatal() {
        let config = SwarmConfig {
            villages: Vec::new(),
            adjacency: HashMap::new(),
            ..SwarmConfig::default()
        };
        let err = SwarmCoordinator::new(config, Arc::new(NullQuantumAnalysis)).unwrap_err();
        assert!(matches!(err, SwarmError::EmptyRegistry));
    }

    #[tokio::test]
    async fn duplicate_aliases_are_rejected() {
        let config = SwarmConfig {
            villages: vec![
                crate::config::VillageSpec::new("v1", "Thane", (0.0, 0.0)),
                crate::config::VillageSpec::new("v2", "THANE", (1.0, 1.0)),
            ],
            adjacency: HashMap::new(),
            ..SwarmConfig::default()
        };
        let err = SwarmCoordinator::new(config, Arc::new(NullQuantumAnalysis)).unwrap_err();
        assert!(matches!(err, SwarmError::DuplicateVillage(_)));
    }
}
