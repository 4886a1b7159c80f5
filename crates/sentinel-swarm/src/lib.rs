//! # Sentinel Swarm
//!
//! Decentralized early-warning network of village monitoring agents. Each
//! agent maintains a local probabilistic belief that an outbreak is underway,
//! exchanges belief snapshots with its topological neighbors, and votes on
//! escalation proposals; once quorum is reached the coordinator triggers a
//! heavyweight external analysis service.
//!
//! ## Key Features
//!
//! - **Per-village state machines**: append-only report history, wholesale
//!   belief recomputation, derived risk levels
//! - **Orchestrator-mediated messaging**: agents never hold references to
//!   each other; all routing flows through the coordinator
//! - **Lightweight quorum consensus**: a single-round belief-ratio vote, not
//!   a crash-fault-tolerant protocol
//! - **Pluggable decision strategies**: the deterministic rule-based strategy
//!   is the reference implementation
//! - **Degrade-and-continue errors**: unreachable peers and collaborator
//!   failures are skipped or surfaced as non-fatal result fields
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────┐
//! │          Swarm Coordinator            │
//! ├───────────────────────────────────────┤
//! │  Topology │  Consensus │  Escalation  │
//! │  (static) │  (quorum)  │  (trigger)   │
//! ├───────────────────────────────────────┤
//! │          Agent Command Queues         │
//! ├───────────────────────────────────────┤
//! │   Village₁   Village₂   Village₃ ...  │
//! └───────────────────────────────────────┘
//! ```

pub mod agent;
pub mod analysis;
pub mod config;
pub mod consensus;
pub mod coordinator;
pub mod error;
pub mod escalation;
pub mod protocol;
pub mod sharing;
pub mod strategy;
pub mod topology;
pub mod types;

pub use agent::{EscalationDecision, ReportDecision, VillageAgent};
pub use analysis::{analyze_symptoms, Recommendation, SymptomAnalysis};
pub use config::{SwarmConfig, VillageSpec};
pub use consensus::{cast_vote, quorum_reached, NetworkEscalationPolicy, VoteReceipt};
pub use coordinator::SwarmCoordinator;
pub use error::{SwarmError, SwarmResult};
pub use escalation::{
    EscalationPriority, EscalationReport, EscalationTrigger, NullQuantumAnalysis, QuantumAnalysis,
};
pub use protocol::{AgentCommand, AgentHandle};
pub use sharing::{share_data, DataCategory, SharingReceipt};
pub use strategy::{DecisionStrategy, ReportPlan, RuleBasedStrategy};
pub use topology::NetworkTopology;
pub use types::*;

/// Belief at which an agent starts querying its neighbors for their beliefs.
pub const NEIGHBOR_QUERY_THRESHOLD: f64 = 0.4;

/// Belief at which an agent evaluates escalation to the analysis collaborator.
pub const ESCALATION_THRESHOLD: f64 = 0.7;

/// Fraction of the proposer-plus-neighbor set that must clear the neighbor
/// threshold for consensus.
pub const CONSENSUS_RATIO: f64 = 0.6;

/// Vote-approval threshold for proposal kinds without a specific rule.
pub const DEFAULT_VOTE_THRESHOLD: f64 = 0.5;

/// Depth of each agent's command queue.
pub const AGENT_QUEUE_DEPTH: usize = 32;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        analyze_symptoms, cast_vote, quorum_reached, share_data, AgentHandle, AgentId,
        DataCategory, DecisionStrategy, EscalationPriority, EscalationReport, EscalationTrigger,
        NetworkEscalationPolicy, NetworkStatus, NetworkTopology, NullQuantumAnalysis, Proposal,
        ProposalKind, QuantumAnalysis, QueryKind, QueryResponse, ReportOutcome, RiskLevel,
        RuleBasedStrategy, SwarmConfig, SwarmCoordinator, SwarmError, SwarmResult, VillageAgent,
        VillageSpec, Vote, VoteDecision, WorkflowOutcome,
    };
}
