//! Command protocol between the coordinator and agent tasks
//!
//! Every interaction with an agent is a command enqueued on its mpsc queue
//! plus a oneshot reply. A full queue, a dead task, or a slow reply all
//! collapse to [`SwarmError::PeerUnavailable`], which callers treat as
//! "skip this peer".

use crate::agent::{EscalationDecision, ReportDecision};
use crate::error::{SwarmError, SwarmResult};
use crate::types::{AgentId, AgentSnapshot, Proposal, QueryKind, QueryResponse, Vote};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

/// Commands understood by an agent task.
pub enum AgentCommand {
    Report {
        symptoms: Vec<String>,
        metadata: HashMap<String, serde_json::Value>,
        reply: oneshot::Sender<ReportDecision>,
    },
    Query {
        kind: QueryKind,
        reply: oneshot::Sender<QueryResponse>,
    },
    MergeNeighborBeliefs {
        beliefs: Vec<(AgentId, f64)>,
        reply: oneshot::Sender<()>,
    },
    EvaluateEscalation {
        reply: oneshot::Sender<EscalationDecision>,
    },
    CastVote {
        proposal: Proposal,
        reply: oneshot::Sender<Vote>,
    },
    ResolveProposal {
        proposal_id: uuid::Uuid,
        reply: oneshot::Sender<()>,
    },
    Snapshot {
        reply: oneshot::Sender<AgentSnapshot>,
    },
}

/// Cheaply cloneable address of one agent task.
#[derive(Debug, Clone)]
pub struct AgentHandle {
    pub id: AgentId,
    pub key: String,
    pub name: String,
    tx: mpsc::Sender<AgentCommand>,
    timeout: Duration,
}

impl AgentHandle {
    pub fn new(
        id: AgentId,
        key: String,
        name: String,
        tx: mpsc::Sender<AgentCommand>,
        timeout: Duration,
    ) -> Self {
        Self {
            id,
            key,
            name,
            tx,
            timeout,
        }
    }

    async fn request<T>(
        &self,
        cmd: AgentCommand,
        rx: oneshot::Receiver<T>,
    ) -> SwarmResult<T> {
        let unavailable = || SwarmError::PeerUnavailable(self.key.clone());
        self.tx.send(cmd).await.map_err(|_| unavailable())?;
        tokio::time::timeout(self.timeout, rx)
            .await
            .map_err(|_| unavailable())?
            .map_err(|_| unavailable())
    }

    pub async fn report(
        &self,
        symptoms: Vec<String>,
        metadata: HashMap<String, serde_json::Value>,
    ) -> SwarmResult<ReportDecision> {
        let (reply, rx) = oneshot::channel();
        self.request(
            AgentCommand::Report {
                symptoms,
                metadata,
                reply,
            },
            rx,
        )
        .await
    }

    pub async fn query(&self, kind: QueryKind) -> SwarmResult<QueryResponse> {
        let (reply, rx) = oneshot::channel();
        self.request(AgentCommand::Query { kind, reply }, rx).await
    }

    pub async fn merge_neighbor_beliefs(
        &self,
        beliefs: Vec<(AgentId, f64)>,
    ) -> SwarmResult<()> {
        let (reply, rx) = oneshot::channel();
        self.request(AgentCommand::MergeNeighborBeliefs { beliefs, reply }, rx)
            .await
    }

    pub async fn evaluate_escalation(&self) -> SwarmResult<EscalationDecision> {
        let (reply, rx) = oneshot::channel();
        self.request(AgentCommand::EvaluateEscalation { reply }, rx)
            .await
    }

    pub async fn cast_vote(&self, proposal: Proposal) -> SwarmResult<Vote> {
        let (reply, rx) = oneshot::channel();
        self.request(AgentCommand::CastVote { proposal, reply }, rx)
            .await
    }

    pub async fn resolve_proposal(&self, proposal_id: uuid::Uuid) -> SwarmResult<()> {
        let (reply, rx) = oneshot::channel();
        self.request(AgentCommand::ResolveProposal { proposal_id, reply }, rx)
            .await
    }

    pub async fn snapshot(&self) -> SwarmResult<AgentSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.request(AgentCommand::Snapshot { reply }, rx).await
    }
}
