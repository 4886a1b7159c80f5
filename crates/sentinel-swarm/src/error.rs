//! Error types for swarm coordination

use thiserror::Error;

/// Result type for swarm operations
pub type SwarmResult<T> = std::result::Result<T, SwarmError>;

/// Errors that can occur during swarm coordination.
///
/// Configuration errors (`EmptyRegistry`, the topology variants,
/// `DuplicateVillage`) are fatal and raised at construction. Everything else
/// degrades: resolution misses fall back to a default agent, unreachable
/// peers are skipped, and invalid input is returned to the caller as a
/// structured error.
#[derive(Debug, Error)]
pub enum SwarmError {
    /// No village agents registered
    #[error("no village agents registered")]
    EmptyRegistry,

    /// Topology adjacency is not symmetric
    #[error("asymmetric topology: {a} lists {b} but {b} does not list {a}")]
    AsymmetricTopology { a: String, b: String },

    /// Topology references a village missing from the roster
    #[error("topology references unknown village: {0}")]
    UnknownVillage(String),

    /// A village lists itself as a neighbor
    #[error("village {0} listed as its own neighbor")]
    SelfAdjacency(String),

    /// Two roster entries resolve to the same identifier
    #[error("duplicate village identifier: {0}")]
    DuplicateVillage(String),

    /// Agent not found for an identifier
    #[error("agent not found: {0}")]
    AgentNotFound(String),

    /// Peer query, vote, or merge could not complete in time
    #[error("peer unavailable: {0}")]
    PeerUnavailable(String),

    /// Malformed vote decision supplied by a caller
    #[error("invalid vote decision: {0} (expected approve, reject, or abstain)")]
    InvalidVote(String),

    /// Unknown data-sharing category supplied by a caller
    #[error("invalid data-sharing category: {0}")]
    InvalidDataCategory(String),

    /// Other errors
    #[error("swarm error: {0}")]
    Other(#[from] anyhow::Error),
}
