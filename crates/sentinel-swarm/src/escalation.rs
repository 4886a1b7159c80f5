//! Escalation to the external heavyweight analysis collaborator
//!
//! The collaborator may fail or hang; either outcome is captured as a
//! non-fatal field on the escalation report and never propagated to the
//! caller of the node/orchestrator operation.

use crate::types::NetworkStatus;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::counter;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// External pattern-detection service invoked on escalation.
#[async_trait]
pub trait QuantumAnalysis: Send + Sync {
    /// Run heavyweight outbreak-pattern detection over a network snapshot.
    async fn detect_outbreak_pattern(
        &self,
        snapshot: &NetworkStatus,
    ) -> anyhow::Result<serde_json::Value>;
}

/// Collaborator stand-in that acknowledges without analyzing. Used when no
/// real service is wired and in tests.
pub struct NullQuantumAnalysis;

#[async_trait]
impl QuantumAnalysis for NullQuantumAnalysis {
    async fn detect_outbreak_pattern(
        &self,
        snapshot: &NetworkStatus,
    ) -> anyhow::Result<serde_json::Value> {
        Ok(serde_json::json!({
            "status": "acknowledged",
            "agents_observed": snapshot.total_agents,
        }))
    }
}

/// Priority attached to an escalation, derived from belief alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EscalationPriority {
    Low,
    Medium,
    High,
    Critical,
}

impl EscalationPriority {
    pub fn from_belief(belief: f64) -> Self {
        if belief >= 0.8 {
            EscalationPriority::Critical
        } else if belief >= 0.6 {
            EscalationPriority::High
        } else if belief >= 0.4 {
            EscalationPriority::Medium
        } else {
            EscalationPriority::Low
        }
    }
}

impl std::fmt::Display for EscalationPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EscalationPriority::Low => "low",
            EscalationPriority::Medium => "medium",
            EscalationPriority::High => "high",
            EscalationPriority::Critical => "critical",
        };
        f.write_str(s)
    }
}

/// Outcome of firing the trigger once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationReport {
    pub village: String,
    pub belief: f64,
    pub priority: EscalationPriority,
    /// Collaborator output when the call succeeded
    pub analysis: Option<serde_json::Value>,
    /// Collaborator failure or timeout, surfaced non-fatally
    pub error: Option<String>,
    pub triggered_at: DateTime<Utc>,
}

/// Stateless trigger mapping belief to priority and invoking the
/// collaborator under a bounded timeout.
pub struct EscalationTrigger {
    service: Arc<dyn QuantumAnalysis>,
    timeout: Duration,
}

impl std::fmt::Debug for EscalationTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EscalationTrigger")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl EscalationTrigger {
    pub fn new(service: Arc<dyn QuantumAnalysis>, timeout: Duration) -> Self {
        Self { service, timeout }
    }

    pub async fn fire(
        &self,
        village: &str,
        belief: f64,
        snapshot: &NetworkStatus,
    ) -> EscalationReport {
        let priority = EscalationPriority::from_belief(belief);
        info!(village, belief, %priority, "escalating to quantum analysis");
        counter!("swarm_escalations_total").increment(1);

        let (analysis, error) =
            match tokio::time::timeout(self.timeout, self.service.detect_outbreak_pattern(snapshot))
                .await
            {
                Ok(Ok(value)) => (Some(value), None),
                Ok(Err(e)) => {
                    warn!(village, error = %e, "quantum analysis failed");
                    (None, Some(e.to_string()))
                }
                Err(_) => {
                    warn!(village, timeout_ms = self.timeout.as_millis() as u64, "quantum analysis timed out");
                    (None, Some(format!("quantum analysis timed out after {:?}", self.timeout)))
                }
            };

        EscalationReport {
            village: village.to_string(),
            belief,
            priority,
            analysis,
            error,
            triggered_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn empty_snapshot() -> NetworkStatus {
        NetworkStatus {
            total_agents: 0,
            network_topology: HashMap::new(),
            agents: HashMap::new(),
        }
    }

    #[test]
    fn priority_ladder() {
        assert_eq!(EscalationPriority::from_belief(0.85), EscalationPriority::Critical);
        assert_eq!(EscalationPriority::from_belief(0.8), EscalationPriority::Critical);
        assert_eq!(EscalationPriority::from_belief(0.65), EscalationPriority::High);
        assert_eq!(EscalationPriority::from_belief(0.45), EscalationPriority::Medium);
        assert_eq!(EscalationPriority::from_belief(0.1), EscalationPriority::Low);
    }

    #[tokio::test]
    async fn null_service_acknowledges() {
        let trigger =
            EscalationTrigger::new(Arc::new(NullQuantumAnalysis), Duration::from_secs(1));
        let report = trigger.fire("Thane", 0.72, &empty_snapshot()).await;
        assert_eq!(report.priority, EscalationPriority::High);
        assert!(report.analysis.is_some());
        assert!(report.error.is_none());
    }

    struct FailingService;

    #[async_trait]
    impl QuantumAnalysis for FailingService {
        async fn detect_outbreak_pattern(
            &self,
            _snapshot: &NetworkStatus,
        ) -> anyhow::Result<serde_json::Value> {
            anyhow::bail!("quantum backend offline")
        }
    }

    #[tokio::test]
    async fn collaborator_failure_is_non_fatal() {
        let trigger = EscalationTrigger::new(Arc::new(FailingService), Duration::from_secs(1));
        let report = trigger.fire("Dharavi", 0.9, &empty_snapshot()).await;
        assert_eq!(report.priority, EscalationPriority::Critical);
        assert!(report.analysis.is_none());
        assert_eq!(report.error.as_deref(), Some("quantum backend offline"));
    }

    struct HangingService;

    #[async_trait]
    impl QuantumAnalysis for HangingService {
        async fn detect_outbreak_pattern(
            &self,
            _snapshot: &NetworkStatus,
        ) -> anyhow::Result<serde_json::Value> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(serde_json::Value::Null)
        }
    }

    #[tokio::test]
    async fn collaborator_timeout_maps_to_error_field() {
        let trigger =
            EscalationTrigger::new(Arc::new(HangingService), Duration::from_millis(10));
        let report = trigger.fire("Kalyan", 0.5, &empty_snapshot()).await;
        assert!(report.analysis.is_none());
        assert!(report.error.as_deref().unwrap().contains("timed out"));
    }
}
