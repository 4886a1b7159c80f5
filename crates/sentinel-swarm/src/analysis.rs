//! Symptom scoring: pure, deterministic, order-invariant

use serde::{Deserialize, Serialize};

/// Symptoms that on their own indicate a potential outbreak (weight 1.0).
pub const HIGH_RISK_SYMPTOMS: &[&str] = &[
    "fever",
    "vomiting",
    "diarrhea",
    "rash",
    "breathing difficulty",
    "body pain",
    "fatigue",
    "nausea",
    "cough",
];

/// Symptoms that contribute at half weight (0.5).
pub const MEDIUM_RISK_SYMPTOMS: &[&str] = &[
    "headache",
    "chills",
    "sore throat",
    "dizziness",
    "loss of appetite",
    "muscle ache",
];

/// What the analysis suggests the agent do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    EscalateToNeighbors,
    ContinueMonitoring,
}

/// Result of scoring one symptom report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymptomAnalysis {
    pub anomaly_detected: bool,
    /// Weighted score in [0, 1], rounded to two decimals
    pub anomaly_score: f64,
    /// High-risk tokens found, normalized
    pub high_risk_symptoms: Vec<String>,
    pub total_symptoms: usize,
    pub history_count: usize,
    pub recommendation: Recommendation,
}

/// Score a symptom report against the two risk label sets.
///
/// Tokens are trimmed and case-folded. The score is
/// `(high·1.0 + medium·0.5) / max(total, 1)`, rounded to two decimals;
/// a report is anomalous when the rounded score reaches 0.5. Idempotent and
/// invariant under reordering of the input.
pub fn analyze_symptoms(symptoms: &[String], history_count: usize) -> SymptomAnalysis {
    let normalized: Vec<String> = symptoms.iter().map(|s| s.trim().to_lowercase()).collect();

    let high_risk: Vec<String> = normalized
        .iter()
        .filter(|s| HIGH_RISK_SYMPTOMS.contains(&s.as_str()))
        .cloned()
        .collect();
    let medium_count = normalized
        .iter()
        .filter(|s| MEDIUM_RISK_SYMPTOMS.contains(&s.as_str()))
        .count();

    let weighted = high_risk.len() as f64 + medium_count as f64 * 0.5;
    let raw = weighted / symptoms.len().max(1) as f64;
    let anomaly_score = (raw * 100.0).round() / 100.0;
    let anomaly_detected = anomaly_score >= 0.5;

    SymptomAnalysis {
        anomaly_detected,
        anomaly_score,
        high_risk_symptoms: high_risk,
        total_symptoms: symptoms.len(),
        history_count,
        recommendation: if anomaly_detected {
            Recommendation::EscalateToNeighbors
        } else {
            Recommendation::ContinueMonitoring
        },
    }
}
