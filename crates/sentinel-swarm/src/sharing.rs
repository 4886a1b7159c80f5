//! Anonymized data sharing between neighboring villages
//!
//! Nothing is persisted; a share produces a receipt describing what went to
//! whom. Unknown categories are structured errors.

use crate::error::{SwarmError, SwarmResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Categories of data a village may share with its neighbors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataCategory {
    Symptoms,
    RiskAssessment,
    OutbreakBelief,
    TrendAnalysis,
}

impl FromStr for DataCategory {
    type Err = SwarmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "symptoms" => Ok(DataCategory::Symptoms),
            "risk_assessment" => Ok(DataCategory::RiskAssessment),
            "outbreak_belief" => Ok(DataCategory::OutbreakBelief),
            "trend_analysis" => Ok(DataCategory::TrendAnalysis),
            other => Err(SwarmError::InvalidDataCategory(other.to_string())),
        }
    }
}

/// Confirmation of a completed share.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharingReceipt {
    pub village: String,
    pub category: DataCategory,
    pub payload_bytes: usize,
    pub recipients: Vec<String>,
    pub shared_at: DateTime<Utc>,
}

/// Share an anonymized payload with the given recipients.
pub fn share_data(
    village: &str,
    category: DataCategory,
    payload: &serde_json::Value,
    recipients: Vec<String>,
) -> SharingReceipt {
    SharingReceipt {
        village: village.to_string(),
        category,
        payload_bytes: payload.to_string().len(),
        recipients,
        shared_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn category_parsing() {
        assert_eq!("symptoms".parse::<DataCategory>().unwrap(), DataCategory::Symptoms);
        assert_eq!(
            " Risk_Assessment ".parse::<DataCategory>().unwrap(),
            DataCategory::RiskAssessment
        );
        assert!(matches!(
            "patient_records".parse::<DataCategory>(),
            Err(SwarmError::InvalidDataCategory(_))
        ));
    }

    #[test]
    fn receipt_records_payload_size_and_recipients() {
        let payload = json!({ "belief": 0.4, "trend": "stable" });
        let receipt = share_data(
            "Thane",
            DataCategory::OutbreakBelief,
            &payload,
            vec!["Dharavi".to_string(), "Kalyan".to_string()],
        );
        assert_eq!(receipt.village, "Thane");
        assert_eq!(receipt.payload_bytes, payload.to_string().len());
        assert_eq!(receipt.recipients.len(), 2);
    }
}
