//! Threat check verdicts returned by the threat intelligence client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single hazard reported for a URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreatInfo {
    #[serde(rename = "type")]
    pub threat_type: String,
    pub platform: String,
    pub description: String,
}

/// Verdict for one checked URL.
///
/// Not persisted; cached for a bounded time by the threat check client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreatDetectionResult {
    pub url: String,
    pub is_safe: bool,
    pub threats: Vec<ThreatInfo>,
    pub checked_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_expires_at: Option<DateTime<Utc>>,
}

impl ThreatDetectionResult {
    /// A verdict with no threat matches.
    pub fn safe(url: impl Into<String>, checked_at: DateTime<Utc>) -> Self {
        Self {
            url: url.into(),
            is_safe: true,
            threats: Vec::new(),
            checked_at,
            cache_expires_at: None,
        }
    }
}
