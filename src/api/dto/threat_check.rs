//! DTOs for the batch threat check endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::ThreatDetectionResult;
use crate::infrastructure::threat_check::{CircuitBreakerInfo, RateLimitInfo};

/// `urls` accepts either a single string or an array of strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum UrlList {
    One(String),
    Many(Vec<String>),
}

impl UrlList {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            UrlList::One(url) => vec![url],
            UrlList::Many(urls) => urls,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreatCheckRequest {
    #[serde(default)]
    pub urls: Option<UrlList>,
    /// Caller-chosen identifier echoed back in the metadata.
    #[serde(default)]
    pub client_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreatCheckResponse {
    pub success: bool,
    pub results: Vec<ThreatDetectionResult>,
    pub metadata: ThreatCheckMetadata,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreatCheckMetadata {
    pub total_urls: usize,
    pub safe_urls: usize,
    pub unsafe_urls: usize,
    pub checked_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    pub rate_limit: RateLimitInfo,
    pub circuit_breaker: CircuitBreakerInfo,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_urls_accepts_string_or_array() {
        let one: ThreatCheckRequest =
            serde_json::from_value(json!({ "urls": "https://example.com" })).unwrap();
        assert_eq!(one.urls.unwrap().into_vec(), vec!["https://example.com"]);

        let many: ThreatCheckRequest = serde_json::from_value(json!({
            "urls": ["https://a.test", "https://b.test"],
            "clientId": "scanner"
        }))
        .unwrap();
        assert_eq!(many.urls.unwrap().into_vec().len(), 2);
        assert_eq!(many.client_id.as_deref(), Some("scanner"));
    }

    #[test]
    fn test_missing_urls_is_none() {
        let request: ThreatCheckRequest = serde_json::from_value(json!({})).unwrap();
        assert!(request.urls.is_none());
    }

    #[test]
    fn test_non_string_urls_rejected() {
        assert!(serde_json::from_value::<ThreatCheckRequest>(json!({ "urls": 42 })).is_err());
        assert!(serde_json::from_value::<ThreatCheckRequest>(json!({ "urls": [1, 2] })).is_err());
    }
}
