//! DTOs for the link shortening endpoint.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request to shorten a single URL.
#[derive(Debug, Deserialize, Validate)]
pub struct ShortenRequest {
    /// Target URL; must be an absolute HTTP(S) URL.
    #[validate(length(min = 1, max = 2048, message = "URL must be 1-2048 characters"))]
    pub url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortenResponse {
    pub success: bool,
    pub short_url: String,
    pub short_code: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::url_normalizer::MAX_URL_LENGTH;

    #[test]
    fn test_length_validation() {
        assert!(ShortenRequest { url: "https://example.com".to_string() }.validate().is_ok());
        assert!(ShortenRequest { url: String::new() }.validate().is_err());
        assert!(
            ShortenRequest {
                url: format!("https://example.com/{}", "a".repeat(MAX_URL_LENGTH))
            }
            .validate()
            .is_err()
        );
    }

    #[test]
    fn test_response_is_camel_case() {
        let value = serde_json::to_value(ShortenResponse {
            success: true,
            short_url: "http://localhost:3000/abc123".to_string(),
            short_code: "abc123".to_string(),
        })
        .unwrap();

        assert_eq!(value["shortUrl"], "http://localhost:3000/abc123");
        assert_eq!(value["shortCode"], "abc123");
        assert_eq!(value["success"], true);
    }
}
