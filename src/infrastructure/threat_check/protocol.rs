//! Safe Browsing v4 `threatMatches:find` wire format and verdict mapping.

use std::sync::LazyLock;

use chrono::{DateTime, TimeDelta, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::entities::{ThreatDetectionResult, ThreatInfo};

/// Threat categories requested for every URL.
pub const THREAT_TYPES: &[&str] = &["MALWARE", "SOCIAL_ENGINEERING", "UNWANTED_SOFTWARE"];
pub const PLATFORM_TYPES: &[&str] = &["ANY_PLATFORM"];
pub const THREAT_ENTRY_TYPES: &[&str] = &["URL"];

/// Cache lifetime applied when a match carries an unreadable duration.
pub const FALLBACK_CACHE_DURATION: TimeDelta = TimeDelta::hours(1);

static CACHE_DURATION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)s$").expect("valid cache duration regex"));

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FindThreatMatchesRequest<'a> {
    pub client: ClientInfo<'a>,
    pub threat_info: ThreatInfoRequest<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfo<'a> {
    pub client_id: &'a str,
    pub client_version: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreatInfoRequest<'a> {
    pub threat_types: &'a [&'a str],
    pub platform_types: &'a [&'a str],
    pub threat_entry_types: &'a [&'a str],
    pub threat_entries: Vec<ThreatEntry<'a>>,
}

#[derive(Debug, Serialize)]
pub struct ThreatEntry<'a> {
    pub url: &'a str,
}

impl<'a> FindThreatMatchesRequest<'a> {
    /// Builds the request body for a batch of sanitized URLs.
    pub fn new(client_id: &'a str, client_version: &'a str, urls: &'a [String]) -> Self {
        Self {
            client: ClientInfo {
                client_id,
                client_version,
            },
            threat_info: ThreatInfoRequest {
                threat_types: THREAT_TYPES,
                platform_types: PLATFORM_TYPES,
                threat_entry_types: THREAT_ENTRY_TYPES,
                threat_entries: urls
                    .iter()
                    .map(|url| ThreatEntry { url })
                    .collect(),
            },
        }
    }
}

/// Upstream response; an empty object means no matches.
#[derive(Debug, Default, Deserialize)]
pub struct FindThreatMatchesResponse {
    #[serde(default)]
    pub matches: Vec<ThreatMatch>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreatMatch {
    pub threat_type: String,
    #[serde(default)]
    pub platform_type: String,
    pub threat: MatchedEntry,
    #[serde(default)]
    pub cache_duration: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MatchedEntry {
    #[serde(default)]
    pub url: String,
}

/// Human-readable description of a threat type.
pub fn describe_threat(threat_type: &str) -> &'static str {
    match threat_type {
        "MALWARE" => "Malware: the site may install harmful software on your device",
        "SOCIAL_ENGINEERING" => {
            "Social engineering: the site may trick you into revealing personal information"
        }
        "UNWANTED_SOFTWARE" => "Unwanted software: the site may install deceptive or unwanted programs",
        "POTENTIALLY_HARMFUL_APPLICATION" => {
            "Potentially harmful application: the site may distribute harmful mobile apps"
        }
        "THREAT_TYPE_UNSPECIFIED" => "Unspecified threat type",
        _ => "Unknown threat type",
    }
}

/// Parses a protobuf-style duration such as `"300s"`.
///
/// Anything else yields [`FALLBACK_CACHE_DURATION`].
pub fn parse_cache_duration(raw: &str) -> TimeDelta {
    CACHE_DURATION_REGEX
        .captures(raw.trim())
        .and_then(|caps| caps[1].parse::<i64>().ok())
        .and_then(TimeDelta::try_seconds)
        .unwrap_or(FALLBACK_CACHE_DURATION)
}

/// Builds the verdict for `url` from the matches returned upstream.
///
/// Only matches whose URL equals `url` exactly are attributed to it.
pub fn verdict_for(
    url: &str,
    matches: &[ThreatMatch],
    checked_at: DateTime<Utc>,
) -> ThreatDetectionResult {
    let hits: Vec<&ThreatMatch> = matches.iter().filter(|m| m.threat.url == url).collect();

    let threats = hits
        .iter()
        .map(|m| ThreatInfo {
            threat_type: m.threat_type.clone(),
            platform: m.platform_type.clone(),
            description: describe_threat(&m.threat_type).to_string(),
        })
        .collect::<Vec<_>>();

    let cache_expires_at = hits
        .iter()
        .find_map(|m| m.cache_duration.as_deref())
        .map(|raw| checked_at + parse_cache_duration(raw));

    ThreatDetectionResult {
        url: url.to_string(),
        is_safe: threats.is_empty(),
        threats,
        checked_at,
        cache_expires_at,
    }
}
