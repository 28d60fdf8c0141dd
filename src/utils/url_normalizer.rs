//! Target URL validation, security screening and normalization.
//!
//! A submitted URL goes through three stages before it can be shortened:
//!
//! 1. [`parse_target_url`] - syntax (non-empty, bounded length, absolute URL)
//! 2. [`check_target_security`] - scheme blocklist, HTTP(S) only, no redirect loops
//! 3. [`normalize_url`] - canonical form that gets persisted

use url::{Origin, Url};

/// Longest URL accepted for shortening.
pub const MAX_URL_LENGTH: usize = 2048;

/// Schemes rejected outright as dangerous redirect targets.
pub const BLOCKED_SCHEMES: &[&str] = &["javascript", "data", "vbscript", "file", "ftp"];

/// Reasons a target URL is refused.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum UrlRejection {
    #[error("URL must not be empty")]
    Empty,

    #[error("URL is too long ({0} characters, max {MAX_URL_LENGTH})")]
    TooLong(usize),

    #[error("Invalid URL format: {0}")]
    InvalidFormat(String),

    #[error("URL scheme '{0}:' is not allowed")]
    BlockedScheme(String),

    #[error("Only HTTP and HTTPS protocols are allowed")]
    UnsupportedProtocol,

    #[error("URL must contain a host")]
    MissingHost,

    #[error("URL points back to this service")]
    SelfReferential,
}

/// Parses a user-submitted URL.
///
/// Only checks that the input is a syntactically valid absolute URL; scheme
/// policy is applied later by [`check_target_security`].
///
/// # Errors
///
/// Returns [`UrlRejection::Empty`], [`UrlRejection::TooLong`] or
/// [`UrlRejection::InvalidFormat`].
pub fn parse_target_url(input: &str) -> Result<Url, UrlRejection> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlRejection::Empty);
    }

    if trimmed.len() > MAX_URL_LENGTH {
        return Err(UrlRejection::TooLong(trimmed.len()));
    }

    Url::parse(trimmed).map_err(|e| UrlRejection::InvalidFormat(e.to_string()))
}

/// Screens a parsed URL before it is sent to the threat check.
///
/// Rejects blocklisted schemes, anything that is not HTTP(S), URLs without a
/// host and URLs whose origin matches one of `own_origins` (the service
/// itself, which would create a redirect loop).
///
/// # Errors
///
/// Returns the first [`UrlRejection`] that applies.
pub fn check_target_security(url: &Url, own_origins: &[Origin]) -> Result<(), UrlRejection> {
    let scheme = url.scheme();

    if BLOCKED_SCHEMES.contains(&scheme) {
        return Err(UrlRejection::BlockedScheme(scheme.to_string()));
    }

    if scheme != "http" && scheme != "https" {
        return Err(UrlRejection::UnsupportedProtocol);
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(UrlRejection::MissingHost);
    }

    let origin = url.origin();
    if own_origins.iter().any(|own| *own == origin) {
        return Err(UrlRejection::SelfReferential);
    }

    Ok(())
}

/// Normalizes a URL to the canonical form that is stored.
///
/// # Normalization Rules
///
/// 1. **Hostname**: Converted to lowercase
/// 2. **Default ports**: Removed (80 for HTTP, 443 for HTTPS)
/// 3. **Fragments**: Removed (e.g., `#section`)
/// 4. **Query and path**: Preserved as-is
///
/// # Errors
///
/// Returns [`UrlRejection::UnsupportedProtocol`] for non-HTTP(S) schemes and
/// [`UrlRejection::InvalidFormat`] if the host cannot be rewritten.
pub fn normalize_url(mut url: Url) -> Result<String, UrlRejection> {
    match url.scheme() {
        "http" | "https" => {}
        _ => return Err(UrlRejection::UnsupportedProtocol),
    }

    if let Some(host) = url.host_str() {
        let host_lowercase = host.to_ascii_lowercase();
        url.set_host(Some(&host_lowercase))
            .map_err(|e| UrlRejection::InvalidFormat(e.to_string()))?;
    }

    url.set_fragment(None);

    let is_default_port = matches!(
        (url.scheme(), url.port()),
        ("http", Some(80)) | ("https", Some(443))
    );
    if is_default_port {
        url.set_port(None)
            .map_err(|_| UrlRejection::InvalidFormat("cannot drop default port".to_string()))?;
    }

    Ok(url.to_string())
}

/// Returns true if a stored URL is still a well-formed HTTP(S) redirect target.
pub fn is_redirect_safe(stored: &str) -> bool {
    match Url::parse(stored) {
        Ok(url) => {
            matches!(url.scheme(), "http" | "https")
                && url.host_str().is_some_and(|h| !h.is_empty())
        }
        Err(_) => false,
    }
}
