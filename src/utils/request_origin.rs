//! Origin extraction from HTTP request headers.

use axum::http::{HeaderMap, header};
use url::{Origin, Url};

const X_FORWARDED_HOST: &str = "x-forwarded-host";
const X_FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Determines the origin (scheme, host, port) the client used to reach us.
///
/// The host comes from the `Host` header. When `trust_forwarded` is set the
/// `X-Forwarded-Host` and `X-Forwarded-Proto` headers take precedence, since a
/// reverse proxy rewrites `Host`. Without a forwarded scheme, `default_scheme`
/// (the scheme of the configured public base URL) is used.
///
/// Returns `None` when no usable host header is present.
///
/// # Examples
///
/// ```ignore
/// let mut headers = HeaderMap::new();
/// headers.insert(header::HOST, "s.example.com".parse().unwrap());
///
/// let origin = request_origin(&headers, "https", false).unwrap();
/// assert_eq!(origin.ascii_serialization(), "https://s.example.com");
/// ```
pub fn request_origin(
    headers: &HeaderMap,
    default_scheme: &str,
    trust_forwarded: bool,
) -> Option<Origin> {
    let forwarded = |name| {
        if trust_forwarded {
            first_value(headers, name)
        } else {
            None
        }
    };

    let host = forwarded(X_FORWARDED_HOST).or_else(|| {
        headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|h| !h.is_empty())
    })?;

    let scheme = forwarded(X_FORWARDED_PROTO).unwrap_or(default_scheme);

    let url = Url::parse(&format!("{}://{}", scheme.to_ascii_lowercase(), host)).ok()?;
    match url.origin() {
        origin @ Origin::Tuple(..) => Some(origin),
        Origin::Opaque(_) => None,
    }
}

/// First entry of a possibly comma-separated header value.
fn first_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}
