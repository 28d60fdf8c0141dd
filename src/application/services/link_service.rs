//! Short link creation and resolution.

use std::sync::Arc;

use serde_json::json;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, error, info, warn};
use url::{Origin, Url};

use super::code_resolver::{CodeResolver, DEFAULT_MAX_RETRIES};
use crate::domain::click_event::ClickEvent;
use crate::domain::entities::{Link, NewLink};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::infrastructure::threat_check::ThreatChecker;
use crate::utils::code_generator::{DEFAULT_CODE_LENGTH, is_valid_format};
use crate::utils::url_normalizer::{
    UrlRejection, check_target_security, is_redirect_safe, normalize_url, parse_target_url,
};

/// Tunables for link creation.
#[derive(Debug, Clone)]
pub struct LinkSettings {
    /// Public base URL short links are built on.
    pub base_url: Url,
    pub code_length: usize,
    pub max_retries: usize,
}

impl LinkSettings {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            code_length: DEFAULT_CODE_LENGTH,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

/// A freshly stored link and its public URL.
#[derive(Debug, Clone)]
pub struct CreatedLink {
    pub link: Link,
    pub short_url: String,
}

/// Orchestrates link creation and redirects.
///
/// Creation runs syntax validation, the security screen and the threat check
/// before anything is written. Resolution never waits on click accounting:
/// clicks are handed to the background worker through a bounded channel.
pub struct LinkService<L, T>
where
    L: LinkRepository + ?Sized,
    T: ThreatChecker + ?Sized,
{
    link_repository: Arc<L>,
    threat_checker: Arc<T>,
    code_resolver: CodeResolver<L>,
    click_sender: mpsc::Sender<ClickEvent>,
    settings: LinkSettings,
}

impl<L, T> LinkService<L, T>
where
    L: LinkRepository + ?Sized,
    T: ThreatChecker + ?Sized,
{
    pub fn new(
        link_repository: Arc<L>,
        threat_checker: Arc<T>,
        click_sender: mpsc::Sender<ClickEvent>,
        settings: LinkSettings,
    ) -> Self {
        Self {
            code_resolver: CodeResolver::new(link_repository.clone()),
            link_repository,
            threat_checker,
            click_sender,
            settings,
        }
    }

    /// Validates, screens and stores `long_url` under a new short code.
    ///
    /// `request_origin` is the origin the request was addressed to; a target
    /// on that origin or on the configured base URL is refused as a redirect
    /// loop.
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] for malformed, insecure or flagged URLs
    /// - threat check failures as mapped by `From<ThreatCheckError>`
    /// - [`AppError::Internal`] when code generation or the store fails, or
    ///   when a second insert in a row hits a taken code
    pub async fn create_short_link(
        &self,
        long_url: &str,
        request_origin: Option<Origin>,
    ) -> Result<CreatedLink, AppError> {
        let url = parse_target_url(long_url).map_err(rejection)?;

        let mut own_origins = vec![self.settings.base_url.origin()];
        own_origins.extend(request_origin);
        check_target_security(&url, &own_origins).map_err(rejection)?;

        let normalized = normalize_url(url).map_err(rejection)?;

        let verdict = self.threat_checker.check_url(&normalized).await?;
        if !verdict.is_safe {
            warn!("Refusing to shorten flagged URL {}", normalized);
            return Err(AppError::bad_request(
                "URL flagged as unsafe",
                json!({ "reason": "UNSAFE_URL", "url": normalized, "threats": verdict.threats }),
            ));
        }

        let link = match self.store(&normalized).await {
            Err(e) if e.is_conflict() => {
                warn!("Short code taken at insert time, retrying once");
                self.store(&normalized).await.map_err(|e| {
                    if e.is_conflict() {
                        error!("Short code insert conflicted twice for {}", normalized);
                        AppError::internal(
                            "Failed to store short link",
                            json!({ "reason": "Repeated short code conflict" }),
                        )
                    } else {
                        e
                    }
                })?
            }
            other => other?,
        };

        info!("Created short link {} -> {}", link.short_code, link.long_url);

        Ok(CreatedLink {
            short_url: self.short_url(&link.short_code),
            link,
        })
    }

    /// Looks up the redirect target for `code` and records the click.
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] if `code` is malformed
    /// - [`AppError::NotFound`] if no link has that code
    /// - [`AppError::Internal`] on store errors or a corrupt stored URL
    pub async fn resolve(&self, code: &str) -> Result<String, AppError> {
        if !is_valid_format(code) {
            return Err(AppError::bad_request(
                "Invalid short code format",
                json!({ "code": code }),
            ));
        }

        let link = self
            .link_repository
            .find_by_code(code)
            .await?
            .ok_or_else(|| AppError::not_found("Short link not found", json!({ "code": code })))?;

        if !is_redirect_safe(&link.long_url) {
            error!("Stored URL for {} is not a valid redirect target", code);
            return Err(AppError::internal(
                "Stored URL is invalid",
                json!({ "code": code }),
            ));
        }

        self.enqueue_click(code);

        Ok(link.long_url)
    }

    /// Public URL for a short code.
    pub fn short_url(&self, code: &str) -> String {
        format!(
            "{}/{}",
            self.settings.base_url.as_str().trim_end_matches('/'),
            code
        )
    }

    async fn store(&self, long_url: &str) -> Result<Link, AppError> {
        let unique = self
            .code_resolver
            .generate_unique_code(self.settings.code_length, self.settings.max_retries)
            .await?;

        self.link_repository
            .insert(NewLink {
                short_code: unique.code,
                long_url: long_url.to_string(),
            })
            .await
    }

    fn enqueue_click(&self, code: &str) {
        match self.click_sender.try_send(ClickEvent::new(code)) {
            Ok(()) => debug!("Click queued for {}", code),
            Err(TrySendError::Full(event)) => {
                metrics::counter!("clicks_dropped_total").increment(1);
                warn!("Click queue full, dropping click for {}", event.short_code);
            }
            Err(TrySendError::Closed(event)) => {
                metrics::counter!("clicks_dropped_total").increment(1);
                error!("Click queue closed, dropping click for {}", event.short_code);
            }
        }
    }
}

fn rejection(e: UrlRejection) -> AppError {
    AppError::bad_request(e.to_string(), json!({ "url_error": url_error_code(&e) }))
}

fn url_error_code(e: &UrlRejection) -> &'static str {
    match e {
        UrlRejection::Empty => "EMPTY_URL",
        UrlRejection::TooLong(_) => "URL_TOO_LONG",
        UrlRejection::InvalidFormat(_) => "INVALID_URL_FORMAT",
        UrlRejection::BlockedScheme(_) => "BLOCKED_SCHEME",
        UrlRejection::UnsupportedProtocol => "UNSUPPORTED_PROTOCOL",
        UrlRejection::MissingHost => "MISSING_HOST",
        UrlRejection::SelfReferential => "SELF_REFERENTIAL",
    }
}
