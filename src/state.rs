use std::sync::Arc;

use tokio::sync::mpsc;
use url::Url;

use crate::application::services::{LinkService, LinkSettings};
use crate::domain::click_event::ClickEvent;
use crate::domain::repositories::LinkRepository;
use crate::infrastructure::cache::ThreatCache;
use crate::infrastructure::threat_check::ThreatChecker;

/// Shared state injected into every handler.
///
/// Holds the single threat checker instance of the process, so the circuit
/// breaker and request budget are shared by all requests.
#[derive(Clone)]
pub struct AppState {
    pub link_service: Arc<LinkService<dyn LinkRepository, dyn ThreatChecker>>,
    pub link_repository: Arc<dyn LinkRepository>,
    pub threat_checker: Arc<dyn ThreatChecker>,
    pub threat_cache: Arc<dyn ThreatCache>,
    pub click_sender: mpsc::Sender<ClickEvent>,
    pub base_url: Url,
    /// Trust `X-Forwarded-*` headers when working out the request origin.
    pub behind_proxy: bool,
}

impl AppState {
    pub fn new(
        link_repository: Arc<dyn LinkRepository>,
        threat_checker: Arc<dyn ThreatChecker>,
        threat_cache: Arc<dyn ThreatCache>,
        click_sender: mpsc::Sender<ClickEvent>,
        settings: LinkSettings,
        behind_proxy: bool,
    ) -> Self {
        let base_url = settings.base_url.clone();
        let link_service = Arc::new(LinkService::new(
            link_repository.clone(),
            threat_checker.clone(),
            click_sender.clone(),
            settings,
        ));

        Self {
            link_service,
            link_repository,
            threat_checker,
            threat_cache,
            click_sender,
            base_url,
            behind_proxy,
        }
    }
}
