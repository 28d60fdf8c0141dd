//! Background worker applying click counter increments.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Semaphore, mpsc};
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, error, warn};

use crate::domain::click_event::ClickEvent;
use crate::domain::repositories::LinkRepository;

/// Attempts per event, including the first one.
const MAX_ATTEMPTS: usize = 3;

/// Consumes click events until every sender is dropped.
///
/// Each event becomes one atomic `click_count + 1` update. At most
/// `concurrency` updates run at once; failed updates are retried with
/// exponential backoff and logged once retries are exhausted. Errors never
/// flow back to the redirect that produced the event.
pub async fn run_click_worker<L>(
    mut rx: mpsc::Receiver<ClickEvent>,
    repository: Arc<L>,
    concurrency: usize,
) where
    L: LinkRepository + ?Sized + 'static,
{
    let permits = Arc::new(Semaphore::new(concurrency.max(1)));

    while let Some(event) = rx.recv().await {
        let Ok(permit) = permits.clone().acquire_owned().await else {
            break;
        };
        let repository = repository.clone();

        tokio::spawn(async move {
            record_click(repository.as_ref(), &event).await;
            drop(permit);
        });
    }

    debug!("Click channel closed, worker stopping");
}

/// Applies a single click with retries.
pub async fn record_click<L>(repository: &L, event: &ClickEvent)
where
    L: LinkRepository + ?Sized,
{
    let strategy = ExponentialBackoff::from_millis(10)
        .max_delay(Duration::from_millis(500))
        .map(jitter)
        .take(MAX_ATTEMPTS - 1);

    let result = Retry::start(strategy, move || {
        repository.increment_click_count(&event.short_code)
    })
    .await;

    match result {
        Ok(true) => debug!("Click recorded for {}", event.short_code),
        Ok(false) => warn!("Click for unknown short code {}", event.short_code),
        Err(e) => {
            metrics::counter!("clicks_dropped_total").increment(1);
            error!(
                "Failed to record click for {} after {} attempts: {}",
                event.short_code, MAX_ATTEMPTS, e
            );
        }
    }
}
