//! Click event model for asynchronous click counting.

use chrono::{DateTime, Utc};

/// A visit to a short link, queued for the background click worker.
///
/// Link resolution hands these to a bounded channel with `try_send` so the
/// redirect never waits on the counter write.
#[derive(Debug, Clone)]
pub struct ClickEvent {
    pub short_code: String,
    pub clicked_at: DateTime<Utc>,
}

impl ClickEvent {
    /// Creates a click event stamped with the current time.
    pub fn new(short_code: impl Into<String>) -> Self {
        Self {
            short_code: short_code.into(),
            clicked_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_click_event_creation() {
        let before = Utc::now();
        let event = ClickEvent::new("abc123");

        assert_eq!(event.short_code, "abc123");
        assert!(event.clicked_at >= before);
    }
}
