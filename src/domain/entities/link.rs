//! Link entity representing a shortened URL mapping.

use chrono::{DateTime, Utc};

/// A persisted short code to target URL mapping.
///
/// `short_code` and `long_url` never change after creation; `click_count` is
/// only ever advanced by the store's atomic increment.
#[derive(Debug, Clone)]
pub struct Link {
    pub short_code: String,
    pub long_url: String,
    pub click_count: i64,
    pub created_at: DateTime<Utc>,
}

impl Link {
    /// Creates a new Link instance.
    pub fn new(
        short_code: String,
        long_url: String,
        click_count: i64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            short_code,
            long_url,
            click_count,
            created_at,
        }
    }
}

/// Input data for creating a new link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLink {
    pub short_code: String,
    pub long_url: String,
}
