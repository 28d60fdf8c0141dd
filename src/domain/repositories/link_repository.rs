//! Repository trait for short link data access.

use crate::domain::entities::{Link, NewLink};
use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface for the link store.
///
/// The store's primary key on `short_code` is the authority on uniqueness;
/// [`LinkRepository::exists`] is only a pre-check that saves a wasted insert.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgLinkRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Returns whether a link with this exact code exists.
    ///
    /// An absent row is `Ok(false)`, never an error.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn exists(&self, short_code: &str) -> Result<bool, AppError>;

    /// Inserts a new link.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the short code is already taken.
    /// Returns [`AppError::Internal`] on database errors.
    async fn insert(&self, new_link: NewLink) -> Result<Link, AppError>;

    /// Finds a link by its short code.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_by_code(&self, short_code: &str) -> Result<Option<Link>, AppError>;

    /// Atomically adds one to the link's click counter.
    ///
    /// Returns `Ok(false)` if no link has this code.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn increment_click_count(&self, short_code: &str) -> Result<bool, AppError>;

    /// Checks that the store is reachable.
    async fn health_check(&self) -> bool;
}
