//! Collision-checked short code allocation.

use std::ops::RangeInclusive;
use std::sync::Arc;

use serde_json::json;
use tracing::{debug, warn};

use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::utils::code_generator::{CODE_LENGTH_RANGE, CodeGeneratorError, generate_code};

/// Accepted values for the attempt budget.
pub const MAX_RETRIES_RANGE: RangeInclusive<usize> = 1..=100;

pub const DEFAULT_MAX_RETRIES: usize = 10;

/// A code that was free in the store when it was checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueCode {
    pub code: String,
    /// Generation attempts spent, including the successful one.
    pub attempts: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum CodeGenerationError {
    #[error("Invalid code generation settings: {0}")]
    InvalidConfiguration(String),

    #[error("No unique short code found after {attempts} attempts (last collision: {last_collision})")]
    Exhausted {
        attempts: usize,
        last_collision: String,
    },

    #[error("Link store failed on attempt {attempts}: {source}")]
    Store {
        attempts: usize,
        #[source]
        source: AppError,
    },

    #[error(transparent)]
    Generator(#[from] CodeGeneratorError),
}

impl From<CodeGenerationError> for AppError {
    fn from(e: CodeGenerationError) -> Self {
        match e {
            CodeGenerationError::Store { source, .. } => source,
            CodeGenerationError::Exhausted { attempts, .. } => AppError::internal(
                "Failed to generate unique code",
                json!({ "reason": "Too many collisions", "attempts": attempts }),
            ),
            other => AppError::internal(
                "Failed to generate unique code",
                json!({ "reason": other.to_string() }),
            ),
        }
    }
}

/// Draws random codes until one is absent from the link store.
///
/// The store's primary key stays the final authority: a code reported free
/// here can still lose a race at insert time.
pub struct CodeResolver<L: LinkRepository + ?Sized> {
    repository: Arc<L>,
}

impl<L: LinkRepository + ?Sized> CodeResolver<L> {
    pub fn new(repository: Arc<L>) -> Self {
        Self { repository }
    }

    /// Generates a code of `length` symbols that is not yet taken.
    ///
    /// # Errors
    ///
    /// - [`CodeGenerationError::InvalidConfiguration`] before any attempt when
    ///   `length` or `max_retries` is out of range
    /// - [`CodeGenerationError::Store`] as soon as an existence check fails
    /// - [`CodeGenerationError::Exhausted`] when every attempt collided
    pub async fn generate_unique_code(
        &self,
        length: usize,
        max_retries: usize,
    ) -> Result<UniqueCode, CodeGenerationError> {
        if !CODE_LENGTH_RANGE.contains(&length) {
            return Err(CodeGenerationError::InvalidConfiguration(format!(
                "length must be between 4 and 8, got {length}"
            )));
        }
        if !MAX_RETRIES_RANGE.contains(&max_retries) {
            return Err(CodeGenerationError::InvalidConfiguration(format!(
                "max_retries must be between 1 and 100, got {max_retries}"
            )));
        }

        let mut last_collision = String::new();

        for attempt in 1..=max_retries {
            let code = generate_code(length)?;

            let taken = self
                .repository
                .exists(&code)
                .await
                .map_err(|source| CodeGenerationError::Store {
                    attempts: attempt,
                    source,
                })?;

            if !taken {
                debug!("Allocated short code {} after {} attempt(s)", code, attempt);
                return Ok(UniqueCode {
                    code,
                    attempts: attempt,
                });
            }

            metrics::counter!("short_code_collisions_total").increment(1);
            warn!(
                "Short code collision on attempt {}/{}: {}",
                attempt, max_retries, code
            );
            last_collision = code;
        }

        Err(CodeGenerationError::Exhausted {
            attempts: max_retries,
            last_collision,
        })
    }
}
