//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer, providing
//! concrete implementations for data persistence, caching and threat checks.
//!
//! # Modules
//!
//! - [`cache`] - Threat verdict caches (memory, Redis and no-op implementations)
//! - [`persistence`] - PostgreSQL repository implementations
//! - [`threat_check`] - Safe Browsing client with circuit breaker and request budget

pub mod cache;
pub mod persistence;
pub mod threat_check;
