//! HTTP middleware: per-IP throttling and request tracing.

pub mod rate_limit;
pub mod tracing;
