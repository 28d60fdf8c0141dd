//! Utility functions for code generation, URL processing, and request handling.
//!
//! This module provides helper functions used across the application:
//!
//! - [`code_generator`] - Short code generation and format validation
//! - [`url_normalizer`] - URL validation, security screening and normalization
//! - [`request_origin`] - Origin extraction from HTTP headers

pub mod code_generator;
pub mod request_origin;
pub mod url_normalizer;
