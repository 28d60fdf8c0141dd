//! Business logic services for the application layer.

pub mod code_resolver;
pub mod link_service;

pub use code_resolver::{CodeGenerationError, CodeResolver, UniqueCode};
pub use link_service::{CreatedLink, LinkService, LinkSettings};
