//! Application layer services implementing business logic.
//!
//! Services consume the repository and threat checker traits and give HTTP
//! handlers a small API.
//!
//! - [`services::code_resolver::CodeResolver`] - collision-checked short code allocation
//! - [`services::link_service::LinkService`] - link creation and resolution

pub mod services;
