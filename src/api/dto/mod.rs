//! Data Transfer Objects for API requests and responses.
//!
//! JSON field names are camelCase; request bodies are checked with
//! `validator` where a declarative rule fits.

pub mod health;
pub mod shorten;
pub mod threat_check;
