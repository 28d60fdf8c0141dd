//! Core domain entities representing the business data model.
//!
//! # Entity Types
//!
//! - [`Link`] - A shortened URL mapping (persisted)
//! - [`ThreatDetectionResult`] - A threat check verdict (transient)
//!
//! `NewLink` is the creation input for [`Link`].

pub mod link;
pub mod threat;

pub use link::{Link, NewLink};
pub use threat::{ThreatDetectionResult, ThreatInfo};
