//! Domain layer containing business entities and logic.
//!
//! # Architecture
//!
//! - [`entities`] - Core business data structures
//! - [`repositories`] - Data access trait definitions
//! - [`click_event`] - Click counting event model
//! - [`click_worker`] - Asynchronous click counter worker
//!
//! # Click Processing Flow
//!
//! 1. Redirect handler resolves the short code
//! 2. A [`click_event::ClickEvent`] is offered to a bounded channel (non-blocking)
//! 3. [`click_worker::run_click_worker`] applies the atomic increment with retries
//! 4. The redirect response never waits for step 3

pub mod click_event;
pub mod click_worker;
pub mod entities;
pub mod repositories;
