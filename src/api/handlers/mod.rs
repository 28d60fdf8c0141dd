//! HTTP request handlers, one module per endpoint.

pub mod health;
pub mod redirect;
pub mod shorten;
pub mod threat_check;

pub use health::health_handler;
pub use redirect::redirect_handler;
pub use shorten::shorten_handler;
pub use threat_check::threat_check_handler;
