//! Middleware for the Baufi API
//!
//! Request tracing, panic recovery and CORS configuration.

mod cors;
mod recovery;
mod tracing;

pub use self::cors::configure_cors;
pub use self::recovery::handle_panic;
pub use self::tracing::request_tracing;
