//! WeRead Pacer Library
//!
//! Accumulates reading time on WeRead by replaying a captured browser session
//! in paced, signed read requests. Expired sessions are renewed in place and
//! the run ends with a push through one of several notification channels.

pub mod app;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;

// Re-export commonly used types for convenience
pub use errors::{AppError, Result};
