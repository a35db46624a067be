//! Command-line interface components
//!
//! This module contains CLI-specific code for WeRead Pacer: argument parsing
//! and the command handlers.

pub mod args;
pub mod commands;

pub use args::{Cli, Commands, GlobalArgs, NotifyArgs, RunArgs, SignArgs, StatusArg};
pub use commands::{handle_notify, handle_run, handle_sign};
