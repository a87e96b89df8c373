//! # atomspace
//!
//! The AtomSpace binary as a library: HTTP API, CLI, configuration and the
//! application error type. `main.rs` only wires logging and dispatch.

pub mod api;
pub mod cli;
pub mod config;
pub mod error;

pub use config::Config;
pub use error::AppError;
