//! HTTP API module.
//!
//! This module provides the HTTP server and API types for the Sendtrack job server.

pub mod server;
pub mod types;

pub use server::{router, serve, start_server, AppState};
pub use types::*;
