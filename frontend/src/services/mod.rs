//! Browser-side services.
//!
//! # Services
//!
//! - [`api`] - HTTP calls to the backend (recipients, job start, cancel)
//! - [`job`] - Job submission flow on top of the progress client
//! - [`stream`] - `EventSource` transport for the progress stream
//! - [`timers`] - `setTimeout` scheduler for delayed hides

pub mod api;
pub mod job;
pub mod stream;
pub mod timers;

pub use api::*;
pub use job::*;
pub use stream::*;
pub use timers::*;
