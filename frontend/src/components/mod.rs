//! UI Components for the Sendtrack application.
//!
//! # Layout Components
//! - [`Header`] - Top bar
//! - [`Footer`] - Page footer
//!
//! # Feature Components
//! - [`RecipientPicker`] - Company selection and job start
//! - [`ProgressSection`] - Live send progress with log and cancel button

mod header;
mod recipients;
mod progress;
mod footer;

pub use header::*;
pub use recipients::*;
pub use progress::*;
pub use footer::*;
