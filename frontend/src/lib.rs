//! Sendtrack - Frontend Rust/Leptos Application
//!
//! A WebAssembly frontend for picking companies, starting a bulk
//! application mailing and following it live.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        App                                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Header                                                      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  MainContent                                                 │
//! │  ├── RecipientPicker (select companies, start job)          │
//! │  └── ProgressSection (overlay fed by ProgressStreamClient)  │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Footer                                                      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`types`] - Common types (LogEntry, Recipient, etc.)
//! - [`progress`] - Progress stream client and its seams
//! - [`components`] - UI components
//! - [`services`] - Browser implementations of the seams and HTTP calls

use leptos::*;
use leptos_meta::*;
use leptos_router::*;
use wasm_bindgen::prelude::*;

// =============================================================================
// Module declarations
// =============================================================================

pub mod config;
pub mod types;
pub mod progress;
pub mod components;
pub mod services;

// =============================================================================
// Re-exports
// =============================================================================

// Configuration
pub use config::*;

// Types
pub use types::{
    // Logs
    LogEntry, LogLevel,
    // API
    Recipient, BulkEmailRequest, JobStartResponse, CancelRequest,
    // Errors
    AppError, AppResult,
};

// Progress client
pub use progress::{ClientConfig, ClientSnapshot, ProgressEvent, ProgressStreamClient, ProgressView};

// Components
pub use components::*;

// Services
pub use services::*;

// =============================================================================
// Application Entry Point
// =============================================================================

/// WASM entry point - called automatically by trunk.
#[wasm_bindgen(start)]
pub fn main() {
    // Setup panic hook for better error messages
    console_error_panic_hook::set_once();

    // Setup console logging
    _ = console_log::init_with_level(log::Level::Debug);

    log::info!("🦀 Sendtrack - Starting Leptos App");

    // Mount the application
    mount_to_body(|| view! { <App/> });
}

#[component]
pub fn App() -> impl IntoView {
    provide_meta_context();

    view! {
        <Title text="Sendtrack"/>
        <Router>
            <main>
                <Routes>
                    <Route path="/" view=MainContent/>
                </Routes>
            </main>
        </Router>
    }
}

#[component]
fn MainContent() -> impl IntoView {
    let surface = SignalSurface::new();
    let client = ProgressStreamClient::new(
        ClientConfig::default(),
        EventSourceTransport,
        HttpCancelRequester,
        TimeoutScheduler,
        surface,
    );

    // Release the stream when the view goes away
    on_cleanup({
        let client = client.clone();
        move || client.hide()
    });

    view! {
        <Header/>

        <div class="container">
            <RecipientPicker client=client.clone()/>
            <ProgressSection client=client surface=surface/>
        </div>

        <Footer/>
    }
}
