//! Progress overlay: fill bar, percentage, detail line and the run log.

use leptos::*;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::progress::{ProgressStreamClient, ProgressSurface};
use crate::types::LogEntry;

/// Request animation frame helper for smooth scrolling
fn request_animation_frame(f: impl FnOnce() + 'static) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let closure = Closure::once(f);
    if window
        .request_animation_frame(closure.as_ref().unchecked_ref())
        .is_ok()
    {
        closure.forget();
    }
}

/// [`ProgressSurface`] backed by reactive signals.
#[derive(Clone, Copy)]
pub struct SignalSurface {
    pub visible: RwSignal<bool>,
    pub fill: RwSignal<u32>,
    pub label: RwSignal<String>,
    pub detail: RwSignal<String>,
    pub logs: RwSignal<Vec<LogEntry>>,
}

impl SignalSurface {
    pub fn new() -> Self {
        Self {
            visible: create_rw_signal(false),
            fill: create_rw_signal(0),
            label: create_rw_signal("0%".to_string()),
            detail: create_rw_signal(String::new()),
            logs: create_rw_signal(Vec::new()),
        }
    }
}

impl Default for SignalSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSurface for SignalSurface {
    fn set_visible(&self, visible: bool) {
        self.visible.set(visible);
    }

    fn set_fill(&self, percent: u32) {
        self.fill.set(percent);
    }

    fn set_percentage_label(&self, text: &str) {
        self.label.set(text.to_string());
    }

    fn set_detail(&self, text: &str) {
        self.detail.set(text.to_string());
    }

    fn clear_log(&self) {
        self.logs.set(Vec::new());
    }

    fn append_log(&self, entry: &LogEntry) {
        self.logs.update(|logs| logs.push(entry.clone()));
    }
}

#[component]
pub fn ProgressSection(client: ProgressStreamClient, surface: SignalSurface) -> impl IntoView {
    // Reference to the logs content div for auto-scroll
    let logs_container = create_node_ref::<leptos::html::Div>();

    create_effect(move |_| {
        // Track logs changes
        surface.logs.with(|_| ());

        if let Some(container) = logs_container.get() {
            request_animation_frame(move || {
                container.set_scroll_top(container.scroll_height());
            });
        }
    });

    let on_cancel = move |_| client.cancel();

    view! {
        <div class="progress-overlay" class:show=move || surface.visible.get()></div>
        <div class="progress-container" class:show=move || surface.visible.get()>
            <div class="progress-header">
                <span class="progress-title">"📨 Sending applications"</span>
                <span class="progress-percentage">{move || surface.label.get()}</span>
            </div>
            <div class="progress-bar">
                <div
                    class="progress-fill"
                    style:width=move || format!("{}%", surface.fill.get())
                ></div>
            </div>
            <div class="progress-details">{move || surface.detail.get()}</div>
            <div class="logs" node_ref=logs_container>
                <For
                    each=move || surface.logs.get().into_iter().enumerate()
                    key=|(idx, _)| *idx
                    children=move |(_, entry)| {
                        view! {
                            <div class=entry.level.css_class()>
                                <span class="log-time">"[" {entry.timestamp} "] "</span>
                                {entry.message}
                            </div>
                        }
                    }
                />
            </div>
            <button class="cancel-button" on:click=on_cancel>
                "Cancel"
            </button>
        </div>
    }
}
