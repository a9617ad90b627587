//! Progress stream over a browser `EventSource`.

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Event, EventSource, MessageEvent};

use crate::progress::{StreamHandle, StreamSink, StreamTransport};
use crate::types::{AppError, AppResult};

/// Opens one `EventSource` per subscription.
#[derive(Clone, Copy, Debug, Default)]
pub struct EventSourceTransport;

struct Handlers {
    _on_open: Closure<dyn FnMut(Event)>,
    _on_message: Closure<dyn FnMut(MessageEvent)>,
    _on_error: Closure<dyn FnMut(Event)>,
}

/// Owns the `EventSource` and the JS closures bound to it.
pub struct EventSourceHandle {
    source: EventSource,
    handlers: Option<Handlers>,
}

impl StreamTransport for EventSourceTransport {
    fn open(&self, url: &str, sink: StreamSink) -> AppResult<Box<dyn StreamHandle>> {
        let source = EventSource::new(url)
            .map_err(|e| AppError::Stream(format!("{:?}", e)))?;

        let open_sink = sink.clone();
        let on_open = Closure::wrap(Box::new(move |_: Event| {
            log::info!("📡 SSE connected to progress stream");
            open_sink.opened();
        }) as Box<dyn FnMut(Event)>);

        let message_sink = sink.clone();
        let on_message = Closure::wrap(Box::new(move |event: MessageEvent| {
            if let Some(data) = event.data().as_string() {
                message_sink.message(&data);
            }
        }) as Box<dyn FnMut(MessageEvent)>);

        let on_error = Closure::wrap(Box::new(move |_: Event| {
            sink.error();
        }) as Box<dyn FnMut(Event)>);

        source.set_onopen(Some(on_open.as_ref().unchecked_ref()));
        source.set_onmessage(Some(on_message.as_ref().unchecked_ref()));
        source.set_onerror(Some(on_error.as_ref().unchecked_ref()));

        Ok(Box::new(EventSourceHandle {
            source,
            handlers: Some(Handlers {
                _on_open: on_open,
                _on_message: on_message,
                _on_error: on_error,
            }),
        }))
    }
}

impl StreamHandle for EventSourceHandle {
    fn close(&mut self) {
        let Some(handlers) = self.handlers.take() else {
            return;
        };
        self.source.set_onopen(None);
        self.source.set_onmessage(None);
        self.source.set_onerror(None);
        self.source.close();
        log::debug!("📡 Progress stream closed");

        // Closing usually happens inside one of these handlers, so they
        // must outlive the current JS call.
        wasm_bindgen_futures::spawn_local(async move {
            drop(handlers);
        });
    }
}

impl Drop for EventSourceHandle {
    fn drop(&mut self) {
        self.close();
    }
}
