//! Bridge from the server's SSE stream into the command table.

use wasm_bindgen::prelude::Closure;
use wasm_bindgen::JsCast;

use mlpanel_core::models::PanelEvent;

use crate::state::CommandRegistry;

/// Open EventSource plus its message closure; dropping it closes the stream.
pub struct EventBridge {
    source: web_sys::EventSource,
    _onmessage: Closure<dyn FnMut(web_sys::MessageEvent)>,
}

impl EventBridge {
    pub fn connect(url: &str, commands: CommandRegistry) -> Result<Self, String> {
        let source = web_sys::EventSource::new(url)
            .map_err(|_| format!("EventSource failed for {}", url))?;

        let onmessage =
            Closure::<dyn FnMut(web_sys::MessageEvent)>::new(move |e: web_sys::MessageEvent| {
                let Some(data) = e.data().as_string() else {
                    return;
                };
                match serde_json::from_str::<PanelEvent>(&data) {
                    Ok(event) => {
                        log::debug!("panel event '{}'", event.name);
                        commands.dispatch(&event);
                    }
                    Err(e) => log::warn!("undecodable panel event: {}", e),
                }
            });
        source.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));

        Ok(Self {
            source,
            _onmessage: onmessage,
        })
    }
}

impl Drop for EventBridge {
    fn drop(&mut self) {
        self.source.close();
    }
}
