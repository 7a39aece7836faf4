//! Shared panel state: the iframe URL cell and the command table.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use leptos::prelude::*;

use mlpanel_core::models::{PanelEvent, DEFAULT_TRACKING_URI};

/// Command the backend triggers to retarget the panel iframe.
pub const SET_IFRAME_URL: &str = "set_iframe_url";

/// Command the backend triggers to show the panel.
pub const OPEN_PANEL: &str = "open_panel";

/// Reactive cell holding the URL the panel iframe displays.
///
/// The value is always one of: the default tracking URI, a selected
/// experiment's URL, or a manually entered override.
#[derive(Clone, Copy)]
pub struct IframeUrl(RwSignal<String>);

impl IframeUrl {
    pub fn new() -> Self {
        Self(RwSignal::new(DEFAULT_TRACKING_URI.to_string()))
    }

    pub fn get(&self) -> String {
        self.0.get()
    }

    pub fn set(&self, url: impl Into<String>) {
        self.0.set(url.into());
    }
}

impl Default for IframeUrl {
    fn default() -> Self {
        Self::new()
    }
}

type CommandHandler = Arc<dyn Fn(&serde_json::Value) + Send + Sync>;

/// Table of named commands that backend panel events dispatch into.
#[derive(Clone, Default)]
pub struct CommandRegistry {
    handlers: Arc<RwLock<HashMap<String, CommandHandler>>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &self,
        name: impl Into<String>,
        handler: impl Fn(&serde_json::Value) + Send + Sync + 'static,
    ) {
        self.handlers
            .write()
            .unwrap()
            .insert(name.into(), Arc::new(handler));
    }

    pub fn unregister(&self, name: &str) {
        self.handlers.write().unwrap().remove(name);
    }

    /// Run the handler registered under the event's name, if any.
    ///
    /// The handler runs outside the table borrow, so it may register or
    /// unregister commands itself.
    pub fn dispatch(&self, event: &PanelEvent) {
        let handler = self.handlers.read().unwrap().get(&event.name).cloned();
        match handler {
            Some(handler) => handler(&event.params),
            None => log::debug!("no command registered for '{}'", event.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn register_set_iframe_url(commands: &CommandRegistry, cell: IframeUrl) {
        commands.register(SET_IFRAME_URL, move |params| {
            if let Some(url) = params.get("url").and_then(|v| v.as_str()) {
                cell.set(url);
            }
        });
    }

    #[test]
    fn test_cell_defaults_to_tracking_uri() {
        assert_eq!(IframeUrl::new().get(), DEFAULT_TRACKING_URI);
    }

    #[test]
    fn test_set_iframe_url_command_writes_cell() {
        let cell = IframeUrl::new();
        let commands = CommandRegistry::new();
        register_set_iframe_url(&commands, cell);

        let event = PanelEvent::new(SET_IFRAME_URL, json!({"url": "http://tracking:5000"}));
        commands.dispatch(&event);

        assert_eq!(cell.get(), "http://tracking:5000");
    }

    #[test]
    fn test_set_iframe_url_without_url_leaves_cell() {
        let cell = IframeUrl::new();
        let commands = CommandRegistry::new();
        register_set_iframe_url(&commands, cell);

        commands.dispatch(&PanelEvent::new(SET_IFRAME_URL, json!({"other": 1})));

        assert_eq!(cell.get(), DEFAULT_TRACKING_URI);
    }

    #[test]
    fn test_dispatch_unknown_command_is_noop() {
        let commands = CommandRegistry::new();
        commands.dispatch(&PanelEvent::new("does_not_exist", json!({})));
    }

    #[test]
    fn test_unregistered_command_stops_firing() {
        let cell = IframeUrl::new();
        let commands = CommandRegistry::new();
        register_set_iframe_url(&commands, cell);
        commands.unregister(SET_IFRAME_URL);

        commands.dispatch(&PanelEvent::new(SET_IFRAME_URL, json!({"url": "http://gone"})));

        assert_eq!(cell.get(), DEFAULT_TRACKING_URI);
    }

    #[test]
    fn test_handler_may_mutate_table_during_dispatch() {
        let commands = CommandRegistry::new();
        let inner = commands.clone();
        commands.register("once", move |_| inner.unregister("once"));

        commands.dispatch(&PanelEvent::new("once", json!(null)));
        // Second dispatch finds nothing; the first must not have panicked
        // on a still-borrowed table.
        commands.dispatch(&PanelEvent::new("once", json!(null)));
    }
}
