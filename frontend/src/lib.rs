//! Leptos frontend for the MLflow dashboard panel.
//!
//! The app shell owns the command table and the server event stream; the
//! panel embeds the tracking server's web UI in an iframe driven by a shared
//! URL cell that experiment selection, manual overrides, and backend
//! `set_iframe_url` events all write through.

pub mod app;
pub mod events;
pub mod panel;
pub mod remote;
pub mod state;

pub use app::App;
