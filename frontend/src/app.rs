//! Application shell: header, operator toolbar, event stream, panel.

use leptos::prelude::*;
use leptos::task::spawn_local;
use lucide_leptos::{FlaskConical, LayoutDashboard};

use mlpanel_core::models::MLFLOW_PANEL_NAME;

use crate::events::EventBridge;
use crate::panel::MlflowPanel;
use crate::remote::{execute_operator, fetch_config, fetch_placements, PlacementEntry};
use crate::state::{CommandRegistry, OPEN_PANEL};

#[component]
pub fn App() -> impl IntoView {
    let commands = CommandRegistry::new();
    provide_context(commands.clone());

    let (panel_open, set_panel_open) = signal(false);

    commands.register(OPEN_PANEL, move |params| {
        if params.get("name").and_then(|v| v.as_str()) == Some(MLFLOW_PANEL_NAME) {
            set_panel_open.set(true);
        }
    });

    let bridge = StoredValue::new_local(
        EventBridge::connect("/api/events", commands.clone())
            .map_err(|e| log::warn!("{}", e))
            .ok(),
    );
    on_cleanup(move || bridge.update_value(|bridge| drop(bridge.take())));

    let config = LocalResource::new(fetch_config);
    let placements = LocalResource::new(fetch_placements);

    view! {
        <div class="flex flex-col h-screen bg-slate-950 text-slate-100 font-sans">
            <header class="flex items-center justify-between px-6 py-3 border-b border-slate-800 bg-slate-900/50 flex-shrink-0">
                <div class="flex items-center space-x-3">
                    <div class="p-2 bg-blue-600 rounded-lg shadow-lg shadow-blue-900/20">
                        <FlaskConical size=20 />
                    </div>
                    <span class="text-xl font-bold tracking-tight text-white">"MLflow Panel"</span>
                    <Suspense fallback=|| ()>
                        {move || Suspend::new(async move {
                            config.await.ok().map(|c| view! {
                                <span class="text-xs text-slate-500 font-mono">"dataset: " {c.dataset}</span>
                            })
                        })}
                    </Suspense>
                </div>
                <div class="flex items-center space-x-2">
                    <Suspense fallback=|| ()>
                        {move || Suspend::new(async move {
                            let entries = placements.await.unwrap_or_default();
                            entries.into_iter().map(|entry| view! {
                                <ToolbarButton entry=entry />
                            }).collect_view()
                        })}
                    </Suspense>
                    {move || panel_open.get().then(|| view! {
                        <button
                            on:click=move |_| set_panel_open.set(false)
                            class="px-3 py-1.5 text-sm text-slate-400 hover:text-white transition-colors"
                        >
                            "Close Panel"
                        </button>
                    })}
                </div>
            </header>

            <main class="flex-grow min-h-0">
                {move || if panel_open.get() {
                    view! { <MlflowPanel /> }.into_any()
                } else {
                    view! {
                        <div class="h-full flex flex-col items-center justify-center space-y-4 text-center">
                            <div class="p-4 bg-slate-800 rounded-full text-blue-500">
                                <LayoutDashboard size=48 />
                            </div>
                            <h3 class="text-xl font-bold text-white">"No Panel Open"</h3>
                            <p class="text-slate-400 max-w-sm">
                                "Open the MLflow panel from the toolbar to browse the experiments linked to this dataset."
                            </p>
                        </div>
                    }.into_any()
                }}
            </main>
        </div>
    }
}

#[component]
fn ToolbarButton(entry: PlacementEntry) -> impl IntoView {
    let label = entry.placement.button.label.clone();
    let icon = entry.placement.button.icon.clone();
    let uri = entry.uri.clone();

    let run = move |_| {
        let uri = uri.clone();
        spawn_local(async move {
            if let Err(e) = execute_operator(&uri, &serde_json::Value::Null).await {
                log::warn!("operator {} failed: {}", uri, e);
            }
        });
    };

    view! {
        <button
            on:click=run
            class="flex items-center space-x-2 px-4 py-1.5 bg-slate-800 hover:bg-slate-700 border border-slate-700 rounded-lg text-sm font-medium transition-colors"
        >
            {icon.map(|icon| view! { <img src=icon class="w-4 h-4" /> })}
            <span>{label}</span>
        </button>
    }
}
