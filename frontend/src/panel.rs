//! The MLflow dashboard panel.

use leptos::prelude::*;
use leptos::task::spawn_local;
use lucide_leptos::TriangleAlert;

use mlpanel_core::models::{ExperimentUrl, ExperimentUrlList};

use crate::remote::{probe_server, OperatorExecutor, EXPERIMENT_URLS_URI};
use crate::state::{CommandRegistry, IframeUrl, SET_IFRAME_URL};

/// What the panel shows, derived from the executor's observable state.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelPhase {
    Loading,
    Empty,
    Ready(Vec<ExperimentUrl>),
}

/// Loading wins while the call is pending or no result has landed, so a
/// failed call never advances the panel.
pub fn panel_phase(pending: bool, result: Option<&ExperimentUrlList>) -> PanelPhase {
    match result {
        _ if pending => PanelPhase::Loading,
        None => PanelPhase::Loading,
        Some(list) if list.urls.is_empty() => PanelPhase::Empty,
        Some(list) => PanelPhase::Ready(list.urls.clone()),
    }
}

/// The selector only appears once there is an actual choice to make; a
/// single experiment renders as a plain iframe at the current URL.
pub fn selector_entries(urls: &[ExperimentUrl]) -> Option<Vec<ExperimentUrl>> {
    (urls.len() >= 2).then(|| urls.to_vec())
}

/// The URL override form shows whenever the tracking server looks down,
/// except while the experiment list is still loading.
pub fn override_visible(phase: &PanelPhase, server_available: bool) -> bool {
    !server_available && *phase != PanelPhase::Loading
}

/// An override submission is taken verbatim when it is not blank; nothing
/// else is validated before the value becomes the iframe target.
pub fn override_submission(draft: &str) -> Option<String> {
    (!draft.trim().is_empty()).then(|| draft.to_string())
}

/// Lands a probe result on the availability signal. A slow probe can
/// outlive the panel, and a signal disposed by unmount is left alone.
pub fn land_probe_result(availability: RwSignal<bool>, up: bool) {
    if availability.try_set(up).is_some() {
        log::debug!("probe resolved after the panel unmounted; result dropped");
    }
}

#[component]
pub fn MlflowPanel() -> impl IntoView {
    let commands = use_context::<CommandRegistry>().expect("CommandRegistry not provided");
    let url_cell = IframeUrl::new();
    let executor = OperatorExecutor::<ExperimentUrlList>::new(EXPERIMENT_URLS_URI);
    let server_available = RwSignal::new(true);

    // The retarget command lives only while the panel is mounted.
    commands.register(SET_IFRAME_URL, move |params| {
        if let Some(url) = params.get("url").and_then(|v| v.as_str()) {
            url_cell.set(url);
        }
    });
    let commands_on_drop = StoredValue::new_local(commands);
    on_cleanup(move || commands_on_drop.with_value(|c| c.unregister(SET_IFRAME_URL)));

    executor.trigger(serde_json::Value::Null);
    on_cleanup(move || executor.cancel());

    // Re-probe whenever the iframe target changes. The last probe to land
    // wins; an intermediate result may briefly show through.
    Effect::new(move |_| {
        let url = url_cell.get();
        spawn_local(async move {
            let up = probe_server(&url).await;
            land_probe_result(server_available, up);
        });
    });

    let phase = move || {
        executor
            .result
            .with(|result| panel_phase(executor.pending.get(), result.as_ref()))
    };

    view! {
        <div class="flex flex-col h-full min-h-0 bg-slate-950">
            <div class="flex items-center justify-between px-4 py-2 border-b border-slate-800 bg-slate-900/50 flex-shrink-0">
                <div class="flex items-center space-x-2">
                    <span class="text-sm font-semibold text-slate-200">"MLflow Dashboard"</span>
                    <div
                        class=move || format!(
                            "w-2 h-2 rounded-full {}",
                            if server_available.get() { "bg-green-500" } else { "bg-red-500 animate-pulse" }
                        )
                        title=move || if server_available.get() { "Tracking server reachable" } else { "Tracking server unreachable" }
                    ></div>
                </div>
                <span class="text-xs font-mono text-slate-500 truncate max-w-md">{move || url_cell.get()}</span>
            </div>

            {move || {
                let current = phase();
                let show_override = override_visible(&current, server_available.get());
                match current {
                    PanelPhase::Loading => view! {
                        <div class="flex-grow flex items-center justify-center">
                            <div class="animate-pulse text-slate-500 text-sm">"Loading experiments..."</div>
                        </div>
                    }.into_any(),
                    PanelPhase::Empty => view! {
                        <div class="px-4 py-2 text-xs text-slate-500 bg-slate-900/30 border-b border-slate-800 flex-shrink-0">
                            "No MLflow experiments are linked to this dataset yet."
                        </div>
                        <DashboardFrame url_cell=url_cell />
                        {show_override.then(|| view! { <OverrideForm url_cell=url_cell /> })}
                    }.into_any(),
                    PanelPhase::Ready(urls) => view! {
                        {selector_entries(&urls).map(|entries| view! {
                            <ExperimentSelector entries=entries url_cell=url_cell />
                        })}
                        <DashboardFrame url_cell=url_cell />
                        {show_override.then(|| view! { <OverrideForm url_cell=url_cell /> })}
                    }.into_any(),
                }
            }}
        </div>
    }
}

#[component]
fn DashboardFrame(url_cell: IframeUrl) -> impl IntoView {
    view! {
        <div class="flex-grow min-h-0">
            <iframe src=move || url_cell.get() class="w-full h-full border-none bg-white"></iframe>
        </div>
    }
}

#[component]
fn ExperimentSelector(entries: Vec<ExperimentUrl>, url_cell: IframeUrl) -> impl IntoView {
    view! {
        <div class="px-4 py-2 border-b border-slate-800 bg-slate-900/30 flex items-center space-x-3 flex-shrink-0">
            <label class="text-xs font-semibold text-slate-500 uppercase tracking-wider">"Experiment"</label>
            <select
                on:change=move |ev| url_cell.set(event_target_value(&ev))
                prop:value=move || url_cell.get()
                class="bg-slate-950 border border-slate-800 rounded-lg px-3 py-1.5 text-sm text-white focus:border-blue-500 outline-none"
            >
                {entries.into_iter().map(|entry| view! {
                    <option value=entry.url>{entry.name}</option>
                }).collect_view()}
            </select>
        </div>
    }
}

#[component]
fn OverrideForm(url_cell: IframeUrl) -> impl IntoView {
    let (draft, set_draft) = signal(String::new());

    let submit = move |_| {
        if let Some(url) = override_submission(&draft.get()) {
            url_cell.set(url);
        }
    };

    view! {
        <div class="px-4 py-3 bg-slate-900 border-t border-slate-800 flex-shrink-0 space-y-2">
            <div class="flex items-center space-x-2 text-yellow-500 text-xs">
                <TriangleAlert size=14 />
                <span>"The tracking server is not reachable. Point the panel at a running MLflow instance:"</span>
            </div>
            <div class="flex space-x-2">
                <input
                    type="text"
                    on:input=move |ev| set_draft.set(event_target_value(&ev))
                    prop:value=draft
                    placeholder="http://localhost:8080"
                    class="flex-grow bg-slate-950 border border-slate-800 rounded-lg px-3 py-1.5 text-sm text-white font-mono focus:border-blue-500 outline-none"
                />
                <button
                    on:click=submit
                    class="px-4 py-1.5 bg-blue-600 hover:bg-blue-500 text-white text-sm rounded-lg font-medium transition-colors"
                >
                    "Load"
                </button>
            </div>
        </div>
    }
}
