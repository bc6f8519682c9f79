//! Crawl page: start trigger, status area and live log

use std::rc::Rc;

use crawl_tail::{JobPreset, LogView, Placeholder, StatusPanel};
use dioxus::prelude::*;

use crate::components::{LogPane, StatusBar};
use crate::routes::Route;
use crate::state::{page_config, page_controller, GlooSleeper};

/// Crawl page for one backend preset
#[component]
pub fn CrawlPage(preset: String) -> Element {
    let job_preset = match preset.parse::<JobPreset>() {
        Ok(job_preset) => job_preset,
        Err(e) => {
            return rsx! {
                div {
                    class: "page",
                    p { class: "status-error", "{e}" }
                    Link { to: Route::Home {}, "\u{2190} Back to crawls" }
                }
            }
        }
    };

    // Keyed so switching presets builds a fresh controller
    rsx! {
        CrawlPanel { key: "{job_preset}", preset: job_preset }
    }
}

#[component]
fn CrawlPanel(preset: JobPreset) -> Element {
    let config = use_hook(move || page_config(preset).map_err(|e| e.to_string()));

    let max_lines = config
        .as_ref()
        .map(|config| config.max_log_lines)
        .unwrap_or(crawl_tail::DEFAULT_MAX_LOG_LINES);
    let log = use_signal(move || LogView::with_placeholder(max_lines, Placeholder::Waiting));
    let status = use_signal(StatusPanel::default);

    let controller = use_hook({
        let config = config.clone();
        move || {
            config
                .as_ref()
                .ok()
                .map(|config| Rc::new(page_controller(config, log, status)))
        }
    });

    let handle_start = {
        let controller = controller.clone();
        move |_| {
            let Some(controller) = controller.clone() else {
                return;
            };
            spawn(async move {
                match controller.start().await {
                    Ok(run) => {
                        let exit = run.run(GlooSleeper).await;
                        tracing::debug!(job = controller.name(), ?exit, "Tail run ended");
                    }
                    Err(e) => tracing::warn!(job = controller.name(), error = %e, "Start failed"),
                }
            });
        }
    };

    let handle_clear = {
        let controller = controller.clone();
        move |_| {
            if let Some(controller) = &controller {
                controller.clear_log();
            }
        }
    };

    let panel = status.read().clone();
    let start_disabled = panel.start_disabled || controller.is_none();

    rsx! {
        div {
            class: "page",
            header {
                Link { to: Route::Home {}, class: "muted", "\u{2190} All crawls" }
                h1 { "{preset.label()}" }
            }

            div {
                class: "actions",
                button {
                    class: "primary",
                    disabled: start_disabled,
                    onclick: handle_start,
                    if panel.start_disabled { "Running…" } else { "Start crawl" }
                }
                button {
                    class: "secondary",
                    disabled: controller.is_none(),
                    onclick: handle_clear,
                    "Clear log"
                }
            }

            if let Err(e) = &config {
                p { class: "status-error", "{e}" }
            }

            StatusBar { panel }
            LogPane { log }
        }
    }
}
