//! Scrolling log pane

use crawl_tail::{LogEntry, LogView};
use dioxus::prelude::*;

const LOG_ELEMENT_ID: &str = "crawl-log";

const SCROLL_TO_BOTTOM: &str = r#"
    const el = document.getElementById("crawl-log");
    if (el) { el.scrollTop = el.scrollHeight; }
"#;

fn entry_class(entry: &LogEntry) -> &'static str {
    if entry.is_placeholder() {
        "log-line placeholder"
    } else if entry.is_error() {
        "log-line error"
    } else {
        "log-line"
    }
}

/// Log pane that scrolls to its newest line whenever the view changes.
#[component]
pub fn LogPane(log: Signal<LogView>) -> Element {
    // Re-run after every change so the pane follows the tail
    use_effect(move || {
        let _revision = log.read().revision();
        let _ = document::eval(SCROLL_TO_BOTTOM);
    });

    let view = log.read();
    let evicted = view.evicted();
    let rows: Vec<(String, &'static str)> = view
        .entries()
        .map(|entry| (entry.text().to_string(), entry_class(entry)))
        .collect();
    drop(view);

    rsx! {
        div {
            if evicted > 0 {
                p { class: "log-evicted", "{evicted} earlier lines not shown" }
            }
            pre {
                id: LOG_ELEMENT_ID,
                class: "log-pane",
                for (index, (text, class)) in rows.into_iter().enumerate() {
                    div { key: "{index}", class: class, "{text}" }
                }
            }
        }
    }
}
