//! Job status area

use crawl_tail::StatusPanel;
use dioxus::prelude::*;

use crate::components::Spinner;

#[component]
pub fn StatusBar(panel: StatusPanel) -> Element {
    rsx! {
        div {
            class: "status-bar",

            div {
                class: "status-caption",
                Spinner { visible: panel.spinner_visible }
                span { "{panel.caption}" }
            }

            dl {
                class: "status-fields",
                dt { "Last run" }
                dd { {panel.last_run.clone().unwrap_or_else(|| "never".to_string())} }
                dt { "Output size" }
                dd { "{panel.output_size}" }
                if let Some(code) = panel.last_return_code {
                    dt { "Return code" }
                    dd {
                        class: if code == 0 { "ok" } else { "failed" },
                        "{code}"
                    }
                }
                if let Some(file) = panel.last_file.clone() {
                    dt { "Last file" }
                    dd { "{file}" }
                }
            }

            if let Some(error) = panel.error.clone() {
                p { class: "status-error", "{error}" }
            }
        }
    }
}
