//! Home page component

use crawl_tail::JobPreset;
use dioxus::prelude::*;

use crate::routes::Route;

/// Home page - lists the crawl pages the backend offers
#[component]
pub fn Home() -> Element {
    rsx! {
        div {
            class: "page",
            header {
                h1 { "Crawl console" }
                p { class: "muted", "Start a crawl and follow its log as it runs." }
            }

            ul {
                class: "preset-list",
                for preset in JobPreset::all().iter().copied() {
                    li {
                        key: "{preset.slug()}",
                        Link {
                            to: Route::CrawlPage { preset: preset.slug().to_string() },
                            "{preset.label()}"
                        }
                    }
                }
            }
        }
    }
}
