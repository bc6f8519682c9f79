use dioxus::prelude::*;

use crate::routes::Route;

#[component]
pub fn NotFound(segments: Vec<String>) -> Element {
    let path = segments.join("/");

    rsx! {
        div {
            class: "page",
            h1 { "Not found" }
            p { class: "muted", "Nothing lives at /{path}." }
            Link { to: Route::Home {}, "\u{2190} Back to crawls" }
        }
    }
}
