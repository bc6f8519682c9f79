//! Loading components

use dioxus::prelude::*;

/// Inline busy indicator shown next to the status caption
#[component]
pub fn Spinner(visible: bool) -> Element {
    if !visible {
        return rsx! {};
    }

    rsx! {
        span {
            class: "spinner",
            role: "status",
            aria_label: "running",
            span { class: "spinner-dot" }
            span { class: "spinner-dot", style: "animation-delay: 0.1s" }
            span { class: "spinner-dot", style: "animation-delay: 0.2s" }
        }
    }
}
