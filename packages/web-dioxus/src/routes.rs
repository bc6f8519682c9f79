//! Route definitions for the application

use dioxus::prelude::*;

use crate::pages::{CrawlPage, Home, NotFound};

/// All application routes
#[derive(Clone, Debug, PartialEq, Routable)]
#[rustfmt::skip]
pub enum Route {
    #[route("/")]
    Home {},

    /// One crawl page per backend preset (`vrain-html`, `vrain-api`, ...)
    #[route("/crawl/:preset")]
    CrawlPage { preset: String },

    #[route("/:..segments")]
    NotFound { segments: Vec<String> },
}
