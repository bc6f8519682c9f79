//! Crawl console - Dioxus web application
//!
//! Browser frontend for the crawl backend: pick a crawl page, start the job
//! and watch its log stream in.
//!
//! ## Running
//!
//! The app is served from the backend's origin so the session and CSRF
//! cookies are sent with every request.
//!
//! Development (with hot reload):
//! ```bash
//! dx serve --platform web
//! ```
//!
//! Production build:
//! ```bash
//! dx build --release --platform web
//! ```

#![allow(non_snake_case)]

// The tail loop waits on browser timers; there is no native build of this app
#[cfg(not(feature = "web"))]
compile_error!("crawl-web only runs in the browser: build it with the `web` feature");

mod app;
mod components;
mod pages;
mod routes;
mod state;

fn main() {
    dioxus::logger::init(tracing::Level::INFO).expect("failed to initialize logger");

    dioxus::launch(app::App);
}
