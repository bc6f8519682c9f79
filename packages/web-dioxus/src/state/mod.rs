//! Signal-backed log/status surfaces and browser glue for the tail loop

use std::time::Duration;

use async_trait::async_trait;
use crawl_tail::config::cookie_value;
use crawl_tail::{
    ConfigError, HttpJobClient, JobConfig, JobController, JobPreset, JobStatus, LogRenderer,
    LogView, Placeholder, Sleeper, StatusPanel, StatusReflector, CSRF_COOKIE, DEFAULT_BASE_URL,
};
use dioxus::prelude::*;

/// Controller type used by every crawl page.
pub type PageController = JobController<HttpJobClient, SignalLog, SignalStatus>;

/// [`LogRenderer`] writing into a [`LogView`] signal, so the log pane
/// re-renders on every batch.
#[derive(Clone, Copy)]
pub struct SignalLog(pub Signal<LogView>);

impl LogRenderer for SignalLog {
    fn append_lines(&mut self, lines: &[String]) {
        if !lines.is_empty() {
            self.0.write().append_lines(lines);
        }
    }

    fn reset(&mut self, placeholder: Placeholder) {
        self.0.write().reset(placeholder);
    }
}

/// [`StatusReflector`] writing into a [`StatusPanel`] signal.
#[derive(Clone, Copy)]
pub struct SignalStatus(pub Signal<StatusPanel>);

impl StatusReflector for SignalStatus {
    fn set_running(&mut self, running: bool) {
        self.0.write().set_running(running);
    }

    fn apply(&mut self, status: &JobStatus) {
        self.0.write().apply(status);
    }

    fn report_error(&mut self, message: &str) {
        self.0.write().report_error(message);
    }
}

/// Browser timer for the tail loop.
#[derive(Clone, Copy, Default)]
pub struct GlooSleeper;

#[async_trait(?Send)]
impl Sleeper for GlooSleeper {
    async fn sleep(&self, duration: Duration) {
        gloo_timers::future::sleep(duration).await;
    }
}

/// Configuration for `preset` against the origin the page was served from.
///
/// The CSRF token is read from the `csrftoken` cookie; the session cookie
/// itself is attached by the browser.
pub fn page_config(preset: JobPreset) -> Result<JobConfig, ConfigError> {
    let origin = browser::origin().unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let config = preset.config(&origin)?;

    Ok(match browser::cookies().and_then(|raw| cookie_value(&raw, CSRF_COOKIE)) {
        Some(token) => config.with_csrf_token(token),
        None => {
            tracing::warn!(preset = %preset, "No csrftoken cookie; start requests may be refused");
            config
        }
    })
}

/// Controller for one crawl page, bound to its log and status signals.
pub fn page_controller(
    config: &JobConfig,
    log: Signal<LogView>,
    status: Signal<StatusPanel>,
) -> PageController {
    JobController::new(
        config,
        HttpJobClient::new(config.clone()),
        SignalLog(log),
        SignalStatus(status),
    )
}

mod browser {
    use wasm_bindgen::JsCast;

    pub fn origin() -> Option<String> {
        web_sys::window()?.location().origin().ok()
    }

    pub fn cookies() -> Option<String> {
        web_sys::window()?
            .document()?
            .dyn_into::<web_sys::HtmlDocument>()
            .ok()?
            .cookie()
            .ok()
    }
}
