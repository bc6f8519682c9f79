//! Job status presentation.

use crate::types::{JobStatus, RUN_TIME_FORMAT};

pub const CAPTION_RUNNING: &str = "Running…";
pub const CAPTION_IDLE: &str = "Ready";

/// Shown when no output size is known.
pub const SIZE_PLACEHOLDER: &str = "–";

/// Surface that mirrors the job status (spinner, caption, start control).
pub trait StatusReflector {
    /// Toggle the busy presentation only; telemetry displays are untouched.
    fn set_running(&mut self, running: bool);

    /// Reflect a full status snapshot from the backend.
    fn apply(&mut self, status: &JobStatus);

    /// Show a user-visible error (start failures, missing configuration).
    fn report_error(&mut self, message: &str);
}

/// `"1.25 MB"`, or the dash when the size is unknown or zero.
pub fn format_size_mb(size_mb: Option<f64>) -> String {
    match size_mb {
        Some(size) if size != 0.0 => format!("{} MB", size),
        _ => SIZE_PLACEHOLDER.to_string(),
    }
}

/// What the status area of a crawl page shows.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusPanel {
    pub spinner_visible: bool,
    pub caption: &'static str,
    pub start_disabled: bool,
    pub last_run: Option<String>,
    pub output_size: String,
    pub last_return_code: Option<i32>,
    pub last_file: Option<String>,
    pub error: Option<String>,
}

impl Default for StatusPanel {
    fn default() -> Self {
        Self {
            spinner_visible: false,
            caption: CAPTION_IDLE,
            start_disabled: false,
            last_run: None,
            output_size: SIZE_PLACEHOLDER.to_string(),
            last_return_code: None,
            last_file: None,
            error: None,
        }
    }
}

impl StatusPanel {
    pub fn is_running(&self) -> bool {
        self.spinner_visible
    }
}

impl StatusReflector for StatusPanel {
    fn set_running(&mut self, running: bool) {
        self.spinner_visible = running;
        self.caption = if running { CAPTION_RUNNING } else { CAPTION_IDLE };
        self.start_disabled = running;
        if running {
            self.error = None;
        }
    }

    fn apply(&mut self, status: &JobStatus) {
        self.set_running(status.running);

        if let Some(at) = status.last_run_at {
            self.last_run = Some(at.format(RUN_TIME_FORMAT).to_string());
        }
        self.output_size = format_size_mb(status.last_output_size_mb);
        if status.last_return_code.is_some() {
            self.last_return_code = status.last_return_code;
        }
        if status.last_file.is_some() {
            self.last_file = status.last_file.clone();
        }
    }

    fn report_error(&mut self, message: &str) {
        self.error = Some(message.to_string());
    }
}
