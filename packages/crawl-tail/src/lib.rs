//! Start a backend crawl job and tail its log until it finishes.
//!
//! The crate speaks the crawl backend's two-endpoint protocol: one POST that
//! starts the job, and a GET that returns log lines past a cursor together
//! with the job status. A single [`TailLoop`] drives every backend variant;
//! the [`Cursor`] strategy decides how progress is encoded (`since`,
//! `offset`, or `job_id` + `offset`).
//!
//! # Example
//!
//! ```rust,ignore
//! use crawl_tail::{HttpJobClient, JobController, JobPreset, LogView, StatusPanel, TokioSleeper};
//!
//! let config = JobPreset::VrainSelenium.config("http://localhost:8000")?;
//! let controller = JobController::new(
//!     &config,
//!     HttpJobClient::new(config.clone()),
//!     LogView::new(config.max_log_lines),
//!     StatusPanel::default(),
//! );
//!
//! let run = controller.start().await?;
//! run.run(TokioSleeper).await;
//! controller.with_renderer(|view| println!("{} lines", view.lines().len()));
//! ```
//!
//! # Modules
//!
//! - [`cursor`] - Cursor strategies and their query encoding
//! - [`client`] - [`JobClient`] trait and the HTTP implementation
//! - [`tail`] - The tail loop state machine and its driver
//! - [`controller`] - Start trigger orchestration
//! - [`render`] / [`status`] - UI-agnostic log and status surfaces
//! - [`testing`] - Mock implementations for testing

pub mod client;
pub mod config;
pub mod controller;
pub mod cursor;
pub mod error;
pub mod render;
pub mod status;
pub mod tail;
pub mod testing;
pub mod timer;
pub mod types;

pub use client::{HttpJobClient, JobClient};
pub use config::{
    AckShape, JobConfig, JobPreset, StartBody, CSRF_COOKIE, CSRF_HEADER, DEFAULT_BASE_URL,
    DEFAULT_MAX_LOG_LINES, DEFAULT_POLL_INTERVAL,
};
pub use controller::JobController;
pub use cursor::{Cursor, CursorKind};
pub use error::{ConfigError, StartError, TailError};
pub use render::{LogEntry, LogRenderer, LogView, Placeholder};
pub use status::{format_size_mb, StatusPanel, StatusReflector};
pub use tail::{LoopState, Session, TailExit, TailLoop, TailRun, TailTicket, TickOutcome};
#[cfg(not(target_arch = "wasm32"))]
pub use timer::TokioSleeper;
pub use timer::Sleeper;
pub use types::{JobStatus, LogBatch, StartAck, TailResponse};
