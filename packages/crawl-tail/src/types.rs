use chrono::{DateTime, NaiveDateTime};
use serde::Deserialize;

use crate::cursor::Cursor;

/// Format the backend uses for `last_crawl_time`.
pub const RUN_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Normalized job status, produced by every tail response.
///
/// The backends disagree on the completion flag (`is_running` vs `done`);
/// both are folded into `running` before a status leaves the client.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobStatus {
    pub running: bool,
    pub last_run_at: Option<NaiveDateTime>,
    pub last_output_size_mb: Option<f64>,
    pub last_return_code: Option<i32>,
    pub last_file: Option<String>,
}

impl JobStatus {
    pub fn running() -> Self {
        Self {
            running: true,
            ..Self::default()
        }
    }

    pub fn idle() -> Self {
        Self::default()
    }

    pub fn is_terminal(&self) -> bool {
        !self.running
    }
}

/// New log lines plus the cursor to use for the next tail.
#[derive(Debug, Clone, PartialEq)]
pub struct LogBatch {
    pub lines: Vec<String>,
    pub next_cursor: Cursor,
}

/// Result of one successful tail request.
#[derive(Debug, Clone, PartialEq)]
pub struct TailResponse {
    pub batch: LogBatch,
    pub status: JobStatus,
}

/// Normalized acknowledgement of a start request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StartAck {
    /// Identifier of the started job, when the backend hands one out.
    pub job_id: Option<String>,
    pub message: Option<String>,
    /// Status fields the backend included with the acknowledgement.
    pub snapshot: Option<JobStatus>,
}

/// Tail endpoint body as sent by the backend.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TailPayload {
    pub ok: Option<bool>,
    pub lines: Option<Vec<String>>,
    pub next_since: Option<u64>,
    pub offset: Option<u64>,
    pub job_id: Option<String>,
    pub is_running: Option<bool>,
    pub done: Option<bool>,
    pub last_crawl_time: Option<String>,
    #[serde(alias = "csv_size_mb")]
    pub last_size_mb: Option<f64>,
    pub last_returncode: Option<i32>,
    pub last_file: Option<String>,
    pub message: Option<String>,
    pub error: Option<String>,
}

impl TailPayload {
    /// `is_running` wins when both flags are present.
    pub fn running(&self) -> Option<bool> {
        self.is_running.or(self.done.map(|done| !done))
    }

    pub fn reason(&self) -> Option<String> {
        self.error.clone().or_else(|| self.message.clone())
    }

    pub fn status(&self, running: bool) -> JobStatus {
        JobStatus {
            running,
            last_run_at: self.last_crawl_time.as_deref().and_then(parse_run_time),
            last_output_size_mb: self.last_size_mb,
            last_return_code: self.last_returncode,
            last_file: self.last_file.clone(),
        }
    }
}

/// Start endpoint body as sent by the backend.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StartPayload {
    pub ok: Option<bool>,
    pub job_id: Option<String>,
    pub message: Option<String>,
    pub error: Option<String>,
    pub is_running: Option<bool>,
    pub last_crawl_time: Option<String>,
    #[serde(alias = "csv_size_mb")]
    pub last_size_mb: Option<f64>,
}

impl StartPayload {
    pub fn reason(&self) -> Option<String> {
        self.error.clone().or_else(|| self.message.clone())
    }

    pub fn into_ack(self) -> StartAck {
        let snapshot = if self.last_crawl_time.is_some() || self.last_size_mb.is_some() {
            Some(JobStatus {
                running: self.is_running.unwrap_or(true),
                last_run_at: self.last_crawl_time.as_deref().and_then(parse_run_time),
                last_output_size_mb: self.last_size_mb,
                ..JobStatus::default()
            })
        } else {
            None
        };

        StartAck {
            job_id: self.job_id,
            message: self.message,
            snapshot,
        }
    }
}

/// Parse a backend timestamp: `2024-05-01 13:45:00` or RFC 3339.
pub fn parse_run_time(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, RUN_TIME_FORMAT)
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.naive_local()))
        .or_else(|| {
            tracing::debug!(raw, "Unparseable last_crawl_time");
            None
        })
}
