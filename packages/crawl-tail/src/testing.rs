//! Testing utilities.
//!
//! Scripted stand-ins for the backend and the timer so controllers and runs
//! can be exercised without a network or real waiting.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::client::JobClient;
use crate::cursor::Cursor;
use crate::error::{StartResult, TailResult};
use crate::timer::Sleeper;
use crate::types::{JobStatus, LogBatch, StartAck, TailResponse};

/// A [`JobClient`] that replays queued responses and records every call.
///
/// When the tail queue is empty it answers with an empty batch at the
/// requested cursor and `running: true`.
#[derive(Default)]
pub struct MockJobClient {
    starts: Mutex<VecDeque<StartResult<StartAck>>>,
    tails: Mutex<VecDeque<TailResult<TailResponse>>>,
    start_calls: Arc<Mutex<usize>>,
    tail_calls: Arc<Mutex<Vec<Cursor>>>,
}

impl MockJobClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the result of the next start call.
    pub fn with_start(self, result: StartResult<StartAck>) -> Self {
        self.starts.lock().unwrap().push_back(result);
        self
    }

    /// Queue a successful start carrying `job_id`.
    pub fn with_job_id(self, job_id: &str) -> Self {
        self.with_start(Ok(StartAck {
            job_id: Some(job_id.to_string()),
            ..StartAck::default()
        }))
    }

    /// Queue the result of the next tail call.
    pub fn with_tail(self, result: TailResult<TailResponse>) -> Self {
        self.tails.lock().unwrap().push_back(result);
        self
    }

    /// Queue a successful tail returning `lines`.
    pub fn with_lines(self, lines: &[&str], next_cursor: Cursor, running: bool) -> Self {
        self.with_tail(Ok(tail_response(lines, next_cursor, running)))
    }

    pub fn start_calls(&self) -> usize {
        *self.start_calls.lock().unwrap()
    }

    /// Cursors of every tail call, in order.
    pub fn tail_calls(&self) -> Vec<Cursor> {
        self.tail_calls.lock().unwrap().clone()
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl JobClient for MockJobClient {
    async fn start(&self) -> StartResult<StartAck> {
        *self.start_calls.lock().unwrap() += 1;
        self.starts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(StartAck::default()))
    }

    async fn tail(&self, cursor: &Cursor) -> TailResult<TailResponse> {
        self.tail_calls.lock().unwrap().push(cursor.clone());
        self.tails
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(tail_response(&[], cursor.clone(), true)))
    }
}

/// Build a successful tail response.
pub fn tail_response(lines: &[&str], next_cursor: Cursor, running: bool) -> TailResponse {
    TailResponse {
        batch: LogBatch {
            lines: lines.iter().map(|line| line.to_string()).collect(),
            next_cursor,
        },
        status: JobStatus {
            running,
            ..JobStatus::default()
        },
    }
}

/// A [`Sleeper`] that returns immediately and records the requested waits.
#[derive(Debug, Clone, Default)]
pub struct InstantSleeper {
    waits: Arc<Mutex<Vec<Duration>>>,
}

impl InstantSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn waits(&self) -> Vec<Duration> {
        self.waits.lock().unwrap().clone()
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl Sleeper for InstantSleeper {
    async fn sleep(&self, duration: Duration) {
        self.waits.lock().unwrap().push(duration);
    }
}
