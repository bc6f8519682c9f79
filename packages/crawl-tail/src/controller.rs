use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::client::JobClient;
use crate::config::JobConfig;
use crate::cursor::{Cursor, CursorKind};
use crate::error::{StartError, StartResult};
use crate::render::{LogRenderer, Placeholder};
use crate::status::StatusReflector;
use crate::tail::{lock, LoopState, Session, TailRun};
use crate::types::JobStatus;

/// Binds one start trigger to a job client and its log/status surfaces.
///
/// The controller owns the only [`TailLoop`](crate::TailLoop) for its page.
/// Each successful [`start`](JobController::start) hands out a [`TailRun`]
/// and invalidates the previous one.
pub struct JobController<C, R, S> {
    name: String,
    client: Arc<C>,
    session: Arc<Mutex<Session<R, S>>>,
    cursor_kind: CursorKind,
    interval: Duration,
    start_configured: bool,
}

impl<C, R, S> JobController<C, R, S>
where
    C: JobClient,
    R: LogRenderer,
    S: StatusReflector,
{
    pub fn new(config: &JobConfig, client: C, renderer: R, reflector: S) -> Self {
        Self {
            name: config.name.clone(),
            client: Arc::new(client),
            session: Arc::new(Mutex::new(Session::new(renderer, reflector))),
            cursor_kind: config.cursor,
            interval: config.poll_interval,
            start_configured: config.start_url.is_some(),
        }
    }

    /// Start the job and return the run that tails it.
    ///
    /// Without a start endpoint nothing is sent: the error is surfaced and
    /// `NotConfigured` returned. A live run is superseded only once the
    /// backend acknowledges the new job. On failure the error is surfaced and
    /// no run is created; the status reverts to idle unless an earlier run is
    /// still polling.
    pub async fn start(&self) -> StartResult<TailRun<C, R, S>> {
        if !self.start_configured {
            tracing::warn!(job = %self.name, "Start requested without a start endpoint");
            lock(&self.session)
                .reflector
                .report_error("Start endpoint is not configured.");
            return Err(StartError::NotConfigured);
        }

        // The live run keeps polling until the new job is acknowledged
        lock(&self.session).reflector.set_running(true);

        tracing::info!(job = %self.name, "Starting job");
        let ack = match self.client.start().await {
            Ok(ack) => ack,
            Err(e) => return Err(self.fail_start(e)),
        };

        let Some(cursor) = self.cursor_kind.initial(ack.job_id.as_deref()) else {
            return Err(self.fail_start(StartError::BadResponse(
                "start response did not include a job_id".to_string(),
            )));
        };

        let generation = {
            let mut session = lock(&self.session);
            let Session {
                tail,
                renderer,
                reflector,
            } = &mut *session;

            if let Some(snapshot) = &ack.snapshot {
                reflector.apply(&JobStatus {
                    running: true,
                    ..snapshot.clone()
                });
            }
            renderer.reset(Placeholder::Waiting);
            tail.begin(cursor)
        };

        tracing::info!(
            job = %self.name,
            generation,
            job_id = ack.job_id.as_deref().unwrap_or("-"),
            "Job started"
        );

        Ok(TailRun {
            client: Arc::clone(&self.client),
            session: Arc::clone(&self.session),
            generation,
            interval: self.interval,
        })
    }

    fn fail_start(&self, error: StartError) -> StartError {
        tracing::warn!(job = %self.name, error = %error, "Start failed");
        let mut session = lock(&self.session);
        if session.tail.state() != LoopState::Polling {
            session.reflector.set_running(false);
        }
        session
            .reflector
            .report_error(&format!("Start crawl failed: {}", error));
        error
    }

    /// Clear the rendered log. The tail loop is not affected.
    pub fn clear_log(&self) {
        lock(&self.session).renderer.reset(Placeholder::Cleared);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn state(&self) -> LoopState {
        lock(&self.session).tail.state()
    }

    pub fn cursor(&self) -> Option<Cursor> {
        lock(&self.session).tail.cursor().cloned()
    }

    pub fn generation(&self) -> u64 {
        lock(&self.session).tail.generation()
    }

    pub fn with_renderer<T>(&self, f: impl FnOnce(&R) -> T) -> T {
        f(&lock(&self.session).renderer)
    }

    pub fn with_reflector<T>(&self, f: impl FnOnce(&S) -> T) -> T {
        f(&lock(&self.session).reflector)
    }
}
