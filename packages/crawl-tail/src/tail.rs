//! The tail loop: one cursor, one generation, polled until the job ends.
//!
//! [`TailLoop`] is the synchronous state machine. It never performs I/O, so
//! every transition can be exercised without a network or a UI. [`TailRun`]
//! drives one generation of it: an immediate tail, then one tail per
//! interval until the job reports completion or a newer start supersedes
//! the run.
//!
//! Stale responses are detected with a ticket: every request carries the
//! generation and cursor it was issued for, and a result whose ticket no
//! longer matches the loop is dropped without touching the view.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::client::JobClient;
use crate::cursor::Cursor;
use crate::error::TailResult;
use crate::render::LogRenderer;
use crate::status::StatusReflector;
use crate::timer::Sleeper;
use crate::types::TailResponse;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopState {
    #[default]
    Idle,
    Polling,
    Stopped,
}

/// Proof that a tail request was issued for a given generation and cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TailTicket {
    generation: u64,
    cursor: Cursor,
}

impl TailTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }
}

/// What applying one tail result did to the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Keep polling.
    Continue,
    /// The job reported completion; the loop is stopped.
    Stopped,
    /// Same generation, but the cursor moved since the request was issued.
    Discarded,
    /// The run belongs to an older generation (or the loop is no longer polling).
    Superseded,
}

#[derive(Debug, Default)]
pub struct TailLoop {
    state: LoopState,
    generation: u64,
    cursor: Option<Cursor>,
    applied: u64,
}

impl TailLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn cursor(&self) -> Option<&Cursor> {
        self.cursor.as_ref()
    }

    /// Successful responses applied in the current generation.
    pub fn applied(&self) -> u64 {
        self.applied
    }

    /// Enter `Polling` from `cursor` under a fresh generation.
    ///
    /// Every earlier generation is invalidated, so at most one run is live.
    pub fn begin(&mut self, cursor: Cursor) -> u64 {
        if self.state == LoopState::Polling {
            tracing::info!(generation = self.generation, "Superseding active tail loop");
        }
        self.generation += 1;
        self.state = LoopState::Polling;
        self.applied = 0;
        tracing::info!(generation = self.generation, cursor = %cursor, "Tail loop polling");
        self.cursor = Some(cursor);
        self.generation
    }

    /// Ticket for the next tail request of run `generation`, if it is still live.
    pub fn ticket(&self, generation: u64) -> Option<TailTicket> {
        if generation != self.generation || self.state != LoopState::Polling {
            return None;
        }
        self.cursor.clone().map(|cursor| TailTicket { generation, cursor })
    }

    /// Apply the result of the request `ticket` was issued for.
    pub fn apply<R, S>(
        &mut self,
        ticket: &TailTicket,
        result: TailResult<TailResponse>,
        renderer: &mut R,
        reflector: &mut S,
    ) -> TickOutcome
    where
        R: LogRenderer + ?Sized,
        S: StatusReflector + ?Sized,
    {
        if ticket.generation != self.generation || self.state != LoopState::Polling {
            tracing::debug!(
                ticket = ticket.generation,
                current = self.generation,
                "Dropping response from superseded run"
            );
            return TickOutcome::Superseded;
        }

        let Some(current) = self.cursor.clone() else {
            return TickOutcome::Superseded;
        };
        if ticket.cursor != current {
            tracing::debug!(ticket = %ticket.cursor, current = %current, "Dropping stale tail response");
            return TickOutcome::Discarded;
        }

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, cursor = %current, "Tail request failed; retrying next tick");
                renderer.append_error(&e.to_string());
                return TickOutcome::Continue;
            }
        };

        renderer.append_lines(&response.batch.lines);

        let next = response.batch.next_cursor;
        if moves_forward(&current, &next) {
            self.cursor = Some(next);
        } else {
            tracing::warn!(current = %current, returned = %next, "Keeping cursor; response would move it backwards");
        }

        reflector.apply(&response.status);
        self.applied += 1;

        if response.status.is_terminal() {
            self.state = LoopState::Stopped;
            tracing::info!(
                generation = self.generation,
                applied = self.applied,
                "Job finished; tail loop stopped"
            );
            return TickOutcome::Stopped;
        }

        TickOutcome::Continue
    }
}

fn moves_forward(current: &Cursor, next: &Cursor) -> bool {
    current.kind() == next.kind()
        && current.job_id() == next.job_id()
        && next.position() >= current.position()
}

/// Loop state plus the two surfaces it writes to, shared by the controller
/// and its runs.
#[derive(Debug)]
pub struct Session<R, S> {
    pub tail: TailLoop,
    pub renderer: R,
    pub reflector: S,
}

impl<R, S> Session<R, S> {
    pub fn new(renderer: R, reflector: S) -> Self {
        Self {
            tail: TailLoop::new(),
            renderer,
            reflector,
        }
    }
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// How a [`TailRun`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TailExit {
    Completed,
    Superseded,
}

/// One generation of polling, handed out by a successful start.
///
/// The caller spawns [`TailRun::run`] on its executor. Dropping the future
/// abandons the run; starting a new job makes it exit at its next tick.
pub struct TailRun<C, R, S> {
    pub(crate) client: Arc<C>,
    pub(crate) session: Arc<Mutex<Session<R, S>>>,
    pub(crate) generation: u64,
    pub(crate) interval: Duration,
}

impl<C, R, S> TailRun<C, R, S>
where
    C: JobClient,
    R: LogRenderer,
    S: StatusReflector,
{
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Issue one tail request and apply its result.
    pub async fn poll_once(&self) -> TickOutcome {
        let ticket = lock(&self.session).tail.ticket(self.generation);
        let Some(ticket) = ticket else {
            return TickOutcome::Superseded;
        };

        let result = self.client.tail(ticket.cursor()).await;

        let mut session = lock(&self.session);
        let Session {
            tail,
            renderer,
            reflector,
        } = &mut *session;
        tail.apply(&ticket, result, renderer, reflector)
    }

    /// Poll immediately, then once per interval, until the job ends or the
    /// run is superseded.
    pub async fn run<T: Sleeper>(self, sleeper: T) -> TailExit {
        loop {
            match self.poll_once().await {
                TickOutcome::Stopped => return TailExit::Completed,
                TickOutcome::Superseded => return TailExit::Superseded,
                TickOutcome::Continue | TickOutcome::Discarded => {}
            }
            sleeper.sleep(self.interval).await;
        }
    }
}
