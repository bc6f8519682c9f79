//! Log cursor strategies.
//!
//! A [`Cursor`] marks how much of a job's log the client has already
//! rendered. Each variant knows how to encode itself as query parameters and
//! which response field carries its next value.

use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::types::TailPayload;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Cursor {
    /// Exclusive line index, sent as `since`, advanced from `next_since`.
    SinceToken(u64),
    /// Line/byte count, sent as `offset`, advanced from `offset`.
    ByteOffset(u64),
    /// Offset scoped to a job, sent as `job_id` + `offset`.
    JobHandle { job_id: String, offset: u64 },
}

/// Which cursor strategy a backend speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorKind {
    #[default]
    Since,
    Offset,
    JobOffset,
}

impl CursorKind {
    /// Cursor to use right after a successful start.
    ///
    /// Returns `None` for [`CursorKind::JobOffset`] when the start response
    /// carried no job id.
    pub fn initial(self, job_id: Option<&str>) -> Option<Cursor> {
        match self {
            CursorKind::Since => Some(Cursor::SinceToken(0)),
            CursorKind::Offset => Some(Cursor::ByteOffset(0)),
            CursorKind::JobOffset => job_id.map(|id| Cursor::JobHandle {
                job_id: id.to_string(),
                offset: 0,
            }),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CursorKind::Since => "since",
            CursorKind::Offset => "offset",
            CursorKind::JobOffset => "job-offset",
        }
    }
}

impl FromStr for CursorKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "since" => Ok(CursorKind::Since),
            "offset" => Ok(CursorKind::Offset),
            "job-offset" | "job_offset" | "job" => Ok(CursorKind::JobOffset),
            other => Err(ConfigError::UnknownCursor(other.to_string())),
        }
    }
}

impl fmt::Display for CursorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Cursor {
    pub fn kind(&self) -> CursorKind {
        match self {
            Cursor::SinceToken(_) => CursorKind::Since,
            Cursor::ByteOffset(_) => CursorKind::Offset,
            Cursor::JobHandle { .. } => CursorKind::JobOffset,
        }
    }

    pub fn position(&self) -> u64 {
        match self {
            Cursor::SinceToken(n) | Cursor::ByteOffset(n) => *n,
            Cursor::JobHandle { offset, .. } => *offset,
        }
    }

    pub fn job_id(&self) -> Option<&str> {
        match self {
            Cursor::JobHandle { job_id, .. } => Some(job_id),
            _ => None,
        }
    }

    /// Query parameters for the tail request.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        match self {
            Cursor::SinceToken(n) => vec![("since", n.to_string())],
            Cursor::ByteOffset(n) => vec![("offset", n.to_string())],
            Cursor::JobHandle { job_id, offset } => {
                vec![("job_id", job_id.clone()), ("offset", offset.to_string())]
            }
        }
    }

    /// Cursor for the next tail, read from the response.
    ///
    /// A missing field keeps the current position, and so does a value lower
    /// than the current one: the cursor never moves backwards.
    pub fn advance(&self, payload: &TailPayload) -> Cursor {
        let returned = match self {
            Cursor::SinceToken(_) => payload.next_since,
            Cursor::ByteOffset(_) | Cursor::JobHandle { .. } => payload.offset,
        };

        if let (Some(ours), Some(theirs)) = (self.job_id(), payload.job_id.as_deref()) {
            if ours != theirs {
                tracing::warn!(ours, theirs, "Tail response names a different job; keeping our handle");
            }
        }

        match returned {
            None => self.clone(),
            Some(next) if next < self.position() => {
                tracing::warn!(
                    current = self.position(),
                    returned = next,
                    "Ignoring cursor regression from tail response"
                );
                self.clone()
            }
            Some(next) => self.at(next),
        }
    }

    fn at(&self, position: u64) -> Cursor {
        match self {
            Cursor::SinceToken(_) => Cursor::SinceToken(position),
            Cursor::ByteOffset(_) => Cursor::ByteOffset(position),
            Cursor::JobHandle { job_id, .. } => Cursor::JobHandle {
                job_id: job_id.clone(),
                offset: position,
            },
        }
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cursor::SinceToken(n) => write!(f, "since={}", n),
            Cursor::ByteOffset(n) => write!(f, "offset={}", n),
            Cursor::JobHandle { job_id, offset } => write!(f, "job_id={} offset={}", job_id, offset),
        }
    }
}
