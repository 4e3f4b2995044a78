//! Run progress events and cooperative cancellation.
//!
//! The engine reports progress as a stream of discrete events a caller may
//! consume from another thread to drive a front end. Emission is
//! best-effort and never blocks: a slow or absent consumer only loses
//! events, it cannot stall a run.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;

use serde::Serialize;

use crate::model::MatchStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Parsing,
    LoadingCatalog,
    Matching,
    Exporting,
    Mutating,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parsing => write!(f, "parsing"),
            Self::LoadingCatalog => write!(f, "loading catalog"),
            Self::Matching => write!(f, "matching"),
            Self::Exporting => write!(f, "exporting"),
            Self::Mutating => write!(f, "mutating"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Team,
    Rider,
}

/// One progress event. Record events within a stage follow document order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunEvent {
    StageStarted {
        stage: Stage,
    },
    RecordMatched {
        kind: RecordKind,
        name: String,
        status: MatchStatus,
    },
    StageCompleted {
        stage: Stage,
    },
    RunFailed {
        error: String,
    },
}

/// Event consumer. Implementations must not block.
pub trait EventSink {
    fn emit(&self, event: RunEvent);
}

/// Discards every event.
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: RunEvent) {}
}

/// Unbounded channel sink. Sending never blocks; once the receiver is
/// gone, events are dropped silently.
impl EventSink for Sender<RunEvent> {
    fn emit(&self, event: RunEvent) {
        let _ = self.send(event);
    }
}

/// Cooperative cancellation flag, checked at stage boundaries only.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn channel_sink_delivers_in_order() {
        let (tx, rx) = mpsc::channel();
        tx.emit(RunEvent::StageStarted {
            stage: Stage::Parsing,
        });
        tx.emit(RunEvent::StageCompleted {
            stage: Stage::Parsing,
        });
        assert_eq!(
            rx.recv().unwrap(),
            RunEvent::StageStarted {
                stage: Stage::Parsing
            }
        );
        assert_eq!(
            rx.recv().unwrap(),
            RunEvent::StageCompleted {
                stage: Stage::Parsing
            }
        );
    }

    #[test]
    fn emit_after_receiver_dropped_is_silent() {
        let (tx, rx) = mpsc::channel();
        drop(rx);
        tx.emit(RunEvent::RunFailed {
            error: "late".into(),
        });
    }

    #[test]
    fn cancel_token_is_shared() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!token.is_cancelled());
        clone.cancel();
        assert!(token.is_cancelled());
    }
}
