//! Playback type definitions

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::instrument::InstrumentFamily;
use crate::song::Song;

/// Lifecycle events of a play request.
///
/// `Start` is reported once playback begins. Exactly one of the other
/// variants ends every request.
///
/// # Payloads
/// - `Start` / `End`: the song being played
/// - `Pause`: the unplayed remainder, playable later to resume
/// - `Error`: why the request was aborted
/// - `Missing`: one entry per block the inventory lacks
#[derive(Debug, Clone, PartialEq)]
pub enum Lifecycle {
    Start(Song),
    End(Song),
    Pause(Song),
    Error(String),
    Missing(Vec<InstrumentFamily>),
}

impl Lifecycle {
    /// Short name of the event: `start`, `end`, `pause`, `error` or `missing`.
    pub fn reason(&self) -> &'static str {
        match self {
            Lifecycle::Start(_) => "start",
            Lifecycle::End(_) => "end",
            Lifecycle::Pause(_) => "pause",
            Lifecycle::Error(_) => "error",
            Lifecycle::Missing(_) => "missing",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Lifecycle::Start(_))
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lifecycle::Start(song) | Lifecycle::End(song) => {
                write!(f, "{} '{}' ({} notes)", self.reason(), song.title, song.note_count())
            }
            Lifecycle::Pause(rest) => write!(f, "pause ({} notes left)", rest.note_count()),
            Lifecycle::Error(reason) => write!(f, "error: {}", reason),
            Lifecycle::Missing(families) => {
                let names: Vec<&str> = families.iter().map(|f| f.short_name()).collect();
                write!(f, "missing [{}]", names.join(", "))
            }
        }
    }
}

/// Where a scheduler is in its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Playing,
    Paused,
    Finished,
    Errored,
}

/// Shared pause flag for a running song.
///
/// Cloning gives another handle to the same flag.
#[derive(Debug, Clone, Default)]
pub struct PauseHandle(Arc<AtomicBool>);

impl PauseHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask playback to stop before its next note.
    pub fn pause(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Clear the flag so a continuation can be played.
    pub fn resume(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_paused(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
