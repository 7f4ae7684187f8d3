//! # Error Types
//!
//! This module defines all error types for the note block player.
//!
//! Errors carry the key, block position or family involved so a failed
//! request can be reported with a specific reason.
//!
//! ## Error Types
//! - `NoteblockError` - Crate-wide error returned by every fallible operation
//! - `ActionError` - A primitive world action (play / increment) was not carried out
//!
//! ## Usage
//! ```rust
//! use noteblock::{NoteblockError, Song};
//!
//! match Song::from_json("{ not json") {
//!     Ok(song) => println!("Loaded {}", song.title),
//!     Err(NoteblockError::SongFile(e)) => eprintln!("Unreadable song file: {}", e),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use thiserror::Error;

use crate::instrument::InstrumentFamily;
use crate::world::BlockPos;

#[derive(Error, Debug)]
pub enum NoteblockError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The score could not be decoded into notes and tempo changes.
    ///
    /// # Example
    /// ```
    /// # use noteblock::NoteblockError;
    /// let err = NoteblockError::Decode("ppq must be positive".to_string());
    /// assert_eq!(err.to_string(), "Decode error: ppq must be positive");
    /// ```
    #[error("Decode error: {0}")]
    Decode(String),

    /// A persisted song breaks the ordering or partitioning rules of the song model.
    #[error("Invalid song: {0}")]
    InvalidSong(String),

    #[error("Song file error: {0}")]
    SongFile(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Config(String),

    /// A family's pool ran dry while binding keys.
    ///
    /// # Example
    /// ```
    /// # use noteblock::{InstrumentFamily, NoteblockError};
    /// let err = NoteblockError::Resource { family: InstrumentFamily::Bass, key: 40 };
    /// assert_eq!(err.to_string(), "Not enough bass blocks to bind key 40");
    /// ```
    #[error("Not enough {family} blocks to bind key {key}")]
    Resource { family: InstrumentFamily, key: u8 },

    #[error("Key {0} cannot be played on any instrument")]
    Unplayable(u8),

    #[error("Key {0} is bound to more than one block")]
    DuplicateBinding(u8),

    #[error("Tuning failed for block at {position}: {reason}")]
    Tuning { position: BlockPos, reason: String },

    #[error("Playback failed on key {key}: {source}")]
    PlaybackAction {
        key: u8,
        #[source]
        source: ActionError,
    },
}

impl From<midly::Error> for NoteblockError {
    fn from(e: midly::Error) -> Self {
        NoteblockError::Decode(e.to_string())
    }
}

/// Failure of a single play or increment action in the world.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    #[error("no note block at {0}")]
    BlockMissing(BlockPos),

    #[error("action at {position} rejected: {reason}")]
    Rejected { position: BlockPos, reason: String },
}

pub type Result<T> = std::result::Result<T, NoteblockError>;
