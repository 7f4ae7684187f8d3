//! # Song Module
//!
//! The immutable, time-partitioned song model and the builder that produces it.
//!
//! ## Purpose
//! A decoded score is a loose bag of per-track onsets plus a tempo map. The
//! scheduler wants something much simpler to walk: one ordered list of notes,
//! each knowing how long to wait before the next, grouped into sequences that
//! share a tempo.
//!
//! ## Sub-modules
//! - `types` - Song, Sequence, Note and the persisted JSON form
//! - `builder` - Flatten, order and partition decoded notes
//!
//! ## Type Hierarchy
//! ```text
//! Song (title, ppq)
//!   └── Vec<Sequence> (tempo, start ticks)  - start ticks strictly increasing
//!         └── Vec<Note> (key, onset, delta) - onsets non-decreasing
//! ```
//!
//! ## Example
//! ```rust
//! use noteblock::midi::{DecodedNote, DecodedScore, DecodedTrack, TempoChange};
//! use noteblock::song::build_song;
//!
//! let score = DecodedScore {
//!     name: Some("Scale".to_string()),
//!     ppq: 480,
//!     tracks: vec![DecodedTrack {
//!         notes: vec![
//!             DecodedNote { key: 64, ticks: 480 },
//!             DecodedNote { key: 60, ticks: 0 },
//!         ],
//!     }],
//!     tempos: vec![TempoChange { bpm: 120.0, ticks: 0 }],
//! };
//!
//! let song = build_song(None, &score, 120.0).unwrap();
//! assert_eq!(song.title, "Scale");
//! assert_eq!(song.sequences[0].notes[0].key, 60);
//! assert_eq!(song.sequences[0].notes[0].delta, 480);
//! ```

mod builder;
mod types;

#[cfg(test)]
mod tests;

pub use builder::build_song;
pub use types::{Note, Sequence, Song};
