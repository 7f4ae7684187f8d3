//! # Playback Module
//!
//! Walks a song in real time, handing each note to a play action.
//!
//! ## Sub-modules
//! - `types` - Lifecycle events, playback states and the pause handle
//! - `scheduler` - The timed note loop
//!
//! ## Timing
//! After each note the scheduler waits
//! `delta * 60000 / (tempo * ppq)` milliseconds on a tokio timer before the
//! next one. One note, including its wait, finishes before the next begins.
//!
//! ## Pausing
//! A [`PauseHandle`] exists from the moment the scheduler does, so playback can
//! be paused at any point after it starts. The flag is checked before every
//! note; a paused run reports the unplayed suffix of the song, which can be
//! played later to resume at the same note.
//!
//! ## Example
//! ```rust
//! use noteblock::playback::{Lifecycle, Scheduler};
//! use noteblock::{Note, Sequence, Song};
//!
//! # tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap().block_on(async {
//! let song = Song {
//!     title: "Two notes".to_string(),
//!     ppq: 480,
//!     sequences: vec![Sequence {
//!         tempo_bpm: 120.0,
//!         start_ticks: 0,
//!         notes: vec![
//!             Note { key: 60, onset: 0, delta: 240 },
//!             Note { key: 64, onset: 240, delta: 0 },
//!         ],
//!     }],
//! };
//!
//! let (mut scheduler, _pause) = Scheduler::start(song);
//! let mut played = Vec::new();
//! let outcome = scheduler
//!     .run(|note| { played.push(note.key); Ok(()) }, |_| {})
//!     .await;
//!
//! assert!(matches!(outcome, Lifecycle::End(_)));
//! assert_eq!(played, vec![60, 64]);
//! # });
//! ```

mod scheduler;
mod types;


pub use scheduler::Scheduler;
pub use types::{Lifecycle, PauseHandle, PlaybackState};
