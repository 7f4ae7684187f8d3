//! # Public API
//!
//! This module contains the entry point that turns a song request into sound.
//!
//! ## Pipeline
//! [`Player::play_song`] runs one request end to end:
//! 1. Resolve the source into a [`Song`] (decoding MIDI if needed)
//! 2. Work out which keys need blocks and whether the inventory covers them
//! 3. Bind keys to blocks
//! 4. Tune every bound block, one at a time
//! 5. Play the song, sounding each note on its bound block
//!
//! A request that lacks blocks reports `Missing` and never touches the world.
//!
//! ## Typical Usage
//!
//! ```rust
//! use noteblock::discovery::discover;
//! use noteblock::sim::SimWorld;
//! use noteblock::{BlockPos, InstrumentTable, Lifecycle, Note, Player, PlayerConfig, Sequence, Song, SongSource};
//!
//! # tokio::runtime::Builder::new_current_thread().enable_time().start_paused(true).build().unwrap().block_on(async {
//! let (mut world, mut observations) = SimWorld::new(InstrumentTable::default());
//! world.place_note_block(BlockPos::new(1, 0, 0), "dirt", 0);
//!
//! let blocks = discover(&world, BlockPos::new(0, 0, 0), 5, &InstrumentTable::default());
//! let song = Song {
//!     title: "One note".to_string(),
//!     ppq: 480,
//!     sequences: vec![Sequence {
//!         tempo_bpm: 120.0,
//!         start_ticks: 0,
//!         notes: vec![Note { key: 60, onset: 0, delta: 0 }],
//!     }],
//! };
//!
//! let mut player = Player::new(&mut world, &mut observations, PlayerConfig::default());
//! let outcome = player
//!     .play_song(SongSource::Song(song), &blocks, |event| println!("{}", event))
//!     .await?;
//! assert!(matches!(outcome, Lifecycle::End(_)));
//! # Ok::<(), noteblock::NoteblockError>(())
//! # }).unwrap();
//! ```

use std::path::Path;
use tracing::{debug, info, warn};

use crate::allocation::{assign, key_map, missing_families, playable_keys, shortfall};
use crate::config::PlayerConfig;
use crate::error::{NoteblockError, Result};
use crate::midi::DecodedScore;
use crate::playback::{Lifecycle, PauseHandle, Scheduler};
use crate::song::{build_song, Song};
use crate::tuning::Tuner;
use crate::world::{Observations, PhysicalBlock, World};

/// Where a song comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum SongSource {
    /// Raw Standard MIDI File bytes, with an optional title override.
    Midi { bytes: Vec<u8>, title: Option<String> },
    /// An already built song.
    Song(Song),
}

impl SongSource {
    /// Read a source from disk.
    ///
    /// `.mid` and `.midi` files are kept as MIDI bytes; anything else is
    /// loaded as a persisted JSON song.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let is_midi = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("mid") || ext.eq_ignore_ascii_case("midi"))
            .unwrap_or(false);

        if is_midi {
            Ok(SongSource::Midi {
                bytes: std::fs::read(path)?,
                title: None,
            })
        } else {
            Ok(SongSource::Song(Song::load(path)?))
        }
    }

    /// Produce the song, decoding MIDI with the configured default tempo.
    pub fn resolve(self, config: &PlayerConfig) -> Result<Song> {
        match self {
            SongSource::Song(song) => Ok(song),
            SongSource::Midi { bytes, title } => {
                let score = DecodedScore::parse(&bytes)?;
                build_song(title.as_deref(), &score, config.default_tempo)
            }
        }
    }
}

/// Plays songs on the note blocks of one world.
///
/// The player borrows the world and its observation stream for as long as it
/// lives, so only one request can be in flight at a time.
pub struct Player<'a, W: World + ?Sized> {
    world: &'a mut W,
    observations: &'a mut Observations,
    config: PlayerConfig,
    pause: PauseHandle,
}

impl<'a, W: World + ?Sized> Player<'a, W> {
    pub fn new(world: &'a mut W, observations: &'a mut Observations, config: PlayerConfig) -> Self {
        Self {
            world,
            observations,
            config,
            pause: PauseHandle::new(),
        }
    }

    /// Handle that pauses the current (or next) song before its next note.
    pub fn pause_handle(&self) -> PauseHandle {
        self.pause.clone()
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// Play one song on `available` blocks.
    ///
    /// `on_event` sees `Start` (if playback begins) and the terminal event,
    /// which is also returned.
    ///
    /// # Errors
    /// A source that cannot be resolved, or an allocation that fails after
    /// the inventory check passed, is reported as `Lifecycle::Error` and
    /// returned as `Err`. Tuning and playback failures end in
    /// `Ok(Lifecycle::Error(..))`.
    pub async fn play_song<F>(
        &mut self,
        source: SongSource,
        available: &[PhysicalBlock],
        mut on_event: F,
    ) -> Result<Lifecycle>
    where
        F: FnMut(&Lifecycle),
    {
        let song = match source.resolve(&self.config) {
            Ok(song) => song,
            Err(e) => return Err(report_error(e, &mut on_event)),
        };

        let keys = playable_keys(&song);
        debug!("Song '{}' needs {} distinct keys", song.title, keys.len());

        let short = shortfall(available, &keys);
        if !short.is_empty() {
            let missing = Lifecycle::Missing(missing_families(&short));
            info!("Cannot play '{}': {}", song.title, missing);
            on_event(&missing);
            return Ok(missing);
        }

        let bound = assign(available, &keys).and_then(|assigned| {
            let bindings = key_map(&assigned)?;
            Ok((assigned, bindings))
        });
        let (mut assigned, bindings) = match bound {
            Ok(bound) => bound,
            Err(e) => return Err(report_error(e, &mut on_event)),
        };

        let tuned = {
            let mut tuner = Tuner::new(&mut *self.world, &mut *self.observations, &self.config);
            tuner.tune_all(&mut assigned).await
        };
        if let Err(e) = tuned {
            warn!("Aborting '{}': {}", song.title, e);
            let error = Lifecycle::Error(e.to_string());
            on_event(&error);
            return Ok(error);
        }

        let world = &mut *self.world;
        let mut scheduler = Scheduler::with_pause_handle(song, self.pause.clone());
        let outcome = scheduler
            .run(
                |note| {
                    let Some(position) = bindings.get(&note.key) else {
                        return Ok(());
                    };
                    world
                        .dispatch_play(*position)
                        .map_err(|source| NoteblockError::PlaybackAction { key: note.key, source })
                },
                &mut on_event,
            )
            .await;
        Ok(outcome)
    }
}

fn report_error<F: FnMut(&Lifecycle)>(error: NoteblockError, on_event: &mut F) -> NoteblockError {
    warn!("Request failed: {}", error);
    on_event(&Lifecycle::Error(error.to_string()));
    error
}
