//! The timed note loop

use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::types::{Lifecycle, PauseHandle, PlaybackState};
use crate::error::Result;
use crate::song::{Note, Song};

/// Plays one song, note by note, at its tempo.
pub struct Scheduler {
    song: Song,
    pause: PauseHandle,
    state: PlaybackState,
}

impl Scheduler {
    pub fn new(song: Song) -> Self {
        Self::with_pause_handle(song, PauseHandle::new())
    }

    /// Use an existing pause flag, e.g. one handed out before the song was known.
    pub fn with_pause_handle(song: Song, pause: PauseHandle) -> Self {
        Self {
            song,
            pause,
            state: PlaybackState::Idle,
        }
    }

    /// Create a scheduler together with the handle that pauses it.
    pub fn start(song: Song) -> (Self, PauseHandle) {
        let scheduler = Self::new(song);
        let pause = scheduler.pause_handle();
        (scheduler, pause)
    }

    pub fn pause_handle(&self) -> PauseHandle {
        self.pause.clone()
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn song(&self) -> &Song {
        &self.song
    }

    /// Play the song to the end, a pause, or the first failed play action.
    ///
    /// `play` is called once per note in order. `on_event` receives `Start`
    /// and then the terminal event, which is also returned.
    pub async fn run<P, E>(&mut self, mut play: P, mut on_event: E) -> Lifecycle
    where
        P: FnMut(&Note) -> Result<()>,
        E: FnMut(&Lifecycle),
    {
        self.state = PlaybackState::Playing;
        let start = Lifecycle::Start(self.song.clone());
        info!("Playback {}", start);
        on_event(&start);

        let ppq = self.song.ppq;
        for (seq_index, sequence) in self.song.sequences.iter().enumerate() {
            let mut played = 0;

            for (note_index, note) in sequence.notes.iter().enumerate() {
                if self.pause.is_paused() {
                    let rest = self.song.remaining_from(seq_index, note_index);
                    return self.finish(PlaybackState::Paused, Lifecycle::Pause(rest), &mut on_event);
                }

                if let Err(e) = play(note) {
                    warn!("Play action failed on key {}: {}", note.key, e);
                    return self.finish(
                        PlaybackState::Errored,
                        Lifecycle::Error(e.to_string()),
                        &mut on_event,
                    );
                }
                played += 1;

                let wait = sequence.delay_ms(note, ppq);
                debug!("Played key {} at tick {}, next in {:.1} ms", note.key, note.onset, wait);
                if wait > 0.0 {
                    sleep(Duration::from_secs_f64(wait / 1000.0)).await;
                }
            }

            if played < sequence.notes.len() {
                let reason = format!(
                    "sequence {} ended after {} of {} notes",
                    seq_index,
                    played,
                    sequence.notes.len()
                );
                return self.finish(PlaybackState::Errored, Lifecycle::Error(reason), &mut on_event);
            }
        }

        let end = Lifecycle::End(self.song.clone());
        self.finish(PlaybackState::Finished, end, &mut on_event)
    }

    fn finish<E: FnMut(&Lifecycle)>(
        &mut self,
        state: PlaybackState,
        event: Lifecycle,
        on_event: &mut E,
    ) -> Lifecycle {
        self.state = state;
        info!("Playback {}", event);
        on_event(&event);
        event
    }
}
