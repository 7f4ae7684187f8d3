//! Song model type definitions
//!
//! The serialized field names (`tempo`, `ticks`, `difference`) are the
//! persisted song file format and must not change.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::error::{NoteblockError, Result};

/// A single note onset.
///
/// # Fields
/// - `key`: MIDI key (0-127)
/// - `onset`: Absolute tick the note starts on
/// - `delta`: Ticks until the next note in the song, 0 for the last note
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub key: u8,
    #[serde(rename = "ticks")]
    pub onset: u64,
    #[serde(rename = "difference")]
    pub delta: u64,
}

/// A run of notes sharing one tempo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sequence {
    #[serde(rename = "tempo")]
    pub tempo_bpm: f64,
    #[serde(rename = "ticks")]
    pub start_ticks: u64,
    pub notes: Vec<Note>,
}

impl Sequence {
    /// Wall-clock wait after `note`, in milliseconds, at this sequence's tempo.
    ///
    /// # Example
    /// ```
    /// use noteblock::{Note, Sequence};
    ///
    /// let note = Note { key: 60, onset: 0, delta: 240 };
    /// let sequence = Sequence { tempo_bpm: 120.0, start_ticks: 0, notes: vec![note] };
    ///
    /// // Half a beat at 120 BPM
    /// assert_eq!(sequence.delay_ms(&note, 480), 250.0);
    /// ```
    pub fn delay_ms(&self, note: &Note, ppq: u16) -> f64 {
        note.delta as f64 * 60_000.0 / (self.tempo_bpm * ppq as f64)
    }
}

/// A complete song, ready for allocation and playback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub title: String,
    /// Ticks per quarter note.
    pub ppq: u16,
    pub sequences: Vec<Sequence>,
}

impl Song {
    /// All notes in playback order.
    pub fn notes(&self) -> impl Iterator<Item = &Note> {
        self.sequences.iter().flat_map(|s| s.notes.iter())
    }

    pub fn note_count(&self) -> usize {
        self.sequences.iter().map(|s| s.notes.len()).sum()
    }

    /// Distinct keys in the order they are first played.
    pub fn key_range(&self) -> Vec<u8> {
        let mut seen = HashSet::new();
        self.notes()
            .map(|n| n.key)
            .filter(|key| seen.insert(*key))
            .collect()
    }

    /// Time from the first note to the last, in milliseconds.
    pub fn duration_ms(&self) -> f64 {
        self.sequences
            .iter()
            .flat_map(|s| s.notes.iter().map(move |n| s.delay_ms(n, self.ppq)))
            .sum()
    }

    /// The unplayed remainder of the song, starting at `note` within `sequence`.
    ///
    /// Used as the continuation when playback pauses. Indices past the end
    /// give a song with no sequences.
    pub fn remaining_from(&self, sequence: usize, note: usize) -> Song {
        let mut sequences = Vec::new();
        if let Some(current) = self.sequences.get(sequence) {
            let rest: Vec<Note> = current.notes.iter().skip(note).copied().collect();
            if !rest.is_empty() {
                sequences.push(Sequence {
                    tempo_bpm: current.tempo_bpm,
                    start_ticks: current.start_ticks,
                    notes: rest,
                });
            }
            sequences.extend(self.sequences.iter().skip(sequence + 1).cloned());
        }
        Song {
            title: self.title.clone(),
            ppq: self.ppq,
            sequences,
        }
    }

    /// Check ordering and partitioning rules.
    ///
    /// # Rules
    /// - ppq and every tempo are positive
    /// - sequence start ticks strictly increase
    /// - every note lies inside its sequence's tick window
    /// - onsets never decrease and each delta reaches the next onset
    /// - keys are valid MIDI keys
    pub fn validate(&self) -> Result<()> {
        if self.ppq == 0 {
            return Err(NoteblockError::InvalidSong("ppq must be positive".to_string()));
        }

        let mut previous: Option<&Note> = None;
        for (i, sequence) in self.sequences.iter().enumerate() {
            if !(sequence.tempo_bpm.is_finite() && sequence.tempo_bpm > 0.0) {
                return Err(NoteblockError::InvalidSong(format!(
                    "sequence {} has tempo {}",
                    i, sequence.tempo_bpm
                )));
            }

            let next_start = self.sequences.get(i + 1).map(|s| s.start_ticks);
            if let Some(next) = next_start {
                if next <= sequence.start_ticks {
                    return Err(NoteblockError::InvalidSong(format!(
                        "sequence {} starts at tick {} but the next starts at {}",
                        i, sequence.start_ticks, next
                    )));
                }
            }

            for note in &sequence.notes {
                if note.key > 127 {
                    return Err(NoteblockError::InvalidSong(format!("key {} out of range", note.key)));
                }
                let in_window = note.onset >= sequence.start_ticks
                    && next_start.map_or(true, |next| note.onset < next);
                if !in_window {
                    return Err(NoteblockError::InvalidSong(format!(
                        "note at tick {} lies outside sequence {}",
                        note.onset, i
                    )));
                }
                if let Some(prev) = previous {
                    let reaches = prev.onset.checked_add(prev.delta) == Some(note.onset);
                    if note.onset < prev.onset || !reaches {
                        return Err(NoteblockError::InvalidSong(format!(
                            "note at tick {} does not follow note at tick {} (difference {})",
                            note.onset, prev.onset, prev.delta
                        )));
                    }
                }
                previous = Some(note);
            }
        }

        if let Some(last) = previous {
            if last.delta != 0 {
                return Err(NoteblockError::InvalidSong(format!(
                    "last note has difference {}",
                    last.delta
                )));
            }
        }
        Ok(())
    }

    /// Parse and validate a persisted song.
    pub fn from_json(content: &str) -> Result<Self> {
        let song: Song = serde_json::from_str(content)?;
        song.validate()?;
        Ok(song)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path.as_ref(), self.to_json()?)?;
        Ok(())
    }
}
