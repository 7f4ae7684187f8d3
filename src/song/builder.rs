//! Song building
//!
//! Turns a decoded score into a [`Song`]:
//! 1. Flatten every track's notes into one list
//! 2. Stable-sort by onset, so chord notes keep their decoded order
//! 3. Set each note's delta to the gap before the next note (0 for the last)
//! 4. Split the list into sequences at tempo changes

use tracing::debug;

use super::types::{Note, Sequence, Song};
use crate::error::{NoteblockError, Result};
use crate::midi::{DecodedScore, TempoChange};

/// Build a song from a decoded score.
///
/// # Parameters
/// - `title`: Song title; falls back to the score's track name, then to an empty string
/// - `score`: Decoded notes and tempo map
/// - `default_tempo`: BPM used where the score gives none
///
/// # Tempo Segments
/// Each note belongs to the last tempo change at or before its onset. When
/// notes start before the first tempo change, a `default_tempo` sequence at
/// tick 0 covers them. Several changes on the same tick collapse to the last.
///
/// # Errors
/// Returns [`NoteblockError::Decode`] for a zero ppq, a non-positive tempo or
/// a key above 127.
pub fn build_song(title: Option<&str>, score: &DecodedScore, default_tempo: f64) -> Result<Song> {
    if score.ppq == 0 {
        return Err(NoteblockError::Decode("ppq must be positive".to_string()));
    }
    if !(default_tempo.is_finite() && default_tempo > 0.0) {
        return Err(NoteblockError::Decode(format!("invalid default tempo {}", default_tempo)));
    }

    let notes = collect_notes(score)?;
    let first_onset = notes.first().map(|n| n.onset);
    let segments = tempo_segments(&score.tempos, first_onset, default_tempo)?;
    let sequences = partition(notes, &segments);

    let title = title
        .map(str::to_string)
        .or_else(|| score.name.clone())
        .unwrap_or_default();

    debug!(
        "Built song '{}': {} sequences, {} notes",
        title,
        sequences.len(),
        sequences.iter().map(|s| s.notes.len()).sum::<usize>()
    );

    Ok(Song {
        title,
        ppq: score.ppq,
        sequences,
    })
}

/// Flatten, order and link every note in the score.
fn collect_notes(score: &DecodedScore) -> Result<Vec<Note>> {
    let mut notes = Vec::new();
    for track in &score.tracks {
        for decoded in &track.notes {
            if decoded.key > 127 {
                return Err(NoteblockError::Decode(format!(
                    "key {} at tick {} is not a MIDI key",
                    decoded.key, decoded.ticks
                )));
            }
            notes.push(Note {
                key: decoded.key,
                onset: decoded.ticks,
                delta: 0,
            });
        }
    }

    // sort_by_key is stable
    notes.sort_by_key(|n| n.onset);

    for i in 1..notes.len() {
        notes[i - 1].delta = notes[i].onset - notes[i - 1].onset;
    }
    Ok(notes)
}

/// Ordered tempo changes with strictly increasing ticks.
fn tempo_segments(
    tempos: &[TempoChange],
    first_onset: Option<u64>,
    default_tempo: f64,
) -> Result<Vec<TempoChange>> {
    let mut sorted = tempos.to_vec();
    sorted.sort_by_key(|t| t.ticks);

    let mut segments: Vec<TempoChange> = Vec::with_capacity(sorted.len() + 1);
    for tempo in sorted {
        if !(tempo.bpm.is_finite() && tempo.bpm > 0.0) {
            return Err(NoteblockError::Decode(format!(
                "invalid tempo {} at tick {}",
                tempo.bpm, tempo.ticks
            )));
        }
        match segments.last_mut() {
            Some(last) if last.ticks == tempo.ticks => *last = tempo,
            _ => segments.push(tempo),
        }
    }

    let needs_default = match (segments.first(), first_onset) {
        (None, _) => true,
        (Some(first), Some(onset)) => onset < first.ticks,
        (Some(_), None) => false,
    };
    if needs_default {
        segments.insert(
            0,
            TempoChange {
                bpm: default_tempo,
                ticks: 0,
            },
        );
    }
    Ok(segments)
}

/// Assign each note to the last segment starting at or before its onset.
fn partition(notes: Vec<Note>, segments: &[TempoChange]) -> Vec<Sequence> {
    let mut sequences: Vec<Sequence> = segments
        .iter()
        .map(|t| Sequence {
            tempo_bpm: t.bpm,
            start_ticks: t.ticks,
            notes: Vec::new(),
        })
        .collect();

    let mut current = 0;
    for note in notes {
        while current + 1 < sequences.len() && sequences[current + 1].start_ticks <= note.onset {
            current += 1;
        }
        sequences[current].notes.push(note);
    }
    sequences
}
