//! MIDI file decoding
//!
//! Reads a Standard MIDI File with `midly` and flattens it into per-track note
//! onsets and a tempo map, both in absolute ticks. Nothing is sorted or merged
//! here; that is the song builder's job.

use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
use std::path::Path;
use tracing::debug;

use crate::error::{NoteblockError, Result};

/// A note onset in absolute ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedNote {
    pub key: u8,
    pub ticks: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedTrack {
    pub notes: Vec<DecodedNote>,
}

/// A tempo change taking effect at `ticks`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempoChange {
    pub bpm: f64,
    pub ticks: u64,
}

/// Structured contents of a score, ready for the song builder.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedScore {
    /// First track name found in the file, if any.
    pub name: Option<String>,
    /// Ticks per quarter note.
    pub ppq: u16,
    pub tracks: Vec<DecodedTrack>,
    pub tempos: Vec<TempoChange>,
}

impl DecodedScore {
    /// Load and decode a MIDI file from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read(path.as_ref())?;
        Self::parse(&data)
    }

    /// Decode a MIDI file from bytes.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let smf = Smf::parse(data)?;

        let ppq = match smf.header.timing {
            Timing::Metrical(tpq) => tpq.as_int(),
            Timing::Timecode(_, _) => {
                return Err(NoteblockError::Decode(
                    "SMPTE timecode timing is not supported".to_string(),
                ));
            }
        };
        if ppq == 0 {
            return Err(NoteblockError::Decode("ppq must be positive".to_string()));
        }

        let mut name = None;
        let mut tracks = Vec::with_capacity(smf.tracks.len());
        let mut tempos = Vec::new();

        for track in smf.tracks.iter() {
            let mut ticks = 0u64;
            let mut notes = Vec::new();

            for event in track.iter() {
                ticks += event.delta.as_int() as u64;
                match event.kind {
                    TrackEventKind::Midi {
                        message: MidiMessage::NoteOn { key, vel },
                        ..
                    } if vel.as_int() > 0 => {
                        notes.push(DecodedNote {
                            key: key.as_int(),
                            ticks,
                        });
                    }
                    TrackEventKind::Meta(MetaMessage::Tempo(micros)) => {
                        let micros = micros.as_int();
                        if micros == 0 {
                            return Err(NoteblockError::Decode(format!(
                                "zero-length tempo at tick {}",
                                ticks
                            )));
                        }
                        tempos.push(TempoChange {
                            bpm: 60_000_000.0 / micros as f64,
                            ticks,
                        });
                    }
                    TrackEventKind::Meta(MetaMessage::TrackName(raw)) if name.is_none() => {
                        let text = String::from_utf8_lossy(raw).trim().to_string();
                        if !text.is_empty() {
                            name = Some(text);
                        }
                    }
                    _ => {}
                }
            }

            tracks.push(DecodedTrack { notes });
        }

        debug!(
            "Decoded MIDI file: {} tracks, {} notes, {} tempo changes, ppq {}",
            tracks.len(),
            tracks.iter().map(|t| t.notes.len()).sum::<usize>(),
            tempos.len(),
            ppq
        );

        Ok(Self {
            name,
            ppq,
            tracks,
            tempos,
        })
    }
}
