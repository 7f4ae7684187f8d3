pub mod allocation;
pub mod api;
pub mod config;
pub mod discovery;
pub mod error;
pub mod instrument;
pub mod midi;
pub mod playback;
pub mod sim;
pub mod song;
pub mod tuning;
pub mod world;

pub use api::{Player, SongSource};
pub use config::{MaterialConfig, PlayerConfig};
pub use error::*;
pub use instrument::{family_of, pitch_of, tuning_step_of, InstrumentFamily, InstrumentTable};
pub use playback::{Lifecycle, PauseHandle, PlaybackState};
pub use song::{build_song, Note, Sequence, Song};
pub use world::{BlockPos, NoteHeard, Observations, PhysicalBlock, World};

/// Decode a Standard MIDI File into a song.
/// The title falls back to the file's track name.
pub fn convert(bytes: &[u8], title: Option<&str>, default_tempo: f64) -> Result<Song> {
    let score = midi::DecodedScore::parse(bytes)?;
    build_song(title, &score, default_tempo)
}

/// Decode a MIDI file from disk and save it as a JSON song file.
pub fn convert_file(
    midi_path: impl AsRef<std::path::Path>,
    out_path: impl AsRef<std::path::Path>,
    title: Option<&str>,
) -> Result<Song> {
    let score = midi::DecodedScore::load(midi_path)?;
    let song = build_song(title, &score, PlayerConfig::default().default_tempo)?;
    song.save(out_path)?;
    Ok(song)
}
