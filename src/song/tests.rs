use super::*;
use crate::error::NoteblockError;
use crate::midi::{DecodedNote, DecodedScore, DecodedTrack, TempoChange};

fn score(tracks: Vec<Vec<(u8, u64)>>, tempos: Vec<(f64, u64)>) -> DecodedScore {
    DecodedScore {
        name: None,
        ppq: 480,
        tracks: tracks
            .into_iter()
            .map(|notes| DecodedTrack {
                notes: notes
                    .into_iter()
                    .map(|(key, ticks)| DecodedNote { key, ticks })
                    .collect(),
            })
            .collect(),
        tempos: tempos
            .into_iter()
            .map(|(bpm, ticks)| TempoChange { bpm, ticks })
            .collect(),
    }
}

fn keys(song: &Song) -> Vec<u8> {
    song.notes().map(|n| n.key).collect()
}

#[test]
fn test_build_merges_and_orders_tracks() {
    let input = score(
        vec![vec![(60, 0), (64, 960)], vec![(67, 480), (72, 1440)]],
        vec![(120.0, 0)],
    );
    let result = build_song(Some("Merge"), &input, 120.0);
    assert!(result.is_ok());
    let song = result.unwrap();

    assert_eq!(song.title, "Merge");
    assert_eq!(song.sequences.len(), 1);
    assert_eq!(keys(&song), vec![60, 67, 64, 72]);

    let deltas: Vec<u64> = song.notes().map(|n| n.delta).collect();
    assert_eq!(deltas, vec![480, 480, 480, 0]);
    assert!(song.validate().is_ok());
}

#[test]
fn test_chord_notes_keep_decoded_order() {
    // Three tracks strike on the same tick; their relative order must survive sorting
    let input = score(
        vec![vec![(72, 0), (50, 480)], vec![(64, 0)], vec![(60, 0)]],
        vec![],
    );
    let song = build_song(None, &input, 120.0).unwrap();

    assert_eq!(keys(&song), vec![72, 64, 60, 50]);
    let deltas: Vec<u64> = song.notes().map(|n| n.delta).collect();
    assert_eq!(deltas, vec![0, 0, 480, 0]);
}

#[test]
fn test_no_tempo_gives_single_default_sequence() {
    let input = score(vec![vec![(60, 0), (62, 100), (64, 200)]], vec![]);
    let song = build_song(None, &input, 90.0).unwrap();

    assert_eq!(song.sequences.len(), 1);
    assert_eq!(song.sequences[0].tempo_bpm, 90.0);
    assert_eq!(song.sequences[0].start_ticks, 0);
    assert_eq!(song.sequences[0].notes.len(), 3);
}

#[test]
fn test_partition_at_tempo_changes() {
    let input = score(
        vec![vec![(60, 0), (61, 479), (62, 480), (63, 900), (64, 960), (65, 2000)]],
        vec![(120.0, 0), (90.0, 480), (60.0, 960)],
    );
    let song = build_song(None, &input, 120.0).unwrap();

    assert_eq!(song.sequences.len(), 3);
    assert_eq!(song.sequences[0].notes.iter().map(|n| n.key).collect::<Vec<_>>(), vec![60, 61]);
    assert_eq!(song.sequences[1].notes.iter().map(|n| n.key).collect::<Vec<_>>(), vec![62, 63]);
    assert_eq!(song.sequences[2].notes.iter().map(|n| n.key).collect::<Vec<_>>(), vec![64, 65]);
    assert_eq!(song.sequences[1].tempo_bpm, 90.0);

    // Deltas run across sequence boundaries
    assert_eq!(song.sequences[0].notes[1].delta, 1);
    assert!(song.validate().is_ok());
}

#[test]
fn test_partition_loses_and_duplicates_nothing() {
    let mut tracks = Vec::new();
    for t in 0..4u64 {
        tracks.push((0..25u64).map(|i| ((30 + (i * 7 + t) % 60) as u8, (i * 37 + t * 11) % 3000)).collect());
    }
    let input = score(tracks, vec![(100.0, 500), (140.0, 0), (80.0, 1500), (200.0, 1500)]);
    let song = build_song(None, &input, 120.0).unwrap();

    assert_eq!(song.note_count(), 100);
    let mut expected: Vec<(u64, u8)> = input
        .tracks
        .iter()
        .flat_map(|t| t.notes.iter().map(|n| (n.ticks, n.key)))
        .collect();
    let mut actual: Vec<(u64, u8)> = song.notes().map(|n| (n.onset, n.key)).collect();
    expected.sort();
    actual.sort();
    assert_eq!(actual, expected);

    // Tempos at the same tick collapse to the last one listed
    assert_eq!(song.sequences.len(), 3);
    assert_eq!(song.sequences[2].start_ticks, 1500);
    assert_eq!(song.sequences[2].tempo_bpm, 200.0);
    assert!(song.validate().is_ok());
}

#[test]
fn test_notes_before_first_tempo_get_default_sequence() {
    let input = score(vec![vec![(60, 0), (62, 600)]], vec![(80.0, 480)]);
    let song = build_song(None, &input, 120.0).unwrap();

    assert_eq!(song.sequences.len(), 2);
    assert_eq!(song.sequences[0].start_ticks, 0);
    assert_eq!(song.sequences[0].tempo_bpm, 120.0);
    assert_eq!(song.sequences[0].notes[0].key, 60);
    assert_eq!(song.sequences[1].tempo_bpm, 80.0);
    assert_eq!(song.sequences[1].notes[0].key, 62);
}

#[test]
fn test_late_first_tempo_without_earlier_notes() {
    let input = score(vec![vec![(60, 500)]], vec![(80.0, 480)]);
    let song = build_song(None, &input, 120.0).unwrap();

    assert_eq!(song.sequences.len(), 1);
    assert_eq!(song.sequences[0].start_ticks, 480);
    assert!(song.validate().is_ok());
}

#[test]
fn test_title_falls_back_to_track_name() {
    let mut input = score(vec![vec![(60, 0)]], vec![]);
    input.name = Some("Night of Nights".to_string());

    assert_eq!(build_song(None, &input, 120.0).unwrap().title, "Night of Nights");
    assert_eq!(build_song(Some("Custom"), &input, 120.0).unwrap().title, "Custom");
}

#[test]
fn test_build_rejects_bad_input() {
    let mut input = score(vec![vec![(60, 0)]], vec![(0.0, 0)]);
    assert!(matches!(build_song(None, &input, 120.0), Err(NoteblockError::Decode(_))));

    input.tempos.clear();
    input.ppq = 0;
    assert!(matches!(build_song(None, &input, 120.0), Err(NoteblockError::Decode(_))));

    let input = score(vec![vec![(200, 0)]], vec![]);
    assert!(matches!(build_song(None, &input, 120.0), Err(NoteblockError::Decode(_))));
}

#[test]
fn test_key_range_is_first_occurrence_order() {
    let input = score(vec![vec![(64, 0), (60, 10), (64, 20), (67, 30), (60, 40)]], vec![]);
    let song = build_song(None, &input, 120.0).unwrap();
    assert_eq!(song.key_range(), vec![64, 60, 67]);
}

#[test]
fn test_duration_uses_each_sequence_tempo() {
    let input = score(vec![vec![(60, 0), (62, 480), (64, 960)]], vec![(120.0, 0), (60.0, 480)]);
    let song = build_song(None, &input, 120.0).unwrap();
    // One beat at 120 BPM then one beat at 60 BPM
    assert_eq!(song.duration_ms(), 1500.0);
}

#[test]
fn test_remaining_from_keeps_suffix() {
    let input = score(vec![vec![(60, 0), (62, 100), (64, 500), (65, 600)]], vec![(120.0, 0), (100.0, 500)]);
    let song = build_song(Some("Suffix"), &input, 120.0).unwrap();

    let rest = song.remaining_from(0, 1);
    assert_eq!(rest.title, "Suffix");
    assert_eq!(rest.sequences.len(), 2);
    assert_eq!(keys(&rest), vec![62, 64, 65]);
    assert!(rest.validate().is_ok());

    let rest = song.remaining_from(1, 0);
    assert_eq!(keys(&rest), vec![64, 65]);

    let rest = song.remaining_from(0, 0);
    assert_eq!(rest, song);

    let rest = song.remaining_from(5, 0);
    assert!(rest.sequences.is_empty());
}

#[test]
fn test_json_shape() {
    let input = score(vec![vec![(60, 0), (64, 240)]], vec![(120.0, 0)]);
    let song = build_song(Some("Shape"), &input, 120.0).unwrap();
    let json = song.to_json().unwrap();

    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["title"], "Shape");
    assert_eq!(value["ppq"], 480);
    assert_eq!(value["sequences"][0]["tempo"], 120.0);
    assert_eq!(value["sequences"][0]["ticks"], 0);
    assert_eq!(value["sequences"][0]["notes"][0]["key"], 60);
    assert_eq!(value["sequences"][0]["notes"][0]["ticks"], 0);
    assert_eq!(value["sequences"][0]["notes"][0]["difference"], 240);
}

#[test]
fn test_save_and_load_file() {
    let input = score(
        vec![vec![(60, 0), (64, 240), (67, 720)]],
        vec![(120.0, 0), (75.5, 700)],
    );
    let song = build_song(Some("Round Trip"), &input, 120.0).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("song.json");
    song.save(&path).unwrap();
    let loaded = Song::load(&path).unwrap();
    assert_eq!(loaded, song);

    loaded.save(&path).unwrap();
    assert_eq!(Song::load(&path).unwrap(), song);
}

#[test]
fn test_load_rejects_broken_invariants() {
    // Second note lies before the first
    let json = r#"{"title":"Bad","ppq":480,"sequences":[
        {"tempo":120,"ticks":0,"notes":[
            {"key":60,"ticks":100,"difference":0},
            {"key":62,"ticks":50,"difference":0}]}]}"#;
    assert!(matches!(Song::from_json(json), Err(NoteblockError::InvalidSong(_))));

    // Sequence start ticks must strictly increase
    let json = r#"{"title":"Bad","ppq":480,"sequences":[
        {"tempo":120,"ticks":10,"notes":[]},
        {"tempo":100,"ticks":10,"notes":[]}]}"#;
    assert!(matches!(Song::from_json(json), Err(NoteblockError::InvalidSong(_))));

    // Difference must reach the next onset
    let json = r#"{"title":"Bad","ppq":480,"sequences":[
        {"tempo":120,"ticks":0,"notes":[
            {"key":60,"ticks":0,"difference":5},
            {"key":62,"ticks":10,"difference":0}]}]}"#;
    assert!(matches!(Song::from_json(json), Err(NoteblockError::InvalidSong(_))));

    // A difference that overflows the tick counter
    let json = r#"{"title":"Bad","ppq":480,"sequences":[
        {"tempo":120,"ticks":0,"notes":[
            {"key":60,"ticks":10,"difference":18446744073709551615},
            {"key":62,"ticks":10,"difference":0}]}]}"#;
    assert!(matches!(Song::from_json(json), Err(NoteblockError::InvalidSong(_))));

    // Missing fields are a file error rather than a model error
    let json = r#"{"title":"Bad"}"#;
    assert!(matches!(Song::from_json(json), Err(NoteblockError::SongFile(_))));
}
