//! # Instrument Classifier
//!
//! Pure lookups between MIDI keys, instrument families, support materials and
//! world sound identifiers.
//!
//! ## Key Ranges
//! ```text
//! key   0 ......... 21 | 22 .. 29 | 30 .. 53 | 54 .. 78 | 79 .. 102 | 103 .. 127
//! family    none       | basedrum |   bass   |   harp   |   bell    |    none
//! ```
//! The ranges are contiguous and never overlap, so every key maps to at most
//! one family.
//!
//! ## Tuning Steps
//! A note block has 25 cyclic steps (two octaves). The step a key needs is its
//! distance from the family's base key, the key sounded at step 0:
//! - Percussion: 22 (A#0)
//! - Bass: 30 (F#1)
//! - Harp: 54 (F#3)
//! - Bell: 78 (F#5)
//!
//! Bell shares its base with the top of the harp range: F#5 is played by the
//! harp, so bell keys start one step above its base.
//!
//! ## Materials
//! The family of a placed note block depends on the block beneath it. The
//! material lists come from [`MaterialConfig`](crate::config::MaterialConfig)
//! and are frozen into an [`InstrumentTable`] once per process.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::ops::RangeInclusive;

use crate::config::MaterialConfig;

/// Number of distinct pitch steps on a note block.
pub const STEP_COUNT: u8 = 25;

/// Lowest key any family can play.
pub const LOWEST_KEY: u8 = 22;

/// Highest key any family can play.
pub const HIGHEST_KEY: u8 = 102;

/// One of the four note block instrument categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstrumentFamily {
    #[serde(rename = "basedrum")]
    Percussion,
    Bass,
    Harp,
    Bell,
}

impl InstrumentFamily {
    /// All families, lowest range first.
    pub const ALL: [InstrumentFamily; 4] = [
        InstrumentFamily::Percussion,
        InstrumentFamily::Bass,
        InstrumentFamily::Harp,
        InstrumentFamily::Bell,
    ];

    /// MIDI keys this family is responsible for.
    pub fn key_range(self) -> RangeInclusive<u8> {
        match self {
            InstrumentFamily::Percussion => 22..=29,
            InstrumentFamily::Bass => 30..=53,
            InstrumentFamily::Harp => 54..=78,
            InstrumentFamily::Bell => 79..=102,
        }
    }

    /// Key sounded when the block sits on step 0.
    pub fn tuning_base(self) -> u8 {
        match self {
            InstrumentFamily::Percussion => 22,
            InstrumentFamily::Bass => 30,
            InstrumentFamily::Harp => 54,
            InstrumentFamily::Bell => 78,
        }
    }

    pub fn short_name(self) -> &'static str {
        match self {
            InstrumentFamily::Percussion => "basedrum",
            InstrumentFamily::Bass => "bass",
            InstrumentFamily::Harp => "harp",
            InstrumentFamily::Bell => "bell",
        }
    }

    /// World sound identifier emitted when a block of this family is played.
    ///
    /// # Example
    /// ```
    /// use noteblock::InstrumentFamily;
    ///
    /// assert_eq!(InstrumentFamily::Bass.sound_id(), "block.note_block.bass");
    /// assert_eq!(
    ///     InstrumentFamily::from_sound_id("block.note_block.bass"),
    ///     Some(InstrumentFamily::Bass)
    /// );
    /// ```
    pub fn sound_id(self) -> &'static str {
        match self {
            InstrumentFamily::Percussion => "block.note_block.basedrum",
            InstrumentFamily::Bass => "block.note_block.bass",
            InstrumentFamily::Harp => "block.note_block.harp",
            InstrumentFamily::Bell => "block.note_block.bell",
        }
    }

    /// Inverse of [`sound_id`](Self::sound_id). Accepts the bare short name as well,
    /// since some servers report instruments without the namespace prefix.
    pub fn from_sound_id(sound: &str) -> Option<Self> {
        let name = sound
            .trim_start_matches("minecraft:")
            .trim_start_matches("block.note_block.");
        InstrumentFamily::ALL
            .into_iter()
            .find(|family| family.short_name() == name)
    }
}

impl fmt::Display for InstrumentFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Family responsible for a MIDI key, or `None` when no note block can play it.
///
/// # Example
/// ```
/// use noteblock::{family_of, InstrumentFamily};
///
/// assert_eq!(family_of(60), Some(InstrumentFamily::Harp));
/// assert_eq!(family_of(21), None);
/// ```
pub fn family_of(key: u8) -> Option<InstrumentFamily> {
    match key {
        79..=102 => Some(InstrumentFamily::Bell),
        54..=78 => Some(InstrumentFamily::Harp),
        30..=53 => Some(InstrumentFamily::Bass),
        22..=29 => Some(InstrumentFamily::Percussion),
        _ => None,
    }
}

/// Dial position (0-24) a block must be on to sound `key`.
///
/// The step counts from the family's tuning base, not the floor of its key
/// range. Bell's base is 78 while its range starts at 79, so bell keys use
/// steps 1-24.
///
/// # Example
/// ```
/// use noteblock::tuning_step_of;
///
/// assert_eq!(tuning_step_of(54), Some(0));
/// assert_eq!(tuning_step_of(79), Some(1));
/// assert_eq!(tuning_step_of(102), Some(24));
/// ```
pub fn tuning_step_of(key: u8) -> Option<u8> {
    family_of(key).map(|family| key - family.tuning_base())
}

/// Playback pitch multiplier for `key` relative to the block's middle step.
///
/// Step 12 plays at 1.0, step 0 at 0.5 and step 24 at 2.0.
pub fn pitch_of(key: u8) -> Option<f64> {
    tuning_step_of(key).map(|step| 2f64.powf((step as f64 - 12.0) / 12.0))
}

/// Immutable support-material lookup built once from configuration.
#[derive(Debug, Clone)]
pub struct InstrumentTable {
    materials: HashMap<String, InstrumentFamily>,
}

impl InstrumentTable {
    pub fn new(config: &MaterialConfig) -> Self {
        let mut materials = HashMap::new();
        let groups = [
            (InstrumentFamily::Bell, &config.bell),
            (InstrumentFamily::Bass, &config.bass),
            (InstrumentFamily::Percussion, &config.percussion),
        ];
        for (family, names) in groups {
            for name in names {
                materials.insert(name.clone(), family);
            }
        }
        Self { materials }
    }

    /// Family of a note block standing on `material`. Harp is the default.
    pub fn family_for_material(&self, material: &str) -> InstrumentFamily {
        let name = material.trim_start_matches("minecraft:");
        self.materials
            .get(name)
            .copied()
            .unwrap_or(InstrumentFamily::Harp)
    }
}

impl Default for InstrumentTable {
    fn default() -> Self {
        Self::new(&MaterialConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_range_boundaries() {
        assert_eq!(family_of(21), None);
        assert_eq!(family_of(22), Some(InstrumentFamily::Percussion));
        assert_eq!(family_of(29), Some(InstrumentFamily::Percussion));
        assert_eq!(family_of(30), Some(InstrumentFamily::Bass));
        assert_eq!(family_of(53), Some(InstrumentFamily::Bass));
        assert_eq!(family_of(54), Some(InstrumentFamily::Harp));
        assert_eq!(family_of(78), Some(InstrumentFamily::Harp));
        assert_eq!(family_of(79), Some(InstrumentFamily::Bell));
        assert_eq!(family_of(102), Some(InstrumentFamily::Bell));
        assert_eq!(family_of(103), None);
    }

    #[test]
    fn test_family_of_is_monotonic_over_all_keys() {
        // Families never interleave: once a later family starts, earlier ones never reappear
        let mut last: Option<InstrumentFamily> = None;
        for key in 0..=127u8 {
            let family = family_of(key);
            if let (Some(prev), Some(current)) = (last, family) {
                assert!(current >= prev, "key {} went from {} back to {}", key, prev, current);
            }
            if family.is_some() {
                last = family;
            }
            assert_eq!(family.is_some(), (LOWEST_KEY..=HIGHEST_KEY).contains(&key));
        }
    }

    #[test]
    fn test_key_range_matches_family_of() {
        for family in InstrumentFamily::ALL {
            for key in family.key_range() {
                assert_eq!(family_of(key), Some(family));
            }
        }
    }

    #[test]
    fn test_tuning_steps_stay_on_dial() {
        for key in LOWEST_KEY..=HIGHEST_KEY {
            let step = tuning_step_of(key).unwrap();
            assert!(step < STEP_COUNT, "key {} needs step {}", key, step);
        }
        assert_eq!(tuning_step_of(54), Some(0));
        assert_eq!(tuning_step_of(66), Some(12));
        assert_eq!(tuning_step_of(78), Some(24));
        assert_eq!(tuning_step_of(60), Some(6));
        assert_eq!(tuning_step_of(79), Some(1));
        assert_eq!(tuning_step_of(102), Some(24));
        assert_eq!(tuning_step_of(10), None);
    }

    #[test]
    fn test_pitch_of() {
        assert_eq!(pitch_of(66), Some(1.0));
        assert_eq!(pitch_of(54), Some(0.5));
        assert_eq!(pitch_of(78), Some(2.0));
        assert_eq!(pitch_of(120), None);
    }

    #[test]
    fn test_material_lookup() {
        let table = InstrumentTable::default();
        assert_eq!(table.family_for_material("gold_block"), InstrumentFamily::Bell);
        assert_eq!(table.family_for_material("spruce_planks"), InstrumentFamily::Bass);
        assert_eq!(table.family_for_material("minecraft:stone"), InstrumentFamily::Percussion);
        assert_eq!(table.family_for_material("netherrack"), InstrumentFamily::Percussion);
        assert_eq!(table.family_for_material("dirt"), InstrumentFamily::Harp);
        assert_eq!(table.family_for_material("air"), InstrumentFamily::Harp);
    }

    #[test]
    fn test_sound_id_round_trip() {
        for family in InstrumentFamily::ALL {
            assert_eq!(InstrumentFamily::from_sound_id(family.sound_id()), Some(family));
        }
        assert_eq!(InstrumentFamily::from_sound_id("harp"), Some(InstrumentFamily::Harp));
        assert_eq!(InstrumentFamily::from_sound_id("block.note_block.flute"), None);
    }
}
