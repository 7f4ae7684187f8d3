//! # Resource Allocation
//!
//! Matches the keys a song needs against the note blocks on hand.
//!
//! ## Flow
//! 1. [`playable_keys`] - distinct keys some family can play, in song order
//! 2. [`shortfall`] - how many blocks of each family are missing
//! 3. [`assign`] - bind one block to each key, only when the shortfall is empty
//!
//! ## Binding Rules
//! - Blocks are taken per family in discovery order
//! - A block is bound to at most one key
//! - A key is only ever bound to a block of its own family
//! - If a pool runs dry mid-way the whole assignment fails; there is no partial result

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use tracing::{debug, info};

use crate::error::{NoteblockError, Result};
use crate::instrument::{family_of, InstrumentFamily};
use crate::song::Song;
use crate::world::{BlockPos, PhysicalBlock};

/// Blocks missing for one family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shortfall {
    pub family: InstrumentFamily,
    pub missing: usize,
}

/// Distinct keys of `song` that a note block can play, in first-played order.
pub fn playable_keys(song: &Song) -> Vec<u8> {
    song.key_range()
        .into_iter()
        .filter(|key| family_of(*key).is_some())
        .collect()
}

/// Number of blocks each family needs to cover `keys`.
///
/// Duplicate and unplayable keys are ignored.
pub fn required_counts(keys: &[u8]) -> BTreeMap<InstrumentFamily, usize> {
    let mut counts = BTreeMap::new();
    for key in distinct(keys) {
        if let Some(family) = family_of(key) {
            *counts.entry(family).or_insert(0) += 1;
        }
    }
    counts
}

/// Number of blocks of each family on hand.
pub fn available_counts(blocks: &[PhysicalBlock]) -> BTreeMap<InstrumentFamily, usize> {
    let mut counts = BTreeMap::new();
    for block in blocks {
        *counts.entry(block.family).or_insert(0) += 1;
    }
    counts
}

/// Families that lack blocks for `keys`, lowest range first.
///
/// An empty result means [`assign`] will succeed for the same inputs.
///
/// # Example
/// ```rust
/// use noteblock::allocation::{shortfall, Shortfall};
/// use noteblock::InstrumentFamily;
///
/// // Key 40 needs a bass block and none are available
/// let missing = shortfall(&[], &[40]);
/// assert_eq!(missing, vec![Shortfall { family: InstrumentFamily::Bass, missing: 1 }]);
/// ```
pub fn shortfall(available: &[PhysicalBlock], keys: &[u8]) -> Vec<Shortfall> {
    let have = available_counts(available);
    let result: Vec<Shortfall> = required_counts(keys)
        .into_iter()
        .filter_map(|(family, needed)| {
            let missing = needed.saturating_sub(have.get(&family).copied().unwrap_or(0));
            (missing > 0).then_some(Shortfall { family, missing })
        })
        .collect();

    if !result.is_empty() {
        info!("Missing blocks: {:?}", result);
    }
    result
}

/// Expand a shortfall into one family entry per missing block.
pub fn missing_families(shortfall: &[Shortfall]) -> Vec<InstrumentFamily> {
    shortfall
        .iter()
        .flat_map(|s| std::iter::repeat(s.family).take(s.missing))
        .collect()
}

/// Bind every key to its own block of the matching family.
///
/// Returns the bound blocks in key order, each with `assigned_key` set.
/// Keys no family can play are skipped, as in [`required_counts`]. Blocks
/// left over are not returned.
///
/// # Errors
/// [`NoteblockError::Resource`] if a family's pool runs out
pub fn assign(available: &[PhysicalBlock], keys: &[u8]) -> Result<Vec<PhysicalBlock>> {
    let mut pools: HashMap<InstrumentFamily, VecDeque<&PhysicalBlock>> = HashMap::new();
    for block in available {
        pools.entry(block.family).or_default().push_back(block);
    }

    let mut assigned = Vec::new();
    for key in distinct(keys) {
        let Some(family) = family_of(key) else {
            debug!("Skipping key {}, no family plays it", key);
            continue;
        };
        let block = pools
            .get_mut(&family)
            .and_then(|pool| pool.pop_front())
            .ok_or(NoteblockError::Resource { family, key })?;

        let mut bound = block.clone();
        bound.assigned_key = Some(key);
        debug!("Assigned key {} to {} block at {}", key, family, bound.position);
        assigned.push(bound);
    }
    Ok(assigned)
}

/// Index assigned blocks by key for playback.
pub fn key_map(assigned: &[PhysicalBlock]) -> Result<HashMap<u8, BlockPos>> {
    let mut map = HashMap::with_capacity(assigned.len());
    for block in assigned {
        let Some(key) = block.assigned_key else {
            continue;
        };
        if map.insert(key, block.position).is_some() {
            return Err(NoteblockError::DuplicateBinding(key));
        }
    }
    Ok(map)
}

fn distinct(keys: &[u8]) -> impl Iterator<Item = u8> + '_ {
    let mut seen = HashSet::new();
    keys.iter().copied().filter(move |key| seen.insert(*key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instrument::InstrumentTable;

    fn block(x: i32, material: &str) -> PhysicalBlock {
        PhysicalBlock::new(BlockPos::new(x, 0, 0), material, &InstrumentTable::default())
    }

    fn inventory() -> Vec<PhysicalBlock> {
        vec![
            block(0, "dirt"),
            block(1, "oak_planks"),
            block(2, "gold_block"),
            block(3, "dirt"),
            block(4, "birch_planks"),
            block(5, "stone"),
        ]
    }

    #[test]
    fn test_required_counts_ignore_duplicates_and_unplayable() {
        let counts = required_counts(&[60, 60, 61, 40, 10, 120, 90]);
        assert_eq!(counts.get(&InstrumentFamily::Harp), Some(&2));
        assert_eq!(counts.get(&InstrumentFamily::Bass), Some(&1));
        assert_eq!(counts.get(&InstrumentFamily::Bell), Some(&1));
        assert_eq!(counts.get(&InstrumentFamily::Percussion), None);
    }

    #[test]
    fn test_shortfall_counts_missing_per_family() {
        let missing = shortfall(&inventory(), &[60, 61, 62, 40, 41, 42, 90]);
        assert_eq!(
            missing,
            vec![
                Shortfall { family: InstrumentFamily::Bass, missing: 1 },
                Shortfall { family: InstrumentFamily::Harp, missing: 1 },
            ]
        );
        assert_eq!(
            missing_families(&missing),
            vec![InstrumentFamily::Bass, InstrumentFamily::Harp]
        );
    }

    #[test]
    fn test_assign_binds_in_discovery_order() {
        let keys = [61, 40, 60, 25, 90];
        assert!(shortfall(&inventory(), &keys).is_empty());

        let result = assign(&inventory(), &keys);
        assert!(result.is_ok());
        let assigned = result.unwrap();

        let bound: Vec<(u8, i32)> = assigned
            .iter()
            .map(|b| (b.assigned_key.unwrap(), b.position.x))
            .collect();
        assert_eq!(bound, vec![(61, 0), (40, 1), (60, 3), (25, 5), (90, 2)]);
    }

    #[test]
    fn test_assign_never_double_binds_or_mismatches() {
        let keys: Vec<u8> = vec![60, 40, 61, 41, 90, 22];
        let assigned = assign(&inventory(), &keys).unwrap();

        let mut positions = HashSet::new();
        for block in &assigned {
            assert!(positions.insert(block.position), "block bound twice");
            assert_eq!(family_of(block.assigned_key.unwrap()), Some(block.family));
        }
        assert_eq!(assigned.len(), keys.len());
    }

    #[test]
    fn test_assign_fails_when_pool_runs_dry() {
        let result = assign(&inventory(), &[90, 91]);
        assert!(matches!(
            result,
            Err(NoteblockError::Resource { family: InstrumentFamily::Bell, key: 91 })
        ));
    }

    #[test]
    fn test_assign_skips_unplayable_keys() {
        let keys = [10, 60, 120];
        assert!(shortfall(&[], &[10]).is_empty());
        assert!(assign(&[], &[10]).unwrap().is_empty());

        let assigned = assign(&inventory(), &keys).unwrap();
        assert_eq!(assigned.len(), 1);
        assert_eq!(assigned[0].assigned_key, Some(60));
    }

    #[test]
    fn test_shortfall_empty_iff_assign_succeeds() {
        let candidates: Vec<Vec<u8>> = vec![
            vec![],
            vec![60],
            vec![60, 61, 62],
            vec![40, 41],
            vec![40, 41, 42],
            vec![22, 23],
            vec![90, 22, 60, 40],
            vec![60, 60, 60, 61],
            vec![10],
            vec![10, 21, 103, 127],
            vec![0, 90, 91],
            vec![10, 60, 40],
        ];
        for keys in candidates {
            let empty = shortfall(&inventory(), &keys).is_empty();
            let ok = assign(&inventory(), &keys).is_ok();
            assert_eq!(empty, ok, "keys {:?}", keys);
        }
    }

    #[test]
    fn test_key_map() {
        let assigned = assign(&inventory(), &[60, 40]).unwrap();
        let map = key_map(&assigned).unwrap();
        assert_eq!(map.get(&60), Some(&BlockPos::new(0, 0, 0)));
        assert_eq!(map.get(&40), Some(&BlockPos::new(1, 0, 0)));

        let mut doubled = assigned.clone();
        doubled[1].assigned_key = Some(60);
        assert!(key_map(&doubled).is_err());
    }
}
