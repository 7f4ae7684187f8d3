//! In-memory world
//!
//! `SimWorld` stands in for a live server: it stores block materials and note
//! block steps, records every action, and answers plays on the observation
//! stream the way a server's sound packets would.

use std::collections::HashMap;
use tracing::debug;

use crate::error::ActionError;
use crate::instrument::{InstrumentTable, STEP_COUNT};
use crate::world::{
    observation_channel, BlockPos, NoteHeard, ObservationSender, Observations, World, AIR,
    NOTE_BLOCK,
};

/// A primitive action the simulated world accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorldAction {
    Play(BlockPos),
    Increment(BlockPos),
}

pub struct SimWorld {
    materials: HashMap<BlockPos, String>,
    tones: HashMap<BlockPos, u8>,
    table: InstrumentTable,
    sender: ObservationSender,
    actions: Vec<WorldAction>,
    muted: bool,
}

impl SimWorld {
    /// Create an empty world and the observation stream it reports to.
    pub fn new(table: InstrumentTable) -> (Self, Observations) {
        let (sender, observations) = observation_channel();
        let world = Self {
            materials: HashMap::new(),
            tones: HashMap::new(),
            table,
            sender,
            actions: Vec::new(),
            muted: false,
        };
        (world, observations)
    }

    pub fn set_block(&mut self, position: BlockPos, material: impl Into<String>) {
        self.materials.insert(position, material.into());
    }

    /// Place a note block on `support` with air above it.
    pub fn place_note_block(&mut self, position: BlockPos, support: &str, tone: u8) {
        self.set_block(position, NOTE_BLOCK);
        self.set_block(position.below(), support);
        self.set_block(position.above(), AIR);
        self.tones.insert(position, tone % STEP_COUNT);
    }

    pub fn remove_block(&mut self, position: BlockPos) {
        self.materials.remove(&position);
        self.tones.remove(&position);
    }

    /// Stop (or resume) reporting sounds. Actions still succeed.
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn tone_at(&self, position: BlockPos) -> Option<u8> {
        self.tones.get(&position).copied()
    }

    pub fn actions(&self) -> &[WorldAction] {
        &self.actions
    }

    pub fn play_count(&self) -> usize {
        self.actions
            .iter()
            .filter(|a| matches!(a, WorldAction::Play(_)))
            .count()
    }

    pub fn increment_count(&self) -> usize {
        self.actions
            .iter()
            .filter(|a| matches!(a, WorldAction::Increment(_)))
            .count()
    }

    fn note_block_tone(&self, position: BlockPos) -> Result<u8, ActionError> {
        let is_note_block = self.materials.get(&position).map(String::as_str) == Some(NOTE_BLOCK);
        match self.tones.get(&position) {
            Some(tone) if is_note_block => Ok(*tone),
            _ => Err(ActionError::BlockMissing(position)),
        }
    }
}

impl World for SimWorld {
    fn block_at(&self, position: BlockPos) -> Option<String> {
        Some(
            self.materials
                .get(&position)
                .cloned()
                .unwrap_or_else(|| AIR.to_string()),
        )
    }

    fn dispatch_play(&mut self, position: BlockPos) -> Result<(), ActionError> {
        let step = self.note_block_tone(position)?;
        self.actions.push(WorldAction::Play(position));

        if !self.muted {
            let support = self.block_at(position.below()).unwrap_or_default();
            let family = self.table.family_for_material(&support);
            debug!("Simulated {} at {} on step {}", family, position, step);
            // A dropped receiver only means nobody is listening any more
            let _ = self.sender.send(NoteHeard {
                position,
                sound: family.sound_id().to_string(),
                step,
            });
        }
        Ok(())
    }

    fn dispatch_increment(&mut self, position: BlockPos) -> Result<(), ActionError> {
        let step = self.note_block_tone(position)?;
        self.tones.insert(position, (step + 1) % STEP_COUNT);
        self.actions.push(WorldAction::Increment(position));
        Ok(())
    }
}
