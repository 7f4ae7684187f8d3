//! # World Interaction
//!
//! The seam between the player and whatever hosts the note blocks.
//!
//! ## Collaborators
//! - [`World`] - synchronous block lookups and primitive actions
//! - [`Observations`] - asynchronous stream of [`NoteHeard`] events
//!
//! Observations carry no request id. A consumer must match them against the
//! block it is waiting on by position and family, and ignore everything else.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::mpsc;

use crate::error::ActionError;
use crate::instrument::{InstrumentFamily, InstrumentTable};

/// Material name of a playable note block.
pub const NOTE_BLOCK: &str = "note_block";

/// Material name of empty space.
pub const AIR: &str = "air";

/// Integer block coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    pub fn below(self) -> Self {
        self.offset(0, -1, 0)
    }

    pub fn above(self) -> Self {
        self.offset(0, 1, 0)
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// A placed, re-tunable note block.
///
/// `family` is fixed when the block is found. `assigned_key` is set by the
/// allocator and `tone` once tuning has confirmed the dial position.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicalBlock {
    pub position: BlockPos,
    pub material: String,
    pub family: InstrumentFamily,
    pub assigned_key: Option<u8>,
    pub tone: Option<u8>,
}

impl PhysicalBlock {
    /// Create an unassigned block, deriving its family from the support material.
    pub fn new(position: BlockPos, material: impl Into<String>, table: &InstrumentTable) -> Self {
        let material = material.into();
        let family = table.family_for_material(&material);
        Self {
            position,
            material,
            family,
            assigned_key: None,
            tone: None,
        }
    }
}

/// A note block sounded somewhere in the world.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteHeard {
    pub position: BlockPos,
    /// World sound identifier, e.g. `block.note_block.harp`.
    pub sound: String,
    /// Dial step (0-24) the block was on when it sounded.
    pub step: u8,
}

impl NoteHeard {
    pub fn family(&self) -> Option<InstrumentFamily> {
        InstrumentFamily::from_sound_id(&self.sound)
    }
}

/// Receiving end of the observation stream.
pub type Observations = mpsc::UnboundedReceiver<NoteHeard>;

/// Sending end of the observation stream, held by the world.
pub type ObservationSender = mpsc::UnboundedSender<NoteHeard>;

/// Create a connected observation stream.
pub fn observation_channel() -> (ObservationSender, Observations) {
    mpsc::unbounded_channel()
}

/// Primitive world interactions.
///
/// Actions are fire-and-forget: success only means the world accepted the
/// request. Their audible effect arrives later on the observation stream.
pub trait World {
    /// Material at `position`, or `None` if the position is not loaded.
    fn block_at(&self, position: BlockPos) -> Option<String>;

    /// Sound the note block at `position`.
    fn dispatch_play(&mut self, position: BlockPos) -> Result<(), ActionError>;

    /// Advance the note block at `position` by one step.
    fn dispatch_increment(&mut self, position: BlockPos) -> Result<(), ActionError>;
}
