//! Note block discovery
//!
//! Scans a cube around a reference point for usable note blocks. A note block
//! counts when the block beneath it is known (it decides the family) and the
//! block above it is air (otherwise it cannot sound).

use tracing::debug;

use crate::instrument::InstrumentTable;
use crate::world::{BlockPos, PhysicalBlock, World, AIR, NOTE_BLOCK};

/// Find usable note blocks within `radius` of `center` on every axis.
///
/// Results come back in scan order: x outermost, then y, then z, each from
/// `-radius` to `radius`. The allocator relies on this order being stable.
pub fn discover<W: World + ?Sized>(
    world: &W,
    center: BlockPos,
    radius: i32,
    table: &InstrumentTable,
) -> Vec<PhysicalBlock> {
    let mut blocks = Vec::new();

    for x in -radius..=radius {
        for y in -radius..=radius {
            for z in -radius..=radius {
                let position = center.offset(x, y, z);
                if world.block_at(position).as_deref() != Some(NOTE_BLOCK) {
                    continue;
                }

                let support = world.block_at(position.below());
                let above = world.block_at(position.above());
                if let (Some(support), Some(AIR)) = (support, above.as_deref()) {
                    blocks.push(PhysicalBlock::new(position, support, table));
                }
            }
        }
    }

    debug!("Discovered {} note blocks around {}", blocks.len(), center);
    blocks
}
