//! Placing a block against the targeted face.

use craftline_voxel::{BlockEdit, BlockPos, BlockType, BlockWrite};
use glam::Vec3;

use crate::raycast::{RaycastHit, ViewRay, raycast};

/// Cell a block would be placed into for `hit`, or `None` if it overlaps the
/// viewer standing at `viewer`.
///
/// The viewer occupies its floored x/z column at `floor(y)` and `floor(y) - 1`.
pub fn placement_cell(hit: &RaycastHit, viewer: Vec3) -> Option<BlockPos> {
    let cell = hit.adjacent();
    let body = viewer.floor().as_ivec3();
    let overlaps =
        cell.x == body.x && cell.z == body.z && (cell.y == body.y || cell.y == body.y - 1);
    if overlaps {
        tracing::trace!("Placement at {:?} rejected: overlaps viewer", cell);
        return None;
    }
    Some(cell)
}

/// Places `block` against whatever `ray` targets.
///
/// Returns `None` when nothing is targeted, the cell overlaps the viewer, or
/// the cell lies in an unloaded chunk.
pub fn place_block(
    world: &mut impl BlockWrite,
    ray: &ViewRay,
    viewer: Vec3,
    block: BlockType,
) -> Option<BlockEdit> {
    let hit = raycast(world, ray)?;
    let cell = placement_cell(&hit, viewer)?;
    world.set_block(cell, block)
}
