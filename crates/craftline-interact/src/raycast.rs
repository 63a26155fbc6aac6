//! Fixed-step ray marching from the viewer's eye.
//!
//! The ray samples the block under `origin + direction * d` for
//! `d = 0, 0.1, 0.2, ...` while `d < 5`. The first sample that is neither
//! Air nor Water is the target. Its face normal is the previous sample's
//! cell minus the target cell.

use craftline_voxel::{BlockAccess, BlockPos, BlockType};
use glam::{IVec3, Vec3};

/// Distance between samples along the ray.
pub const RAY_STEP: f32 = 0.1;
/// Samples stop once the distance reaches this value.
pub const MAX_REACH: f32 = 5.0;

/// The viewer's eye position and look direction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewRay {
    pub origin: Vec3,
    /// Normalized on construction; a zero vector stays zero.
    pub direction: Vec3,
}

impl ViewRay {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Ray looking along `yaw` (radians, 0 = -Z) and `pitch` (radians, up positive).
    pub fn from_angles(origin: Vec3, yaw: f32, pitch: f32) -> Self {
        let direction = Vec3::new(
            -yaw.sin() * pitch.cos(),
            pitch.sin(),
            -yaw.cos() * pitch.cos(),
        );
        Self::new(origin, direction)
    }
}

/// A targeted block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RaycastHit {
    pub pos: BlockPos,
    /// Offset from the target to the empty cell the ray came from.
    pub normal: IVec3,
    pub block: BlockType,
}

impl RaycastHit {
    /// The cell the normal points to.
    pub fn adjacent(&self) -> BlockPos {
        self.pos.offset(self.normal.x, self.normal.y, self.normal.z)
    }
}

fn cell(point: Vec3) -> IVec3 {
    point.floor().as_ivec3()
}

/// Marches `ray` through `world`. `None` when nothing is hit within reach.
pub fn raycast(world: &impl BlockAccess, ray: &ViewRay) -> Option<RaycastHit> {
    let steps = (MAX_REACH / RAY_STEP).ceil() as u32;
    let mut last = cell(ray.origin);

    for i in 0..steps {
        let d = i as f32 * RAY_STEP;
        let current = cell(ray.origin + ray.direction * d);
        let pos = BlockPos::new(current.x, current.y, current.z);
        let block = world.get_block(pos);

        if block.is_targetable() {
            return Some(RaycastHit {
                pos,
                normal: last - current,
                block,
            });
        }
        last = current;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use craftline_voxel::{Chunk, ChunkPos, World};

    fn world() -> World {
        let mut world = World::new();
        for x in -1..=1 {
            for z in -1..=1 {
                world.insert_chunk(ChunkPos::new(x, z), Chunk::new());
            }
        }
        world
    }

    #[test]
    fn test_hits_block_ahead_with_facing_normal() {
        let mut w = world();
        w.set_block(BlockPos::new(3, 10, 0), BlockType::Stone);
        let ray = ViewRay::new(Vec3::new(0.5, 10.5, 0.5), Vec3::X);

        let hit = raycast(&w, &ray).unwrap();
        assert_eq!(hit.pos, BlockPos::new(3, 10, 0));
        assert_eq!(hit.normal, IVec3::new(-1, 0, 0));
        assert_eq!(hit.block, BlockType::Stone);
        assert_eq!(hit.adjacent(), BlockPos::new(2, 10, 0));
    }

    #[test]
    fn test_looking_down_hits_top_face() {
        let mut w = world();
        w.set_block(BlockPos::new(0, 8, 0), BlockType::Grass);
        let ray = ViewRay::new(Vec3::new(0.5, 10.2, 0.5), Vec3::NEG_Y);
        let hit = raycast(&w, &ray).unwrap();
        assert_eq!(hit.pos, BlockPos::new(0, 8, 0));
        assert_eq!(hit.normal, IVec3::Y);
    }

    #[test]
    fn test_water_is_transparent_to_rays() {
        let mut w = world();
        w.set_block(BlockPos::new(1, 10, 0), BlockType::Water);
        w.set_block(BlockPos::new(2, 10, 0), BlockType::Planks);
        let ray = ViewRay::new(Vec3::new(0.5, 10.5, 0.5), Vec3::X);
        assert_eq!(raycast(&w, &ray).unwrap().pos, BlockPos::new(2, 10, 0));
    }

    #[test]
    fn test_out_of_reach_is_none() {
        let mut w = world();
        w.set_block(BlockPos::new(6, 10, 0), BlockType::Stone);
        let ray = ViewRay::new(Vec3::new(0.5, 10.5, 0.5), Vec3::X);
        assert!(raycast(&w, &ray).is_none());
    }

    #[test]
    fn test_empty_world_is_none() {
        let w = world();
        let ray = ViewRay::new(Vec3::new(0.5, 10.5, 0.5), Vec3::new(1.0, -0.2, 0.3));
        assert!(raycast(&w, &ray).is_none());
    }

    #[test]
    fn test_negative_coordinates() {
        let mut w = world();
        w.set_block(BlockPos::new(-3, 5, -1), BlockType::Wood);
        let ray = ViewRay::new(Vec3::new(-0.5, 5.5, -0.5), Vec3::NEG_X);
        let hit = raycast(&w, &ray).unwrap();
        assert_eq!(hit.pos, BlockPos::new(-3, 5, -1));
        assert_eq!(hit.normal, IVec3::X);
    }

    #[test]
    fn test_from_angles_default_looks_north() {
        let ray = ViewRay::from_angles(Vec3::ZERO, 0.0, 0.0);
        assert!((ray.direction - Vec3::NEG_Z).length() < 1e-6);
        let up = ViewRay::from_angles(Vec3::ZERO, 0.0, std::f32::consts::FRAC_PI_2);
        assert!((up.direction - Vec3::Y).length() < 1e-6);
    }
}
