//! Proximity-driven chunk loading and eviction.
//!
//! Chunks within the render distance (Chebyshev) of the viewer's chunk are
//! generated when missing; chunks more than one ring beyond it are evicted.

use crate::chunk::Chunk;
use crate::coords::ChunkPos;
use crate::world::World;

/// Chunks touched by one [`ChunkLoader::tick`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChunkLoadTickResult {
    /// Newly generated chunks, nearest first.
    pub loaded: Vec<ChunkPos>,
    /// Evicted chunks.
    pub unloaded: Vec<ChunkPos>,
}

/// Keeps the loaded set in step with the viewer's position.
#[derive(Clone, Debug)]
pub struct ChunkLoader {
    render_distance: u32,
}

impl ChunkLoader {
    pub fn new(render_distance: u32) -> Self {
        Self { render_distance }
    }

    pub fn render_distance(&self) -> u32 {
        self.render_distance
    }

    /// Chebyshev distance beyond which chunks are evicted.
    pub fn unload_distance(&self) -> u32 {
        self.render_distance + 1
    }

    /// Loads missing chunks around `center` using `generate`, then evicts
    /// chunks farther than [`unload_distance`](Self::unload_distance).
    pub fn tick(
        &self,
        center: ChunkPos,
        world: &mut World,
        mut generate: impl FnMut(ChunkPos) -> Chunk,
    ) -> ChunkLoadTickResult {
        let mut result = ChunkLoadTickResult::default();

        let r = self.render_distance as i32;
        let mut missing: Vec<ChunkPos> = Vec::new();
        for dx in -r..=r {
            for dz in -r..=r {
                let pos = center.offset(dx, dz);
                if !world.contains_chunk(pos) {
                    missing.push(pos);
                }
            }
        }
        missing.sort_by_key(|pos| {
            let (dx, dz) = (pos.x - center.x, pos.z - center.z);
            (dx * dx + dz * dz, pos.x, pos.z)
        });

        for pos in missing {
            world.insert_chunk(pos, generate(pos));
            result.loaded.push(pos);
        }

        let limit = self.unload_distance();
        let evict: Vec<ChunkPos> = world
            .loaded_positions()
            .filter(|pos| pos.chebyshev_distance(center) > limit)
            .collect();
        for pos in evict {
            world.remove_chunk(pos);
            result.unloaded.push(pos);
        }

        if !result.loaded.is_empty() || !result.unloaded.is_empty() {
            tracing::debug!(
                "Chunk tick at {:?}: loaded {}, unloaded {}",
                center,
                result.loaded.len(),
                result.unloaded.len()
            );
        }
        result
    }
}

impl Default for ChunkLoader {
    fn default() -> Self {
        Self::new(3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty(_: ChunkPos) -> Chunk {
        Chunk::new()
    }

    #[test]
    fn test_loads_full_square_around_viewer() {
        let loader = ChunkLoader::new(3);
        let mut world = World::new();
        let result = loader.tick(ChunkPos::new(0, 0), &mut world, empty);

        assert_eq!(result.loaded.len(), 49);
        assert_eq!(world.loaded_count(), 49);
        assert!(world.contains_chunk(ChunkPos::new(3, -3)));
        assert!(!world.contains_chunk(ChunkPos::new(4, 0)));
        assert_eq!(result.loaded[0], ChunkPos::new(0, 0));
    }

    #[test]
    fn test_second_tick_is_idle() {
        let loader = ChunkLoader::new(2);
        let mut world = World::new();
        loader.tick(ChunkPos::new(5, 5), &mut world, empty);
        let result = loader.tick(ChunkPos::new(5, 5), &mut world, empty);
        assert_eq!(result, ChunkLoadTickResult::default());
    }

    #[test]
    fn test_hysteresis_band_keeps_chunks() {
        let loader = ChunkLoader::new(3);
        let mut world = World::new();
        loader.tick(ChunkPos::new(0, 0), &mut world, empty);

        // Column x = -3 is now at distance 4: inside the band, kept.
        let result = loader.tick(ChunkPos::new(1, 0), &mut world, empty);
        assert!(result.unloaded.is_empty());
        assert!(world.contains_chunk(ChunkPos::new(-3, 0)));
        assert_eq!(result.loaded.len(), 7);

        // Distance 5: evicted.
        let result = loader.tick(ChunkPos::new(2, 0), &mut world, empty);
        assert_eq!(result.unloaded.len(), 7);
        assert!(!world.contains_chunk(ChunkPos::new(-3, 0)));
    }

    #[test]
    fn test_invariant_after_teleport() {
        let loader = ChunkLoader::new(3);
        let mut world = World::new();
        loader.tick(ChunkPos::new(0, 0), &mut world, empty);
        let center = ChunkPos::new(40, -12);
        loader.tick(center, &mut world, empty);

        for pos in world.loaded_positions() {
            assert!(pos.chebyshev_distance(center) <= loader.unload_distance());
        }
        assert_eq!(world.loaded_count(), 49);
    }

    #[test]
    fn test_generator_receives_each_position_once() {
        let loader = ChunkLoader::new(1);
        let mut world = World::new();
        let mut seen = Vec::new();
        loader.tick(ChunkPos::new(0, 0), &mut world, |pos| {
            seen.push(pos);
            Chunk::new()
        });
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 9);
    }
}
