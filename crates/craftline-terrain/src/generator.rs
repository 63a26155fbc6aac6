//! Chunk generation: layered column fill followed by tree placement.

use craftline_voxel::{BlockType, CHUNK_SIZE, Chunk, ChunkPos, LocalPos, WORLD_HEIGHT};

use crate::heightmap::HeightSampler;
use crate::seed::chunk_rng;
use crate::trees::TreePlacer;

/// Depth of the dirt layer (including the grass cap) above stone.
const SOIL_DEPTH: i32 = 4;

/// Builds chunks from the world seed. Pure: the same chunk position always
/// yields the same blocks.
#[derive(Clone, Debug)]
pub struct TerrainSynthesizer {
    seed: u32,
    heights: HeightSampler,
    trees: TreePlacer,
}

impl TerrainSynthesizer {
    pub fn new(seed: u32) -> Self {
        Self::with_parts(seed, HeightSampler::new(seed), TreePlacer::default())
    }

    pub fn with_parts(seed: u32, heights: HeightSampler, trees: TreePlacer) -> Self {
        Self {
            seed,
            heights,
            trees,
        }
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Surface height of world column `(x, z)`.
    pub fn column_height(&self, x: i32, z: i32) -> i32 {
        self.heights.height(x, z)
    }

    /// Block that the column fill rule assigns to `y` in a column of `height`.
    pub fn layer_block(y: i32, height: i32) -> BlockType {
        if y < height - SOIL_DEPTH {
            BlockType::Stone
        } else if y < height - 1 {
            BlockType::Dirt
        } else if y == height - 1 {
            BlockType::Grass
        } else {
            BlockType::Air
        }
    }

    /// Generates the chunk at `pos`.
    pub fn generate_chunk(&self, pos: ChunkPos) -> Chunk {
        let mut chunk = Chunk::new();
        let (ox, oz) = pos.origin();

        let mut heights = [[0i32; CHUNK_SIZE as usize]; CHUNK_SIZE as usize];
        for x in 0..CHUNK_SIZE {
            for z in 0..CHUNK_SIZE {
                let height = self.heights.height(ox + x, oz + z);
                heights[x as usize][z as usize] = height;
                for y in 0..height.clamp(0, WORLD_HEIGHT) {
                    if let Some(local) = LocalPos::new(x, y, z) {
                        chunk.set(local, Self::layer_block(y, height));
                    }
                }
            }
        }

        let mut rng = chunk_rng(self.seed, pos);
        let mut trees = 0usize;
        for x in 0..CHUNK_SIZE {
            for z in 0..CHUNK_SIZE {
                let height = heights[x as usize][z as usize];
                if self.trees.try_grow(&mut chunk, &mut rng, x, z, height).is_some() {
                    trees += 1;
                }
            }
        }

        tracing::trace!(
            "Generated chunk {:?}: {} blocks, {} trees",
            pos,
            chunk.len(),
            trees
        );
        chunk
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_rule() {
        let h = 20;
        assert_eq!(TerrainSynthesizer::layer_block(15, h), BlockType::Stone);
        assert_eq!(TerrainSynthesizer::layer_block(16, h), BlockType::Dirt);
        assert_eq!(TerrainSynthesizer::layer_block(18, h), BlockType::Dirt);
        assert_eq!(TerrainSynthesizer::layer_block(19, h), BlockType::Grass);
        assert_eq!(TerrainSynthesizer::layer_block(20, h), BlockType::Air);
    }

    #[test]
    fn test_columns_follow_heightmap() {
        let synth = TerrainSynthesizer::new(12345);
        let pos = ChunkPos::new(-2, 3);
        let chunk = synth.generate_chunk(pos);
        let (ox, oz) = pos.origin();

        for x in 0..CHUNK_SIZE {
            for z in 0..CHUNK_SIZE {
                let height = synth.column_height(ox + x, oz + z);
                if height <= 0 {
                    continue;
                }
                let top = LocalPos::new(x, height - 1, z).unwrap();
                assert_eq!(chunk.get(top), BlockType::Grass);
                let bottom = LocalPos::new(x, 0, z).unwrap();
                let expected = TerrainSynthesizer::layer_block(0, height);
                assert_eq!(chunk.get(bottom), expected);
            }
        }
    }

    #[test]
    fn test_generation_is_deterministic() {
        let a = TerrainSynthesizer::new(12345);
        let b = TerrainSynthesizer::new(12345);
        for pos in [ChunkPos::new(0, 0), ChunkPos::new(5, -7), ChunkPos::new(-11, 2)] {
            let ca = a.generate_chunk(pos);
            let cb = b.generate_chunk(pos);
            let mut blocks_a: Vec<_> = ca.iter().collect();
            let mut blocks_b: Vec<_> = cb.iter().collect();
            blocks_a.sort();
            blocks_b.sort();
            assert_eq!(blocks_a, blocks_b);
        }
    }

    #[test]
    fn test_trees_appear_somewhere() {
        let synth = TerrainSynthesizer::new(12345);
        let wood = (-6..6)
            .flat_map(|x| (-6..6).map(move |z| ChunkPos::new(x, z)))
            .map(|pos| synth.generate_chunk(pos))
            .filter(|chunk| chunk.iter().any(|(_, b)| b == BlockType::Wood))
            .count();
        assert!(wood > 0, "no trees in 144 chunks");
    }

    #[test]
    fn test_no_air_stored() {
        let chunk = TerrainSynthesizer::new(1).generate_chunk(ChunkPos::new(0, 0));
        assert!(chunk.iter().all(|(_, b)| b != BlockType::Air));
        assert!(!chunk.is_empty());
    }
}
