//! Tree placement: a Wood trunk capped by a diamond-shaped Leaves canopy.

use craftline_voxel::{BlockType, Chunk, LocalPos};
use rand::Rng;

/// Tunables for tree placement.
#[derive(Clone, Debug, PartialEq)]
pub struct TreeParams {
    /// Columns must be strictly taller than this to grow a tree.
    pub min_height: i32,
    /// Per-column probability of a tree on an eligible column.
    pub chance: f64,
    /// Inclusive trunk length range.
    pub trunk_min: i32,
    pub trunk_max: i32,
    /// Horizontal reach of the canopy on each axis.
    pub canopy_radius: i32,
    /// Canopy cells satisfy `|dx| + |dz| <= canopy_manhattan`.
    pub canopy_manhattan: i32,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            min_height: 15,
            chance: 0.008,
            trunk_min: 4,
            trunk_max: 6,
            canopy_radius: 2,
            canopy_manhattan: 3,
        }
    }
}

/// Rolls for and grows trees inside a single chunk.
#[derive(Clone, Debug, Default)]
pub struct TreePlacer {
    params: TreeParams,
}

impl TreePlacer {
    pub fn new(params: TreeParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &TreeParams {
        &self.params
    }

    /// Rolls for a tree on the column at local `(x, z)` whose surface height
    /// is `height`. Draws from `rng` only for eligible columns.
    ///
    /// Returns the trunk length when a tree was grown.
    pub fn try_grow(
        &self,
        chunk: &mut Chunk,
        rng: &mut impl Rng,
        x: i32,
        z: i32,
        height: i32,
    ) -> Option<i32> {
        if height <= self.params.min_height || rng.random::<f64>() >= self.params.chance {
            return None;
        }
        let trunk = rng.random_range(self.params.trunk_min..=self.params.trunk_max);
        self.grow(chunk, x, z, height, trunk);
        Some(trunk)
    }

    /// Places a tree with a trunk of `trunk` blocks rooted on top of `height`.
    ///
    /// Cells that fall outside the chunk are dropped. Leaves never replace
    /// an existing block.
    pub fn grow(&self, chunk: &mut Chunk, x: i32, z: i32, height: i32, trunk: i32) {
        for ty in 0..trunk {
            if let Some(local) = LocalPos::new(x, height + ty, z) {
                chunk.set(local, BlockType::Wood);
            }
        }

        let r = self.params.canopy_radius;
        for lx in -r..=r {
            for lz in -r..=r {
                if lx.abs() + lz.abs() > self.params.canopy_manhattan {
                    continue;
                }
                for ly in (trunk - 2)..=(trunk + 1) {
                    // On the trunk axis only the cap above the top gets leaves.
                    if lx == 0 && lz == 0 && ly <= trunk {
                        continue;
                    }
                    if let Some(local) = LocalPos::new(x + lx, height + ly, z + lz) {
                        chunk.set_if_air(local, BlockType::Leaves);
                    }
                }
            }
        }
    }
}
