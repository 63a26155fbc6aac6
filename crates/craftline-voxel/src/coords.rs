//! World, chunk, and chunk-local coordinate spaces.
//!
//! World columns map to chunks with floor division so that negative
//! coordinates land in the chunk "below" zero rather than in chunk 0:
//! world x = -1 is chunk -1, local 15.

/// Horizontal side length of a chunk in blocks.
pub const CHUNK_SIZE: i32 = 16;

/// Vertical extent of the world in blocks. Valid y is `0..WORLD_HEIGHT`.
pub const WORLD_HEIGHT: i32 = 64;

/// Chunk column index for a world x or z coordinate.
pub fn chunk_coord(world: i32) -> i32 {
    world.div_euclid(CHUNK_SIZE)
}

/// Chunk-local index (always in `0..CHUNK_SIZE`) for a world x or z coordinate.
pub fn local_coord(world: i32) -> i32 {
    world.rem_euclid(CHUNK_SIZE)
}

/// Identifies a chunk column on the horizontal grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkPos {
    pub x: i32,
    pub z: i32,
}

impl ChunkPos {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// The chunk containing world column `(x, z)`.
    pub fn containing(world_x: i32, world_z: i32) -> Self {
        Self::new(chunk_coord(world_x), chunk_coord(world_z))
    }

    /// The chunk containing a floating-point position such as a viewer's.
    pub fn containing_point(x: f32, z: f32) -> Self {
        Self::containing(x.floor() as i32, z.floor() as i32)
    }

    pub fn offset(self, dx: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.z + dz)
    }

    /// Chebyshev (chessboard) distance in chunks.
    pub fn chebyshev_distance(self, other: ChunkPos) -> u32 {
        self.x.abs_diff(other.x).max(self.z.abs_diff(other.z))
    }

    /// World coordinates of this chunk's local `(0, 0)` column.
    pub fn origin(self) -> (i32, i32) {
        (self.x * CHUNK_SIZE, self.z * CHUNK_SIZE)
    }

    /// World position of a local cell inside this chunk.
    pub fn block_at(self, local: LocalPos) -> BlockPos {
        let (ox, oz) = self.origin();
        BlockPos::new(
            ox + local.x as i32,
            local.y as i32,
            oz + local.z as i32,
        )
    }
}

/// A cell inside a chunk: x, z in `0..16`, y in `0..64`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocalPos {
    pub x: u8,
    pub y: u8,
    pub z: u8,
}

impl LocalPos {
    /// Builds a local position, or `None` if any component is out of range.
    pub fn new(x: i32, y: i32, z: i32) -> Option<Self> {
        let in_range = (0..CHUNK_SIZE).contains(&x)
            && (0..WORLD_HEIGHT).contains(&y)
            && (0..CHUNK_SIZE).contains(&z);
        in_range.then_some(Self {
            x: x as u8,
            y: y as u8,
            z: z as u8,
        })
    }
}

/// Integer world coordinate of a single block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The block cell containing a floating-point point.
    pub fn containing(x: f32, y: f32, z: f32) -> Self {
        Self::new(x.floor() as i32, y.floor() as i32, z.floor() as i32)
    }

    pub fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    pub fn chunk(self) -> ChunkPos {
        ChunkPos::containing(self.x, self.z)
    }

    /// Splits into chunk and local coordinates. `None` above or below the world.
    pub fn split(self) -> Option<(ChunkPos, LocalPos)> {
        let local = LocalPos::new(local_coord(self.x), self.y, local_coord(self.z))?;
        Some((self.chunk(), local))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_round_trip() {
        for x in -1000..=1000 {
            let local = local_coord(x);
            assert!((0..CHUNK_SIZE).contains(&local), "local {local} for {x}");
            assert_eq!(chunk_coord(x) * CHUNK_SIZE + local, x);
        }
    }

    #[test]
    fn test_negative_coordinates() {
        assert_eq!(chunk_coord(-1), -1);
        assert_eq!(local_coord(-1), 15);
        assert_eq!(chunk_coord(-16), -1);
        assert_eq!(local_coord(-16), 0);
        assert_eq!(chunk_coord(-17), -2);
        assert_eq!(chunk_coord(15), 0);
        assert_eq!(chunk_coord(16), 1);
    }

    #[test]
    fn test_split_and_rebuild() {
        let pos = BlockPos::new(-33, 10, 47);
        let (chunk, local) = pos.split().unwrap();
        assert_eq!(chunk, ChunkPos::new(-3, 2));
        assert_eq!((local.x, local.y, local.z), (15, 10, 15));
        assert_eq!(chunk.block_at(local), pos);
    }

    #[test]
    fn test_split_rejects_out_of_height() {
        assert!(BlockPos::new(0, -1, 0).split().is_none());
        assert!(BlockPos::new(0, WORLD_HEIGHT, 0).split().is_none());
        assert!(BlockPos::new(0, WORLD_HEIGHT - 1, 0).split().is_some());
    }

    #[test]
    fn test_chebyshev_distance() {
        let a = ChunkPos::new(0, 0);
        assert_eq!(a.chebyshev_distance(ChunkPos::new(3, -2)), 3);
        assert_eq!(a.chebyshev_distance(ChunkPos::new(-4, 4)), 4);
        assert_eq!(a.chebyshev_distance(a), 0);
    }

    #[test]
    fn test_containing_point_floors() {
        assert_eq!(ChunkPos::containing_point(-0.5, 15.9), ChunkPos::new(-1, 0));
        assert_eq!(BlockPos::containing(-0.1, 2.7, 3.0), BlockPos::new(-1, 2, 3));
    }
}
