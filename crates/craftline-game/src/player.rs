//! Local player movement: walking with gravity, or free flight.
//!
//! The player's position is the eye. The body occupies the cells at
//! `floor(y)` and `floor(y) - 1` of its column, and standing on a block
//! puts the eye [`GROUND_EYE_OFFSET`] above that block's base.

use std::f32::consts::FRAC_PI_2;

use craftline_interact::ViewRay;
use craftline_voxel::{BlockAccess, BlockPos, ChunkPos};
use glam::{Vec2, Vec3};

pub const WALK_SPEED: f32 = 4.5;
pub const FLY_SPEED: f32 = 10.0;
pub const GRAVITY: f32 = 25.0;
pub const JUMP_VELOCITY: f32 = 8.0;
/// Distance from the eye down to the cell checked for the supporting block.
pub const EYE_HEIGHT: f32 = 1.6;
/// Eye height above the base of the supporting block after landing.
pub const GROUND_EYE_OFFSET: f32 = 2.6;
pub const SPAWN_POSITION: Vec3 = Vec3::new(0.0, 30.0, 0.0);

/// Movement keys held during a frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MoveInput {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    /// Jump while walking, ascend while flying.
    pub jump: bool,
    /// Descend while flying.
    pub descend: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Player {
    pub position: Vec3,
    /// Radians, 0 looks down -Z.
    pub yaw: f32,
    /// Radians, positive looks up.
    pub pitch: f32,
    pub flying: bool,
    vertical_velocity: f32,
    on_ground: bool,
}

impl Player {
    pub fn new(position: Vec3, flying: bool) -> Self {
        Self {
            position,
            yaw: 0.0,
            pitch: 0.0,
            flying,
            vertical_velocity: 0.0,
            on_ground: false,
        }
    }

    pub fn on_ground(&self) -> bool {
        self.on_ground
    }

    pub fn vertical_velocity(&self) -> f32 {
        self.vertical_velocity
    }

    /// Sets the view angles. Pitch is clamped to straight up/down.
    pub fn look(&mut self, yaw: f32, pitch: f32) {
        self.yaw = yaw;
        self.pitch = pitch.clamp(-FRAC_PI_2, FRAC_PI_2);
    }

    pub fn view_ray(&self) -> ViewRay {
        ViewRay::from_angles(self.position, self.yaw, self.pitch)
    }

    pub fn chunk(&self) -> ChunkPos {
        ChunkPos::containing_point(self.position.x, self.position.z)
    }

    /// Advances the player by `dt` seconds.
    pub fn update(&mut self, input: &MoveInput, dt: f32, world: &impl BlockAccess) {
        let speed = dt * if self.flying { FLY_SPEED } else { WALK_SPEED };

        let forward = Vec2::new(-self.yaw.sin(), -self.yaw.cos());
        let right = Vec2::new(self.yaw.cos(), -self.yaw.sin());
        let mut wish = Vec2::ZERO;
        if input.forward {
            wish += forward;
        }
        if input.back {
            wish -= forward;
        }
        if input.right {
            wish += right;
        }
        if input.left {
            wish -= right;
        }
        let step = wish.normalize_or_zero() * speed;

        // Axes resolve separately so the player slides along walls.
        let new_x = self.position.x + step.x;
        if self.body_clear(world, new_x, self.position.z) {
            self.position.x = new_x;
        }
        let new_z = self.position.z + step.y;
        if self.body_clear(world, self.position.x, new_z) {
            self.position.z = new_z;
        }

        if self.flying {
            self.vertical_velocity = 0.0;
            self.on_ground = false;
            if input.jump {
                self.position.y += speed;
            }
            if input.descend {
                self.position.y -= speed;
            }
            return;
        }

        self.vertical_velocity -= GRAVITY * dt;
        self.position.y += self.vertical_velocity * dt;

        let ground_y = (self.position.y - EYE_HEIGHT).floor();
        let below = BlockPos::containing(self.position.x, ground_y, self.position.z);
        self.on_ground = !world.get_block(below).is_air();
        if self.on_ground {
            self.position.y = ground_y + GROUND_EYE_OFFSET;
            self.vertical_velocity = 0.0;
            if input.jump {
                self.vertical_velocity = JUMP_VELOCITY;
            }
        }
    }

    fn body_clear(&self, world: &impl BlockAccess, x: f32, z: f32) -> bool {
        let head = BlockPos::containing(x, self.position.y, z);
        world.get_block(head).is_air() && world.get_block(head.offset(0, -1, 0)).is_air()
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new(SPAWN_POSITION, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use craftline_voxel::{BlockType, Chunk, World};

    const DT: f32 = 0.05;

    /// One chunk at the origin, solid stone up to and including `top`.
    fn ground(top: i32) -> World {
        let mut world = World::new();
        world.insert_chunk(ChunkPos::new(0, 0), Chunk::new());
        for x in 0..16 {
            for z in 0..16 {
                for y in 0..=top {
                    world.set_block(BlockPos::new(x, y, z), BlockType::Stone);
                }
            }
        }
        world
    }

    fn run(player: &mut Player, input: MoveInput, frames: usize, world: &World) {
        for _ in 0..frames {
            player.update(&input, DT, world);
        }
    }

    #[test]
    fn test_falls_and_lands_on_ground() {
        let world = ground(10);
        let mut player = Player::new(Vec3::new(8.5, 13.0, 8.5), false);
        run(&mut player, MoveInput::default(), 20, &world);

        assert!(player.on_ground());
        assert!((player.position.y - 12.6).abs() < 1e-4);
        assert_eq!(player.vertical_velocity(), 0.0);
    }

    #[test]
    fn test_standing_is_stable() {
        let world = ground(10);
        let mut player = Player::new(Vec3::new(8.5, 12.6, 8.5), false);
        for _ in 0..50 {
            player.update(&MoveInput::default(), DT, &world);
            assert!((player.position.y - 12.6).abs() < 1e-4);
        }
    }

    #[test]
    fn test_jump_only_from_ground() {
        let world = ground(10);
        let jump = MoveInput {
            jump: true,
            ..Default::default()
        };

        let mut airborne = Player::new(Vec3::new(8.5, 20.0, 8.5), false);
        airborne.update(&jump, DT, &world);
        assert!(airborne.vertical_velocity() < 0.0);

        let mut standing = Player::new(Vec3::new(8.5, 12.6, 8.5), false);
        standing.update(&jump, DT, &world);
        assert_eq!(standing.vertical_velocity(), JUMP_VELOCITY);
        standing.update(&MoveInput::default(), DT, &world);
        assert!(standing.position.y > 12.6);
    }

    #[test]
    fn test_walk_speed_and_heading() {
        let world = ground(10);
        let mut player = Player::new(Vec3::new(8.5, 12.6, 14.5), false);
        let forward = MoveInput {
            forward: true,
            ..Default::default()
        };
        // Yaw 0 walks toward -Z.
        run(&mut player, forward, 20, &world);
        assert!((player.position.z - (14.5 - WALK_SPEED)).abs() < 1e-3);
        assert!((player.position.x - 8.5).abs() < 1e-3);
    }

    #[test]
    fn test_diagonal_is_normalized() {
        let world = ground(10);
        let mut player = Player::new(Vec3::new(2.5, 12.6, 14.5), false);
        let input = MoveInput {
            forward: true,
            right: true,
            ..Default::default()
        };
        player.update(&input, DT, &world);
        let moved = Vec2::new(player.position.x - 2.5, player.position.z - 14.5);
        assert!((moved.length() - WALK_SPEED * DT).abs() < 1e-4);
    }

    #[test]
    fn test_wall_blocks_movement() {
        let mut world = ground(10);
        for z in 0..16 {
            world.set_block(BlockPos::new(9, 11, z), BlockType::Stone);
        }
        let mut player = Player::new(Vec3::new(8.5, 12.6, 8.5), false);
        player.look(-FRAC_PI_2, 0.0);
        let forward = MoveInput {
            forward: true,
            ..Default::default()
        };
        run(&mut player, forward, 10, &world);

        assert!(player.position.x > 8.5);
        assert!(player.position.x < 9.0);
    }

    #[test]
    fn test_flying_ignores_gravity() {
        let world = World::new();
        let mut player = Player::new(Vec3::new(0.5, 40.0, 0.5), true);
        run(&mut player, MoveInput::default(), 20, &world);
        assert_eq!(player.position.y, 40.0);

        let up = MoveInput {
            jump: true,
            ..Default::default()
        };
        run(&mut player, up, 20, &world);
        assert!((player.position.y - (40.0 + FLY_SPEED)).abs() < 1e-3);

        let down = MoveInput {
            descend: true,
            ..Default::default()
        };
        run(&mut player, down, 10, &world);
        assert!((player.position.y - (40.0 + FLY_SPEED / 2.0)).abs() < 1e-3);
    }

    #[test]
    fn test_look_clamps_pitch() {
        let mut player = Player::default();
        player.look(1.0, 3.0);
        assert_eq!(player.pitch, FRAC_PI_2);
        player.look(1.0, -3.0);
        assert_eq!(player.pitch, -FRAC_PI_2);
        assert_eq!(player.position, SPAWN_POSITION);
    }
}
