//! Timed block breaking.
//!
//! ```text
//! Idle --press on target--> Breaking --progress reaches 1--> Completed -> Idle
//!                              |
//!                              +--target changes / release--> Cancelled -> Idle
//! ```
//!
//! Time is passed in explicitly as a monotonic [`Duration`] so the machine
//! can be driven by a real clock or by tests.

use std::time::Duration;

use craftline_voxel::{BlockAccess, BlockEdit, BlockPos, BlockType, BlockWrite};

use crate::raycast::{ViewRay, raycast};

/// The block being broken, captured when breaking starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BreakTarget {
    pub pos: BlockPos,
    pub block: BlockType,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BreakState {
    Idle,
    Breaking {
        target: BreakTarget,
        started: Duration,
        progress: f32,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CancelReason {
    /// The viewer now looks at another block, or at nothing.
    TargetChanged,
    /// The break input was released.
    Released,
}

/// Observable transitions of the breaker.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BreakEvent {
    Started(BreakTarget),
    Progress { target: BreakTarget, progress: f32 },
    Cancelled { target: BreakTarget, reason: CancelReason },
    /// The target was set to Air.
    Completed { target: BreakTarget, edit: BlockEdit },
}

/// Local break-progress state machine for one viewer.
#[derive(Debug)]
pub struct BlockBreaker {
    state: BreakState,
}

impl BlockBreaker {
    pub fn new() -> Self {
        Self {
            state: BreakState::Idle,
        }
    }

    pub fn state(&self) -> BreakState {
        self.state
    }

    /// Current progress in `[0, 1]`; 0 when idle.
    pub fn progress(&self) -> f32 {
        match self.state {
            BreakState::Idle => 0.0,
            BreakState::Breaking { progress, .. } => progress,
        }
    }

    pub fn target(&self) -> Option<BreakTarget> {
        match self.state {
            BreakState::Idle => None,
            BreakState::Breaking { target, .. } => Some(target),
        }
    }

    /// Break input pressed. Starts breaking whatever `ray` targets.
    ///
    /// Pressing while already breaking restarts on the current target.
    pub fn press(
        &mut self,
        world: &impl BlockAccess,
        ray: &ViewRay,
        now: Duration,
    ) -> Option<BreakEvent> {
        let hit = raycast(world, ray)?;
        let target = BreakTarget {
            pos: hit.pos,
            block: hit.block,
        };
        self.state = BreakState::Breaking {
            target,
            started: now,
            progress: 0.0,
        };
        tracing::trace!("Breaking {:?} at {:?}", target.block, target.pos);
        Some(BreakEvent::Started(target))
    }

    /// Break input released.
    pub fn release(&mut self) -> Option<BreakEvent> {
        let target = self.target()?;
        self.state = BreakState::Idle;
        Some(BreakEvent::Cancelled {
            target,
            reason: CancelReason::Released,
        })
    }

    /// Advances a break in progress. Call once per tick while the input is held.
    ///
    /// Re-targets with `ray`; a different target cancels without touching any
    /// block. On completion the target is set to Air through `world`.
    pub fn tick(
        &mut self,
        world: &mut impl BlockWrite,
        ray: &ViewRay,
        now: Duration,
    ) -> Option<BreakEvent> {
        let BreakState::Breaking {
            target, started, ..
        } = self.state
        else {
            return None;
        };

        let still_targeted = raycast(world, ray).is_some_and(|hit| hit.pos == target.pos);
        if !still_targeted {
            self.state = BreakState::Idle;
            return Some(BreakEvent::Cancelled {
                target,
                reason: CancelReason::TargetChanged,
            });
        }

        let elapsed = now.saturating_sub(started);
        let progress =
            (elapsed.as_secs_f32() / target.block.break_duration().as_secs_f32()).min(1.0);

        if progress < 1.0 {
            self.state = BreakState::Breaking {
                target,
                started,
                progress,
            };
            return Some(BreakEvent::Progress { target, progress });
        }

        self.state = BreakState::Idle;
        let edit = world.set_block(target.pos, BlockType::Air)?;
        Some(BreakEvent::Completed { target, edit })
    }
}

impl Default for BlockBreaker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use craftline_voxel::{Chunk, ChunkPos, World};
    use glam::Vec3;

    fn setup() -> (World, ViewRay) {
        let mut world = World::new();
        world.insert_chunk(ChunkPos::new(0, 0), Chunk::new());
        world.set_block(BlockPos::new(3, 10, 0), BlockType::Stone);
        world.set_block(BlockPos::new(3, 11, 2), BlockType::Dirt);
        let ray = ViewRay::new(Vec3::new(0.5, 10.5, 0.5), Vec3::X);
        (world, ray)
    }

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_progress_over_break_duration() {
        let (mut world, ray) = setup();
        let mut breaker = BlockBreaker::new();
        let t0 = ms(1000);

        assert!(matches!(breaker.press(&world, &ray, t0), Some(BreakEvent::Started(_))));
        assert_eq!(breaker.progress(), 0.0);

        // Stone takes 1200 ms.
        let event = breaker.tick(&mut world, &ray, t0 + ms(600)).unwrap();
        match event {
            BreakEvent::Progress { progress, .. } => assert!((progress - 0.5).abs() < 1e-4),
            other => panic!("unexpected {other:?}"),
        }
        let event = breaker.tick(&mut world, &ray, t0 + ms(1199)).unwrap();
        assert!(matches!(event, BreakEvent::Progress { progress, .. } if progress > 0.99));
        assert_eq!(world.get_block(BlockPos::new(3, 10, 0)), BlockType::Stone);
    }

    #[test]
    fn test_completion_breaks_exactly_once() {
        let (mut world, ray) = setup();
        let mut breaker = BlockBreaker::new();
        breaker.press(&world, &ray, ms(0));

        let event = breaker.tick(&mut world, &ray, ms(1200)).unwrap();
        let BreakEvent::Completed { target, edit } = event else {
            panic!("expected completion, got {event:?}");
        };
        assert_eq!(target.block, BlockType::Stone);
        assert_eq!(edit.previous, BlockType::Stone);
        assert_eq!(world.get_block(BlockPos::new(3, 10, 0)), BlockType::Air);
        assert_eq!(breaker.state(), BreakState::Idle);

        // Idle machine does nothing further.
        assert!(breaker.tick(&mut world, &ray, ms(5000)).is_none());
    }

    #[test]
    fn test_target_change_cancels_without_mutation() {
        let (mut world, ray) = setup();
        let mut breaker = BlockBreaker::new();
        breaker.press(&world, &ray, ms(0));
        breaker.tick(&mut world, &ray, ms(300));

        let elsewhere = ViewRay::new(Vec3::new(0.5, 11.5, 2.5), Vec3::X);
        let event = breaker.tick(&mut world, &elsewhere, ms(400)).unwrap();
        assert!(matches!(
            event,
            BreakEvent::Cancelled {
                reason: CancelReason::TargetChanged,
                ..
            }
        ));
        assert_eq!(breaker.progress(), 0.0);
        assert_eq!(world.get_block(BlockPos::new(3, 10, 0)), BlockType::Stone);
        assert_eq!(world.get_block(BlockPos::new(3, 11, 2)), BlockType::Dirt);
    }

    #[test]
    fn test_looking_away_at_nothing_cancels() {
        let (mut world, ray) = setup();
        let mut breaker = BlockBreaker::new();
        breaker.press(&world, &ray, ms(0));
        let sky = ViewRay::new(ray.origin, Vec3::Y);
        assert!(matches!(
            breaker.tick(&mut world, &sky, ms(100)),
            Some(BreakEvent::Cancelled { .. })
        ));
    }

    #[test]
    fn test_release_cancels() {
        let (mut world, ray) = setup();
        let mut breaker = BlockBreaker::new();
        breaker.press(&world, &ray, ms(0));
        assert!(matches!(
            breaker.release(),
            Some(BreakEvent::Cancelled {
                reason: CancelReason::Released,
                ..
            })
        ));
        assert!(breaker.release().is_none());
        assert!(breaker.tick(&mut world, &ray, ms(2000)).is_none());
        assert_eq!(world.get_block(BlockPos::new(3, 10, 0)), BlockType::Stone);
    }

    #[test]
    fn test_press_without_target() {
        let (world, _) = setup();
        let mut breaker = BlockBreaker::new();
        let sky = ViewRay::new(Vec3::new(0.5, 10.5, 0.5), Vec3::Y);
        assert!(breaker.press(&world, &sky, ms(0)).is_none());
        assert_eq!(breaker.state(), BreakState::Idle);
    }
}
