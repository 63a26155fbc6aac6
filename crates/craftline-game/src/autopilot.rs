//! Scripted input for the headless client.
//!
//! The bot walks a slow circle, hopping over steps. Every [`BREAK_CYCLE`]
//! seconds it stops, looks down ahead and holds break for [`BREAK_HOLD`]
//! seconds. Every [`PLACE_EVERY`] seconds it places the next hotbar block.

use crate::client::FrameInput;
use crate::hotbar::HOTBAR_SLOTS;
use crate::player::{MoveInput, Player};

/// Radians per second.
pub const TURN_RATE: f32 = 0.35;
pub const BREAK_CYCLE: f32 = 6.0;
pub const BREAK_HOLD: f32 = 2.0;
pub const PLACE_EVERY: f32 = 9.0;
/// Pitch while breaking or placing.
pub const LOOK_DOWN: f32 = -0.6;

#[derive(Debug, Default)]
pub struct Autopilot {
    elapsed: f32,
    placed: usize,
}

impl Autopilot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Input for the next frame of `dt` seconds.
    pub fn next_input(&mut self, dt: f32, player: &Player) -> FrameInput {
        let before = self.elapsed;
        self.elapsed += dt;

        let breaking = self.elapsed % BREAK_CYCLE < BREAK_HOLD;
        let place = (self.elapsed / PLACE_EVERY).floor() > (before / PLACE_EVERY).floor();
        let select_slot = place.then(|| {
            let slot = self.placed % HOTBAR_SLOTS.len();
            self.placed += 1;
            slot
        });

        let walking = !breaking && !place;
        FrameInput {
            movement: MoveInput {
                forward: walking,
                jump: walking && player.on_ground(),
                ..Default::default()
            },
            yaw: self.elapsed * TURN_RATE,
            pitch: if walking { 0.0 } else { LOOK_DOWN },
            break_held: breaking,
            place,
            select_slot,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script(seconds: f32, dt: f32) -> Vec<FrameInput> {
        let mut pilot = Autopilot::new();
        let player = Player::default();
        let frames = (seconds / dt).round() as usize;
        (0..frames).map(|_| pilot.next_input(dt, &player)).collect()
    }

    #[test]
    fn test_break_window_each_cycle() {
        let inputs = script(12.0, 0.1);
        // t = 0.1 .. 1.9 held, 2.1 .. 5.9 walking.
        assert!(inputs[0].break_held);
        assert!(inputs[15].break_held);
        assert!(!inputs[25].break_held);
        assert!(inputs[25].movement.forward);
        assert!(inputs[61].break_held);
        assert!(!inputs[61].movement.forward);
    }

    #[test]
    fn test_places_once_per_interval_cycling_slots() {
        let inputs = script(30.0, 0.1);
        let slots: Vec<usize> = inputs
            .iter()
            .filter(|input| input.place)
            .filter_map(|input| input.select_slot)
            .collect();
        assert_eq!(slots, vec![0, 1, 2]);
    }

    #[test]
    fn test_yaw_turns_steadily() {
        let inputs = script(2.0, 0.5);
        let yaws: Vec<f32> = inputs.iter().map(|input| input.yaw).collect();
        assert!(yaws.windows(2).all(|w| w[1] > w[0]));
        assert!((yaws[3] - 2.0 * TURN_RATE).abs() < 1e-5);
    }
}
