//! Headless Craftline client: the local world, player physics, frame
//! timing, and the session glue that keeps it in step with the relay.

pub mod autopilot;
pub mod client;
pub mod game_loop;
pub mod hotbar;
pub mod link;
pub mod local_world;
pub mod player;
pub mod session;

pub use autopilot::Autopilot;
pub use client::{FrameInput, GameClient};
pub use game_loop::{GameLoop, IntervalTimer, MAX_FRAME_TIME};
pub use hotbar::{HOTBAR_SLOTS, Hotbar};
pub use link::{LinkEvent, RelayLink};
pub use local_world::LocalWorld;
pub use player::{MoveInput, Player};
pub use session::{RemotePlayer, RemotePlayers, random_player_id};
