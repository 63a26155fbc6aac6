//! One client session: the local world, the player, and the glue that turns
//! frame input and relayed messages into world edits.
//!
//! [`GameClient::frame`] returns the messages to send instead of sending
//! them, so the caller decides what happens while disconnected.

use std::time::Duration;

use craftline_config::Config;
use craftline_interact::{BlockBreaker, BreakEvent, place_block};
use craftline_net::WireMessage;
use craftline_voxel::BlockWrite;

use crate::game_loop::IntervalTimer;
use crate::hotbar::Hotbar;
use crate::local_world::LocalWorld;
use crate::player::{MoveInput, Player, SPAWN_POSITION};
use crate::session::{
    RemotePlayers, block_from_wire, block_message, join_message, move_message,
};

/// Everything the player does during one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameInput {
    pub movement: MoveInput,
    pub yaw: f32,
    pub pitch: f32,
    /// Break button state. Breaking starts on the frame it goes down.
    pub break_held: bool,
    /// Place once this frame.
    pub place: bool,
    pub select_slot: Option<usize>,
}

pub struct GameClient {
    id: String,
    name: String,
    world: LocalWorld,
    player: Player,
    breaker: BlockBreaker,
    break_was_held: bool,
    hotbar: Hotbar,
    remotes: RemotePlayers,
    chunk_timer: IntervalTimer,
    position_timer: IntervalTimer,
}

impl GameClient {
    /// Spawns the player and loads the chunks around the spawn point.
    pub fn new(config: &Config, id: impl Into<String>) -> Self {
        let id = id.into();
        let mut world = LocalWorld::new(config.world.seed, config.world.render_distance);
        let player = Player::new(SPAWN_POSITION, config.player.fly);
        world.update_chunks(player.chunk());

        Self {
            remotes: RemotePlayers::new(id.clone()),
            id,
            name: config.player.name.clone(),
            world,
            player,
            breaker: BlockBreaker::new(),
            break_was_held: false,
            hotbar: Hotbar::new(),
            chunk_timer: IntervalTimer::new(config.world.chunk_update_interval()),
            position_timer: IntervalTimer::new(config.network.position_send_interval()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn world(&self) -> &LocalWorld {
        &self.world
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn breaker(&self) -> &BlockBreaker {
        &self.breaker
    }

    pub fn hotbar(&self) -> &Hotbar {
        &self.hotbar
    }

    pub fn remotes(&self) -> &RemotePlayers {
        &self.remotes
    }

    /// Announces this player at its current position. Send on every
    /// (re)connect.
    pub fn join_message(&self) -> WireMessage {
        join_message(&self.id, &self.name, self.player.position)
    }

    /// Simulates one frame of `dt` seconds ending at `now`. Returns the
    /// messages the frame produced.
    pub fn frame(&mut self, dt: f32, now: Duration, input: &FrameInput) -> Vec<WireMessage> {
        let mut outgoing = Vec::new();

        if let Some(slot) = input.select_slot {
            self.hotbar.select(slot);
        }
        self.player.look(input.yaw, input.pitch);
        self.player.update(&input.movement, dt, &self.world);

        let ray = self.player.view_ray();
        let pressed = input.break_held && !self.break_was_held;
        self.break_was_held = input.break_held;
        let event = if pressed {
            self.breaker.press(&self.world, &ray, now)
        } else if input.break_held {
            self.breaker.tick(&mut self.world, &ray, now)
        } else {
            self.breaker.release()
        };
        match event {
            Some(BreakEvent::Completed { target, edit }) => {
                tracing::debug!("Broke {} at {:?}", target.block, target.pos);
                outgoing.push(block_message(&edit));
            }
            Some(BreakEvent::Cancelled { target, reason }) => {
                tracing::trace!("Stopped breaking {:?}: {:?}", target.pos, reason);
            }
            _ => {}
        }

        if input.place {
            let block = self.hotbar.selected();
            if let Some(edit) = place_block(&mut self.world, &ray, self.player.position, block) {
                tracing::debug!("Placed {} at {:?}", block, edit.pos);
                outgoing.push(block_message(&edit));
            }
        }

        if self.chunk_timer.advance(dt) {
            self.world.update_chunks(self.player.chunk());
        }
        if self.position_timer.advance(dt) {
            outgoing.push(move_message(&self.id, self.player.position));
        }
        outgoing
    }

    /// Applies one message from the relay.
    pub fn handle_message(&mut self, message: WireMessage) {
        match message {
            WireMessage::Players(roster) => self.remotes.apply_roster(&roster),
            WireMessage::PlayerMove(update) => self.remotes.apply_move(&update),
            WireMessage::PlayerLeave(leave) => {
                self.remotes.remove(&leave.id);
            }
            WireMessage::Block(change) => match block_from_wire(&change) {
                Ok((pos, block)) => {
                    if self.world.set_block(pos, block).is_none() {
                        tracing::trace!("Remote edit at {:?} is outside loaded chunks", pos);
                    }
                }
                Err(e) => tracing::debug!("Ignoring remote block change: {e}"),
            },
            other @ (WireMessage::Join(_) | WireMessage::Move(_)) => {
                tracing::trace!("Ignoring {} from relay", other.kind());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use craftline_interact::BreakState;
    use craftline_net::{BlockChange, PlayerEntry, PlayerLeave, PlayerMove, Roster};
    use craftline_voxel::{BlockAccess, BlockPos, BlockType};
    use glam::Vec3;

    use crate::game_loop::GameLoop;

    const TARGET: BlockPos = BlockPos::new(0, 60, -3);

    fn config() -> Config {
        let mut config = Config::default();
        config.world.render_distance = 1;
        config
    }

    /// A flying client high above the terrain, looking at a lone block.
    fn facing(block: BlockType) -> GameClient {
        let mut config = config();
        config.player.fly = true;
        let mut client = GameClient::new(&config, "me");
        client.player.position = Vec3::new(0.5, 60.5, 0.5);
        client.world.set_block(TARGET, block).unwrap();
        client
    }

    fn run(
        client: &mut GameClient,
        game_loop: &mut GameLoop,
        input: &FrameInput,
        frames: usize,
    ) -> Vec<WireMessage> {
        let mut sent = Vec::new();
        for _ in 0..frames {
            game_loop.advance(0.05, |dt, now| sent.extend(client.frame(dt, now, input)));
        }
        sent
    }

    fn blocks(sent: &[WireMessage]) -> Vec<BlockChange> {
        sent.iter()
            .filter_map(|msg| match msg {
                WireMessage::Block(change) => Some(change.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_new_loads_around_spawn() {
        let client = GameClient::new(&config(), "me");
        assert_eq!(client.world().world().loaded_count(), 9);
        assert_eq!(client.player().position, SPAWN_POSITION);
        assert!(matches!(
            client.join_message(),
            WireMessage::Join(join) if join.id == "me" && join.name == "Player" && join.y == Some(30.0)
        ));
    }

    #[test]
    fn test_position_sent_on_interval() {
        let mut client = facing(BlockType::Stone);
        let mut game_loop = GameLoop::new();
        let mut sent = Vec::new();
        for _ in 0..10 {
            game_loop.advance(0.04, |dt, now| {
                sent.extend(client.frame(dt, now, &FrameInput::default()))
            });
        }
        let moves = sent
            .iter()
            .filter(|msg| matches!(msg, WireMessage::Move(m) if m.id == "me" && m.y == 60.5))
            .count();
        assert_eq!(moves, 3);
    }

    #[test]
    fn test_holding_break_destroys_and_reports() {
        let mut client = facing(BlockType::Leaves);
        let mut game_loop = GameLoop::new();
        let hold = FrameInput {
            break_held: true,
            ..Default::default()
        };
        let sent = run(&mut client, &mut game_loop, &hold, 10);

        assert_eq!(client.world().get_block(TARGET), BlockType::Air);
        assert_eq!(
            blocks(&sent),
            vec![BlockChange {
                x: 0,
                y: 60,
                z: -3,
                block_type: 0,
            }]
        );
        assert_eq!(client.breaker().state(), BreakState::Idle);
    }

    #[test]
    fn test_releasing_early_keeps_block() {
        let mut client = facing(BlockType::Stone);
        let mut game_loop = GameLoop::new();
        let hold = FrameInput {
            break_held: true,
            ..Default::default()
        };
        run(&mut client, &mut game_loop, &hold, 5);
        assert!(client.breaker().progress() > 0.0);

        let sent = run(&mut client, &mut game_loop, &FrameInput::default(), 1);
        assert!(blocks(&sent).is_empty());
        assert_eq!(client.breaker().state(), BreakState::Idle);
        assert_eq!(client.world().get_block(TARGET), BlockType::Stone);
    }

    #[test]
    fn test_break_needs_fresh_press_after_completion() {
        let mut client = facing(BlockType::Leaves);
        let mut game_loop = GameLoop::new();
        let hold = FrameInput {
            break_held: true,
            ..Default::default()
        };
        run(&mut client, &mut game_loop, &hold, 10);
        client.world.set_block(TARGET, BlockType::Leaves).unwrap();

        let sent = run(&mut client, &mut game_loop, &hold, 10);
        assert!(blocks(&sent).is_empty());
        assert_eq!(client.world().get_block(TARGET), BlockType::Leaves);
    }

    #[test]
    fn test_place_uses_hotbar_selection() {
        let mut client = facing(BlockType::Stone);
        let mut game_loop = GameLoop::new();
        let place = FrameInput {
            place: true,
            select_slot: Some(5),
            ..Default::default()
        };
        let sent = run(&mut client, &mut game_loop, &place, 1);

        assert_eq!(client.hotbar().selected(), BlockType::Planks);
        assert_eq!(
            client.world().get_block(BlockPos::new(0, 60, -2)),
            BlockType::Planks
        );
        assert_eq!(
            blocks(&sent),
            vec![BlockChange {
                x: 0,
                y: 60,
                z: -2,
                block_type: 9,
            }]
        );
    }

    #[test]
    fn test_remote_block_applies_without_echo() {
        let mut client = GameClient::new(&config(), "me");
        let pos = BlockPos::new(3, 62, 3);
        client.handle_message(WireMessage::Block(BlockChange {
            x: 3,
            y: 62,
            z: 3,
            block_type: 4,
        }));
        assert_eq!(client.world().get_block(pos), BlockType::Wood);
        assert!(client.world().meshes().get(pos.chunk()).unwrap().faces_of(pos).count() > 0);

        client.handle_message(WireMessage::Block(BlockChange {
            x: 3,
            y: 62,
            z: 3,
            block_type: 200,
        }));
        assert_eq!(client.world().get_block(pos), BlockType::Wood);

        // Far away: ignored.
        client.handle_message(WireMessage::Block(BlockChange {
            x: 1000,
            y: 10,
            z: 0,
            block_type: 3,
        }));
        assert_eq!(client.world().get_block(BlockPos::new(1000, 10, 0)), BlockType::Air);
    }

    #[test]
    fn test_mirrors_follow_relay() {
        let mut client = GameClient::new(&config(), "me");
        let entry = |id: &str| PlayerEntry {
            id: id.into(),
            name: id.to_uppercase(),
            x: 0.0,
            y: 30.0,
            z: 0.0,
        };
        client.handle_message(WireMessage::Players(Roster {
            players: vec![entry("me"), entry("other")],
        }));
        assert_eq!(client.remotes().len(), 1);

        client.handle_message(WireMessage::PlayerMove(PlayerMove {
            id: "other".into(),
            x: 4.0,
            y: 31.0,
            z: 4.0,
        }));
        assert_eq!(
            client.remotes().get("other").unwrap().position,
            Vec3::new(4.0, 31.0, 4.0)
        );

        client.handle_message(WireMessage::PlayerLeave(PlayerLeave {
            id: "other".into(),
        }));
        assert!(client.remotes().is_empty());
    }

    #[test]
    fn test_walking_streams_chunks() {
        let mut config = config();
        config.player.fly = true;
        let mut client = GameClient::new(&config, "me");
        client.player.position = Vec3::new(8.0, 60.0, 8.0);
        let mut game_loop = GameLoop::new();
        // Yaw 0 flies toward -Z at 10 blocks/s.
        let fly = FrameInput {
            movement: MoveInput {
                forward: true,
                ..Default::default()
            },
            ..Default::default()
        };
        run(&mut client, &mut game_loop, &fly, 80);

        let center = client.player().chunk();
        assert!(center.z <= -2);
        assert!(client.world().world().contains_chunk(center));
        assert!(!client.world().world().contains_chunk(craftline_voxel::ChunkPos::new(0, 1)));
    }
}
