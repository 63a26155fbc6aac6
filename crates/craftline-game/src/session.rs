//! Client side of the session protocol: outgoing message builders and the
//! mirrors of other players.

use craftline_net::{BlockChange, Join, Move, PlayerMove, Roster, WireMessage};
use craftline_voxel::{BlockEdit, BlockPos, BlockType, UnknownBlockId};
use glam::Vec3;
use rand::Rng;
use rustc_hash::FxHashMap;

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
pub const PLAYER_ID_LEN: usize = 9;

/// Random lowercase base-36 player id.
pub fn random_player_id() -> String {
    let mut rng = rand::rng();
    (0..PLAYER_ID_LEN)
        .map(|_| ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())] as char)
        .collect()
}

pub fn join_message(id: &str, name: &str, position: Vec3) -> WireMessage {
    WireMessage::Join(Join {
        id: id.to_string(),
        name: name.to_string(),
        x: Some(f64::from(position.x)),
        y: Some(f64::from(position.y)),
        z: Some(f64::from(position.z)),
    })
}

pub fn move_message(id: &str, position: Vec3) -> WireMessage {
    WireMessage::Move(Move {
        id: id.to_string(),
        x: f64::from(position.x),
        y: f64::from(position.y),
        z: f64::from(position.z),
    })
}

pub fn block_message(edit: &BlockEdit) -> WireMessage {
    WireMessage::Block(BlockChange {
        x: edit.pos.x,
        y: edit.pos.y,
        z: edit.pos.z,
        block_type: edit.current.into(),
    })
}

/// Decodes a relayed block change.
pub fn block_from_wire(change: &BlockChange) -> Result<(BlockPos, BlockType), UnknownBlockId> {
    let block = BlockType::try_from(change.block_type)?;
    Ok((BlockPos::new(change.x, change.y, change.z), block))
}

fn vec3(x: f64, y: f64, z: f64) -> Vec3 {
    Vec3::new(x as f32, y as f32, z as f32)
}

#[derive(Clone, Debug, PartialEq)]
pub struct RemotePlayer {
    pub name: String,
    pub position: Vec3,
}

/// Other players as last reported by the relay, keyed by id.
#[derive(Debug)]
pub struct RemotePlayers {
    own_id: String,
    players: FxHashMap<String, RemotePlayer>,
}

impl RemotePlayers {
    pub fn new(own_id: impl Into<String>) -> Self {
        Self {
            own_id: own_id.into(),
            players: FxHashMap::default(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&RemotePlayer> {
        self.players.get(id)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RemotePlayer)> {
        self.players.iter().map(|(id, player)| (id.as_str(), player))
    }

    /// Adds or updates every roster entry except our own.
    pub fn apply_roster(&mut self, roster: &Roster) {
        for entry in &roster.players {
            if entry.id == self.own_id {
                continue;
            }
            let position = vec3(entry.x, entry.y, entry.z);
            self.players
                .entry(entry.id.clone())
                .and_modify(|player| {
                    player.name.clone_from(&entry.name);
                    player.position = position;
                })
                .or_insert_with(|| {
                    tracing::info!("{} joined", entry.name);
                    RemotePlayer {
                        name: entry.name.clone(),
                        position,
                    }
                });
        }
    }

    /// Moves a mirror. An id not seen yet is added without a name.
    pub fn apply_move(&mut self, update: &PlayerMove) {
        if update.id == self.own_id {
            return;
        }
        let position = vec3(update.x, update.y, update.z);
        self.players
            .entry(update.id.clone())
            .and_modify(|player| player.position = position)
            .or_insert_with(|| RemotePlayer {
                name: String::new(),
                position,
            });
    }

    pub fn remove(&mut self, id: &str) -> Option<RemotePlayer> {
        let removed = self.players.remove(id);
        if let Some(player) = &removed {
            tracing::info!("{} left", player.name);
        }
        removed
    }
}
