//! Session message schema.
//!
//! Messages are JSON objects tagged by a `type` field and carried as the
//! payload of text frames. Use [`decode_message`] and [`encode_message`]
//! rather than calling `serde_json` directly so that unknown `type` values
//! are told apart from malformed payloads. The relay uses [`decode_inbound`],
//! which keeps `block` payloads as the sender's text.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Height used when a `join` omits `y`.
pub const DEFAULT_JOIN_Y: f64 = 30.0;

// ---------------------------------------------------------------------------
// Top-level enum
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WireMessage {
    // --- client -> server ---
    /// A client announces itself.
    Join(Join),
    /// A client reports its own position.
    Move(Move),

    // --- server -> client ---
    /// Another player's position changed.
    PlayerMove(PlayerMove),
    /// The full roster of joined players.
    Players(Roster),
    /// A player disconnected.
    PlayerLeave(PlayerLeave),

    // --- both directions ---
    /// A block was set. The relay forwards the sender's JSON untouched.
    Block(BlockChange),
}

/// Every `type` value [`WireMessage`] understands.
pub const KNOWN_TYPES: [&str; 6] = ["join", "move", "playerMove", "players", "playerLeave", "block"];

// ---------------------------------------------------------------------------
// Payload structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Join {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
}

impl Join {
    /// Declared position with defaults applied: x and z 0, y [`DEFAULT_JOIN_Y`].
    pub fn position(&self) -> [f64; 3] {
        [
            self.x.unwrap_or(0.0),
            self.y.unwrap_or(DEFAULT_JOIN_Y),
            self.z.unwrap_or(0.0),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Move {
    /// Informational; the relay uses the id the connection joined with.
    #[serde(default)]
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerMove {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockChange {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    /// Block id as a client understands it. Payloads outside these types
    /// still pass through the relay; clients drop them.
    #[serde(rename = "blockType")]
    pub block_type: u8,
}

/// One roster entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerEntry {
    pub id: String,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Roster {
    pub players: Vec<PlayerEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerLeave {
    pub id: String,
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("message has no string `type` field")]
    MissingType,

    #[error("unknown message type {0:?}")]
    UnknownType(String),
}

impl WireMessage {
    /// The `type` tag this message is sent with.
    pub fn kind(&self) -> &'static str {
        match self {
            WireMessage::Join(_) => "join",
            WireMessage::Move(_) => "move",
            WireMessage::PlayerMove(_) => "playerMove",
            WireMessage::Players(_) => "players",
            WireMessage::PlayerLeave(_) => "playerLeave",
            WireMessage::Block(_) => "block",
        }
    }
}

/// Serializes a message to its JSON text.
pub fn encode_message(msg: &WireMessage) -> Result<String, MessageError> {
    Ok(serde_json::to_string(msg)?)
}

fn known_kind(value: &serde_json::Value) -> Result<&str, MessageError> {
    let kind = value
        .get("type")
        .and_then(serde_json::Value::as_str)
        .ok_or(MessageError::MissingType)?;
    if !KNOWN_TYPES.contains(&kind) {
        return Err(MessageError::UnknownType(kind.to_owned()));
    }
    Ok(kind)
}

/// Parses JSON text into a message.
///
/// Unknown `type` values yield [`MessageError::UnknownType`] so callers can
/// ignore them without treating them as corrupt.
pub fn decode_message(text: &str) -> Result<WireMessage, MessageError> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    known_kind(&value)?;
    Ok(serde_json::from_value(value)?)
}

/// A client payload as the relay receives it.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Message(WireMessage),
    /// A `block` message, kept as the sender's JSON text.
    Block(Arc<str>),
}

/// Like [`decode_message`], except that a `block` body is not checked
/// against [`BlockChange`]: any JSON object tagged `block` is returned as-is.
pub fn decode_inbound(text: &str) -> Result<Inbound, MessageError> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    if known_kind(&value)? == "block" {
        return Ok(Inbound::Block(text.into()));
    }
    Ok(Inbound::Message(serde_json::from_value(value)?))
}
