//! Session protocol and world relay: frame codec, upgrade handshake, JSON
//! message schema, the relay task, and the server and client that carry it.

pub mod framing;
pub mod handshake;
pub mod messages;
pub mod reconnection;
pub mod relay;
pub mod tcp_client;
pub mod tcp_server;

pub use framing::{
    Frame, FrameConfig, FrameError, Opcode, apply_mask, encode_frame, read_frame, write_frame,
};
pub use handshake::{
    ACCEPT_GUID, DEFAULT_HANDSHAKE_TIMEOUT, HandshakeError, HttpHead, accept_key, accept_upgrade,
    request_upgrade,
};
pub use messages::{
    BlockChange, DEFAULT_JOIN_Y, Inbound, Join, MessageError, Move, PlayerEntry, PlayerLeave,
    PlayerMove, Roster, WireMessage, decode_inbound, decode_message, encode_message,
};
pub use reconnection::{ReconnectError, ReconnectPolicy, ReconnectState, reconnect_loop};
pub use relay::{RelayEvent, RelayHandle, SessionRegistry, WorldRelay};
pub use tcp_client::{ClientError, ConnectionState, ConnectionStateWatch, RelayClient};
pub use tcp_server::{
    ConnectionId, ConnectionLimitReached, ConnectionLimiter, IdGenerator, RelayServer,
    ServerConfig,
};
