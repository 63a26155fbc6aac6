//! Frame codec for the session stream.
//!
//! Every message travels as one frame:
//!
//! ```text
//! +--------+----------+----------------------+-------------+-----------+
//! | FIN|op | M|len7   | ext len (0, 2, 8 B)  | mask (0/4B) | payload   |
//! +--------+----------+----------------------+-------------+-----------+
//! ```
//!
//! `len7` below 126 is the payload length itself. 126 means a 16-bit
//! big-endian length follows, 127 a 64-bit one. When the `M` bit is set a
//! 4-byte key follows and the payload is XORed with it, repeating every 4
//! bytes. Clients mask what they send; the server never does.

use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Largest length that fits directly in the 7-bit field.
const MAX_SHORT_LEN: usize = 125;
const LEN_16: u8 = 126;
const LEN_64: u8 = 127;

const FIN_BIT: u8 = 0x80;
const MASK_BIT: u8 = 0x80;

/// Frame type carried in the low nibble of the first byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Continuation,
    Text,
    Binary,
    Close,
    Ping,
    Pong,
    Other(u8),
}

impl Opcode {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x0f {
            0x0 => Opcode::Continuation,
            0x1 => Opcode::Text,
            0x2 => Opcode::Binary,
            0x8 => Opcode::Close,
            0x9 => Opcode::Ping,
            0xA => Opcode::Pong,
            other => Opcode::Other(other),
        }
    }

    pub fn bits(self) -> u8 {
        match self {
            Opcode::Continuation => 0x0,
            Opcode::Text => 0x1,
            Opcode::Binary => 0x2,
            Opcode::Close => 0x8,
            Opcode::Ping => 0x9,
            Opcode::Pong => 0xA,
            Opcode::Other(bits) => bits & 0x0f,
        }
    }
}

/// A decoded frame with its payload already unmasked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub fin: bool,
    pub opcode: Opcode,
    pub payload: Vec<u8>,
}

impl Frame {
    /// The payload as UTF-8 text, if it is valid.
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.payload).ok()
    }
}

/// Configuration for the framing layer.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum accepted payload size in bytes. Default: 1 MiB.
    pub max_payload_size: u64,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: 1_048_576,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The declared payload exceeds the configured maximum. On read the
    /// payload has already been skipped, so the stream is still aligned.
    #[error("payload of {size} bytes exceeds maximum {max}")]
    PayloadTooLarge { size: u64, max: u64 },

    #[error("connection closed")]
    ConnectionClosed,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// XORs `payload` in place with the repeating 4-byte `mask`.
///
/// Applying the same mask twice restores the original bytes.
pub fn apply_mask(payload: &mut [u8], mask: [u8; 4]) {
    for (i, byte) in payload.iter_mut().enumerate() {
        *byte ^= mask[i % 4];
    }
}

/// Encodes a single final frame using the smallest length form.
pub fn encode_frame(opcode: Opcode, payload: &[u8], mask: Option<[u8; 4]>) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 14);
    out.push(FIN_BIT | opcode.bits());

    let mask_bit = if mask.is_some() { MASK_BIT } else { 0 };
    let len = payload.len();
    if len <= MAX_SHORT_LEN {
        out.push(mask_bit | len as u8);
    } else if let Ok(len) = u16::try_from(len) {
        out.push(mask_bit | LEN_16);
        out.extend_from_slice(&len.to_be_bytes());
    } else {
        out.push(mask_bit | LEN_64);
        out.extend_from_slice(&(len as u64).to_be_bytes());
    }

    match mask {
        Some(mask) => {
            out.extend_from_slice(&mask);
            let start = out.len();
            out.extend_from_slice(payload);
            apply_mask(&mut out[start..], mask);
        }
        None => out.extend_from_slice(payload),
    }
    out
}

async fn read_exact_or_closed<R: AsyncReadExt + Unpin>(
    reader: &mut R,
    buf: &mut [u8],
) -> Result<(), FrameError> {
    match reader.read_exact(buf).await {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            Err(FrameError::ConnectionClosed)
        }
        Err(e) => Err(FrameError::Io(e)),
    }
}

/// Reads one frame from the stream.
///
/// Returns [`FrameError::ConnectionClosed`] if the peer closes the stream
/// before the frame is complete.
pub async fn read_frame<R: AsyncReadExt + Unpin>(
    reader: &mut R,
    config: &FrameConfig,
) -> Result<Frame, FrameError> {
    let mut head = [0u8; 2];
    read_exact_or_closed(reader, &mut head).await?;

    let fin = head[0] & FIN_BIT != 0;
    let opcode = Opcode::from_bits(head[0]);
    let masked = head[1] & MASK_BIT != 0;

    // The escape value decides how many length bytes follow.
    let len = match head[1] & 0x7f {
        LEN_16 => {
            let mut buf = [0u8; 2];
            read_exact_or_closed(reader, &mut buf).await?;
            u64::from(u16::from_be_bytes(buf))
        }
        LEN_64 => {
            let mut buf = [0u8; 8];
            read_exact_or_closed(reader, &mut buf).await?;
            u64::from_be_bytes(buf)
        }
        short => u64::from(short),
    };

    let mask = if masked {
        let mut key = [0u8; 4];
        read_exact_or_closed(reader, &mut key).await?;
        Some(key)
    } else {
        None
    };

    if len > config.max_payload_size {
        let skipped =
            tokio::io::copy(&mut (&mut *reader).take(len), &mut tokio::io::sink()).await?;
        if skipped < len {
            return Err(FrameError::ConnectionClosed);
        }
        return Err(FrameError::PayloadTooLarge {
            size: len,
            max: config.max_payload_size,
        });
    }

    let mut payload = vec![0u8; len as usize];
    read_exact_or_closed(reader, &mut payload).await?;
    if let Some(mask) = mask {
        apply_mask(&mut payload, mask);
    }

    Ok(Frame {
        fin,
        opcode,
        payload,
    })
}

/// Writes one final frame and flushes.
pub async fn write_frame<W: AsyncWriteExt + Unpin>(
    writer: &mut W,
    opcode: Opcode,
    payload: &[u8],
    mask: Option<[u8; 4]>,
    config: &FrameConfig,
) -> Result<(), FrameError> {
    let len = payload.len() as u64;
    if len > config.max_payload_size {
        return Err(FrameError::PayloadTooLarge {
            size: len,
            max: config.max_payload_size,
        });
    }

    writer.write_all(&encode_frame(opcode, payload, mask)).await?;
    writer.flush().await?;
    Ok(())
}
