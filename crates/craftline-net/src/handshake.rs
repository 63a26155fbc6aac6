//! HTTP/1.1 upgrade handshake that opens a framed session.
//!
//! The client sends a `GET` with `Upgrade: websocket` and a random
//! `Sec-WebSocket-Key`. The server answers `101 Switching Protocols` with
//! `Sec-WebSocket-Accept = base64(sha1(key + GUID))`. Any other request gets
//! `404 Not Found` and the connection is closed.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use sha1::{Digest, Sha1};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt};

/// Fixed GUID appended to the client key before hashing.
pub const ACCEPT_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// Upper bound on the request or response head, including the blank line.
pub const MAX_HEAD_BYTES: usize = 8 * 1024;

/// How long either side waits for the peer's head. Default for
/// [`ServerConfig`](crate::ServerConfig) and [`RelayClient`](crate::RelayClient).
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

const NOT_FOUND_RESPONSE: &[u8] = b"HTTP/1.1 404 Not Found\r\n\
Content-Type: text/plain\r\n\
Content-Length: 9\r\n\
Connection: close\r\n\r\n\
Not Found";

const BAD_REQUEST_RESPONSE: &[u8] = b"HTTP/1.1 400 Bad Request\r\n\
Content-Length: 0\r\n\
Connection: close\r\n\r\n";

#[derive(Debug, thiserror::Error)]
pub enum HandshakeError {
    #[error("connection closed during handshake")]
    ConnectionClosed,

    #[error("handshake head exceeds {MAX_HEAD_BYTES} bytes")]
    HeadTooLarge,

    #[error("malformed handshake line: {0:?}")]
    Malformed(String),

    /// A plain HTTP request; it was answered with 404.
    #[error("not an upgrade request: {0}")]
    NotUpgrade(String),

    #[error("upgrade request without Sec-WebSocket-Key")]
    MissingKey,

    #[error("server refused upgrade: {0}")]
    Rejected(String),

    #[error("Sec-WebSocket-Accept does not match the request key")]
    AcceptMismatch,

    #[error("no handshake within {0:?}")]
    TimedOut(Duration),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Start line and headers of an HTTP request or response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpHead {
    pub start_line: String,
    pub headers: Vec<(String, String)>,
}

impl HttpHead {
    /// First value of header `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Whether this is a request to switch to the framed protocol.
    pub fn is_upgrade(&self) -> bool {
        self.header("upgrade")
            .is_some_and(|value| value.trim().eq_ignore_ascii_case("websocket"))
    }

    /// Request target, e.g. `/` in `GET / HTTP/1.1`.
    pub fn path(&self) -> &str {
        self.start_line.split_whitespace().nth(1).unwrap_or("")
    }
}

/// `Sec-WebSocket-Accept` value for a client key.
pub fn accept_key(client_key: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(client_key.trim().as_bytes());
    hasher.update(ACCEPT_GUID.as_bytes());
    BASE64.encode(hasher.finalize())
}

/// Fresh random `Sec-WebSocket-Key`.
pub fn generate_key() -> String {
    let nonce: [u8; 16] = rand::random();
    BASE64.encode(nonce)
}

/// Reads an HTTP head up to and including the empty line.
pub async fn read_head<R: AsyncBufRead + Unpin>(reader: &mut R) -> Result<HttpHead, HandshakeError> {
    let mut lines = Vec::new();
    let mut total = 0usize;

    loop {
        let remaining = MAX_HEAD_BYTES.saturating_sub(total);
        if remaining == 0 {
            return Err(HandshakeError::HeadTooLarge);
        }

        let mut line = String::new();
        let n = (&mut *reader)
            .take(remaining as u64)
            .read_line(&mut line)
            .await?;
        if n == 0 {
            return Err(HandshakeError::ConnectionClosed);
        }
        total += n;
        if !line.ends_with('\n') {
            return Err(if total >= MAX_HEAD_BYTES {
                HandshakeError::HeadTooLarge
            } else {
                HandshakeError::ConnectionClosed
            });
        }

        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            break;
        }
        lines.push(line.to_owned());
    }

    let mut lines = lines.into_iter();
    let start_line = lines
        .next()
        .ok_or_else(|| HandshakeError::Malformed(String::new()))?;

    let headers = lines
        .map(|line| {
            line.split_once(':')
                .map(|(name, value)| (name.trim().to_owned(), value.trim().to_owned()))
                .ok_or(HandshakeError::Malformed(line))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(HttpHead {
        start_line,
        headers,
    })
}

/// Server side: reads the request and answers it.
///
/// Non-upgrade requests get a 404, upgrades without a key a 400; both are
/// reported as errors and the caller should drop the connection.
pub async fn accept_upgrade<R, W>(reader: &mut R, writer: &mut W) -> Result<HttpHead, HandshakeError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWriteExt + Unpin,
{
    let head = read_head(reader).await?;

    if !head.is_upgrade() {
        writer.write_all(NOT_FOUND_RESPONSE).await?;
        writer.flush().await?;
        return Err(HandshakeError::NotUpgrade(head.start_line));
    }

    let Some(key) = head.header("sec-websocket-key") else {
        writer.write_all(BAD_REQUEST_RESPONSE).await?;
        writer.flush().await?;
        return Err(HandshakeError::MissingKey);
    };

    let response = format!(
        "HTTP/1.1 101 Switching Protocols\r\n\
         Upgrade: websocket\r\n\
         Connection: Upgrade\r\n\
         Sec-WebSocket-Accept: {}\r\n\r\n",
        accept_key(key)
    );
    writer.write_all(response.as_bytes()).await?;
    writer.flush().await?;
    Ok(head)
}

/// Client side: sends the upgrade request and validates the answer.
pub async fn request_upgrade<R, W>(
    reader: &mut R,
    writer: &mut W,
    host: &str,
    path: &str,
) -> Result<(), HandshakeError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWriteExt + Unpin,
{
    let key = generate_key();
    let request = format!(
        "GET {path} HTTP/1.1\r\n\
         Host: {host}\r\n\
         Upgrade: websocket\r\n\
         Connection: Upgrade\r\n\
         Sec-WebSocket-Key: {key}\r\n\
         Sec-WebSocket-Version: 13\r\n\r\n"
    );
    writer.write_all(request.as_bytes()).await?;
    writer.flush().await?;

    let head = read_head(reader).await?;
    if head.start_line.split_whitespace().nth(1) != Some("101") {
        return Err(HandshakeError::Rejected(head.start_line));
    }
    if head.header("sec-websocket-accept") != Some(accept_key(&key).as_str()) {
        return Err(HandshakeError::AcceptMismatch);
    }
    Ok(())
}
