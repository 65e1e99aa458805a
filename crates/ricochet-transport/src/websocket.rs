//! WebSocket transport implementation using `tokio-tungstenite`.
//!
//! The listener also answers `GET /healthz` with a plain HTTP 200 so
//! load balancers can probe the port without speaking WebSocket. The
//! probe is detected by peeking the request line before the handshake,
//! which leaves real upgrade requests untouched for tungstenite.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;

use crate::{Connection, ConnectionId, Transport, TransportError};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

const HEALTH_PROBE: &[u8] = b"GET /healthz";
const HEALTH_RESPONSE: &[u8] =
    b"HTTP/1.1 200 OK\r\ncontent-length: 2\r\nconnection: close\r\n\r\nok";

/// Upper bound on probe detection. A peer that sends only a prefix of
/// the probe line and then stalls must not hold up `accept`; after this
/// long the stream goes to the WebSocket handshake, which can only fail
/// that one connection.
const PROBE_DETECT_TIMEOUT: Duration = Duration::from_millis(250);

type WsStream = tokio_tungstenite::WebSocketStream<TcpStream>;

/// A WebSocket-based [`Transport`] that listens for incoming connections.
pub struct WebSocketTransport {
    listener: TcpListener,
}

impl WebSocketTransport {
    /// Binds a new WebSocket transport to the given address.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::AcceptFailed)?;
        tracing::info!(addr, "WebSocket transport listening");
        Ok(Self { listener })
    }
}

/// Peeks the start of the request line without consuming it. A partial
/// prefix match waits briefly for more bytes (the request line arrives
/// in a single segment in practice); the caller bounds the wait with
/// [`PROBE_DETECT_TIMEOUT`] so a stalled or half-closed peer cannot
/// block the accept loop.
async fn is_health_probe(stream: &TcpStream) -> std::io::Result<bool> {
    let mut buf = [0u8; HEALTH_PROBE.len()];
    loop {
        let n = stream.peek(&mut buf).await?;
        if n == 0 || buf[..n] != HEALTH_PROBE[..n] {
            return Ok(false);
        }
        if n == HEALTH_PROBE.len() {
            return Ok(true);
        }
        // peek keeps returning the same buffered bytes without blocking,
        // so back off instead of spinning while the rest trickles in.
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

impl Transport for WebSocketTransport {
    type Connection = WebSocketConnection;
    type Error = TransportError;

    async fn accept(&mut self) -> Result<Self::Connection, Self::Error> {
        loop {
            let (stream, addr) = self
                .listener
                .accept()
                .await
                .map_err(TransportError::AcceptFailed)?;

            // Health probes are answered inline and never become
            // connections. Detection is time-bounded: undecided streams
            // fall through to the handshake.
            match tokio::time::timeout(PROBE_DETECT_TIMEOUT, is_health_probe(&stream))
                .await
            {
                Ok(Ok(true)) => {
                    tracing::trace!(%addr, "health probe");
                    let mut stream = stream;
                    let _ = stream.write_all(HEALTH_RESPONSE).await;
                    let _ = stream.shutdown().await;
                    continue;
                }
                Ok(Ok(false)) | Err(_) => {}
                Ok(Err(e)) => {
                    tracing::debug!(%addr, error = %e, "peer gone before handshake");
                    continue;
                }
            }

            let ws = tokio_tungstenite::accept_async(stream).await.map_err(|e| {
                TransportError::AcceptFailed(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    e,
                ))
            })?;

            let id =
                ConnectionId::new(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed));
            tracing::debug!(%id, %addr, "accepted WebSocket connection");

            return Ok(WebSocketConnection {
                id,
                ws: Arc::new(Mutex::new(ws)),
            });
        }
    }

    fn local_addr(&self) -> Result<std::net::SocketAddr, Self::Error> {
        self.listener
            .local_addr()
            .map_err(TransportError::AcceptFailed)
    }
}

/// A single WebSocket connection.
pub struct WebSocketConnection {
    id: ConnectionId,
    ws: Arc<Mutex<WsStream>>,
}

impl Connection for WebSocketConnection {
    type Error = TransportError;

    /// Sends the payload as a text frame; the wire format is JSON and
    /// browser clients want strings.
    async fn send(&self, data: &[u8]) -> Result<(), Self::Error> {
        use futures_util::SinkExt;
        let text = std::str::from_utf8(data).map_err(|e| {
            TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                e,
            ))
        })?;
        let msg = Message::Text(text.into());
        self.ws.lock().await.send(msg).await.map_err(|e| {
            TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                e,
            ))
        })
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        use futures_util::StreamExt;
        loop {
            let msg = self.ws.lock().await.next().await;
            match msg {
                Some(Ok(Message::Text(text))) => {
                    return Ok(Some(text.as_bytes().to_vec()));
                }
                Some(Ok(Message::Binary(data))) => {
                    return Ok(Some(data.into()));
                }
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(_)) => continue, // skip ping/pong/frame
                Some(Err(e)) => {
                    return Err(TransportError::ReceiveFailed(std::io::Error::new(
                        std::io::ErrorKind::ConnectionReset,
                        e,
                    )));
                }
            }
        }
    }

    async fn close(&self) -> Result<(), Self::Error> {
        self.ws.lock().await.close(None).await.map_err(|e| {
            TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                e,
            ))
        })
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}
