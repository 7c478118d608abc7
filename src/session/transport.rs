//! WebSocket connect/send/receive behind a trait seam.
//!
//! The trait exists so the session driver and state machine can be exercised
//! against a scripted peer; production uses `WsTransport`.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::errors::TransportError;

use super::machine::Incoming;

/// One persistent bidirectional message connection.
///
/// `send_*` resolves only once the frame has been written and flushed — that
/// is the backpressure signal the session uses to pace payload production.
#[async_trait]
pub trait Transport: Send {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError>;

    async fn send_binary(&mut self, bytes: Vec<u8>) -> Result<(), TransportError>;

    /// Next text or binary frame; `None` once the peer has closed.
    async fn recv(&mut self) -> Result<Option<Incoming>, TransportError>;

    async fn close(&mut self) -> Result<(), TransportError>;
}

/// Production transport over `tokio-tungstenite`.
pub struct WsTransport {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsTransport {
    pub async fn connect(url: &str) -> Result<Self, TransportError> {
        let (ws, _response) = connect_async(url)
            .await
            .map_err(|err| TransportError::Connect {
                url: url.to_string(),
                reason: err.to_string(),
            })?;
        tracing::debug!(%url, "websocket connected");
        Ok(Self { ws })
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        self.ws
            .send(Message::Text(text))
            .await
            .map_err(|err| TransportError::Send(err.to_string()))
    }

    async fn send_binary(&mut self, bytes: Vec<u8>) -> Result<(), TransportError> {
        self.ws
            .send(Message::Binary(bytes))
            .await
            .map_err(|err| TransportError::Send(err.to_string()))
    }

    async fn recv(&mut self) -> Result<Option<Incoming>, TransportError> {
        loop {
            match self.ws.next().await {
                None => return Ok(None),
                Some(Ok(Message::Text(text))) => return Ok(Some(Incoming::Text(text))),
                Some(Ok(Message::Binary(bytes))) => return Ok(Some(Incoming::Binary(bytes))),
                Some(Ok(Message::Close(_))) => return Ok(None),
                // Ping/pong are handled inside tungstenite.
                Some(Ok(_)) => continue,
                Some(Err(err)) => return Err(TransportError::Recv(err.to_string())),
            }
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        // The server usually closes first; replying to that is not an error.
        match self.ws.close(None).await {
            Ok(()) | Err(WsError::ConnectionClosed) | Err(WsError::AlreadyClosed) => Ok(()),
            Err(err) => Err(TransportError::Send(err.to_string())),
        }
    }
}
