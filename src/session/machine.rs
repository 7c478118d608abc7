//! Protocol state machine for one upload session.
//!
//! The same websocket multiplexes three unrelated inbound kinds — an ack
//! string, metadata JSON, raw artifact bytes — with no per-message tag beyond
//! text vs binary. What a frame means depends entirely on the current state,
//! so all dispatch goes through one function keyed on (state, frame kind)
//! instead of swapping receive callbacks around.

use crate::errors::TransferError;

use super::artifact::{ResultArtifact, ResultMetadata};

/// Exact ack string the server sends for accepted credentials. A bilateral
/// contract with the server; every other text reply means rejection.
pub const SUCCESS_TOKEN: &str = "ok";

/// Text frame that tells the server the last payload has been sent.
pub const END_MARKER: &str = "end";

/// First frame on the wire, as JSON text.
#[derive(Debug, Clone)]
pub struct Credentials {
    password: String,
    password_confirmation: String,
}

impl Credentials {
    pub fn new(password: impl Into<String>, password_confirmation: impl Into<String>) -> Self {
        Self {
            password: password.into(),
            password_confirmation: password_confirmation.into(),
        }
    }

    /// The server rejects mismatched passwords anyway; checking here avoids
    /// opening a doomed connection.
    pub fn matches(&self) -> bool {
        self.password == self.password_confirmation
    }
}

/// Phase of the transfer. One live instance per session, terminal at Closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Authenticating,
    Streaming,
    AwaitingResult,
    AwaitingArtifactBytes,
    Closed,
}

/// An inbound websocket frame, reduced to the two kinds the protocol knows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    Text(String),
    Binary(Vec<u8>),
}

/// What the driver should do after dispatching one inbound frame.
#[derive(Debug)]
pub enum Event {
    /// Credentials accepted; start streaming payloads.
    Authenticated,
    /// The result artifact is fully reassembled.
    Artifact(ResultArtifact),
    /// Nothing actionable (tolerated noise, or metadata stored internally).
    Continue,
}

pub struct ProtocolMachine {
    state: SessionState,
    pending_metadata: Option<ResultMetadata>,
    artifact_delivered: bool,
}

impl Default for ProtocolMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl ProtocolMachine {
    pub fn new() -> Self {
        Self {
            state: SessionState::Connecting,
            pending_metadata: None,
            artifact_delivered: false,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn artifact_delivered(&self) -> bool {
        self.artifact_delivered
    }

    /// Build the credentials frame and enter `Authenticating`.
    pub fn credentials_frame(&mut self, credentials: &Credentials) -> String {
        let frame = serde_json::json!({
            "type": "credentials",
            "password": credentials.password,
            "passwordConfirmation": credentials.password_confirmation,
        });
        self.state = SessionState::Authenticating;
        frame.to_string()
    }

    /// Called by the driver once the end marker has been sent.
    pub fn finish_streaming(&mut self) {
        if self.state == SessionState::Streaming {
            self.state = SessionState::AwaitingResult;
        }
    }

    /// Dispatch one inbound frame against the current state.
    pub fn on_message(&mut self, message: Incoming) -> Result<Event, TransferError> {
        match (self.state, message) {
            (SessionState::Authenticating, Incoming::Text(reply)) => {
                if reply == SUCCESS_TOKEN {
                    tracing::debug!("credentials accepted");
                    self.state = SessionState::Streaming;
                    Ok(Event::Authenticated)
                } else {
                    self.state = SessionState::Closed;
                    Err(TransferError::Authentication { reply })
                }
            }
            (SessionState::Authenticating, Incoming::Binary(bytes)) => {
                // Anything other than the success token is a rejection.
                self.state = SessionState::Closed;
                Err(TransferError::Authentication {
                    reply: format!("<binary frame, {} bytes>", bytes.len()),
                })
            }
            (SessionState::Streaming, frame) => {
                tracing::warn!(?frame, "unexpected frame while streaming, ignoring");
                Ok(Event::Continue)
            }
            (SessionState::AwaitingResult, Incoming::Text(text)) => {
                match serde_json::from_str::<ResultMetadata>(&text) {
                    Ok(metadata) => {
                        tracing::debug!(
                            file_name = %metadata.file_name,
                            file_type = %metadata.file_type,
                            "result metadata received"
                        );
                        self.pending_metadata = Some(metadata);
                        self.state = SessionState::AwaitingArtifactBytes;
                        Ok(Event::Continue)
                    }
                    Err(err) => {
                        // Malformed control frames are tolerated; only binary
                        // frames materialize artifacts.
                        tracing::warn!(error = %err, "ignoring unparseable control frame");
                        Ok(Event::Continue)
                    }
                }
            }
            (SessionState::AwaitingResult, Incoming::Binary(bytes)) => {
                tracing::warn!(len = bytes.len(), "binary frame before metadata, ignoring");
                Ok(Event::Continue)
            }
            (SessionState::AwaitingArtifactBytes, Incoming::Binary(bytes)) => {
                match self.pending_metadata.take() {
                    Some(metadata) => {
                        self.artifact_delivered = true;
                        self.state = SessionState::AwaitingResult;
                        Ok(Event::Artifact(ResultArtifact { metadata, bytes }))
                    }
                    None => {
                        // Unreachable: entering AwaitingArtifactBytes stores
                        // the metadata. Tolerate it rather than panic.
                        tracing::warn!("artifact bytes without stored metadata, ignoring");
                        self.state = SessionState::AwaitingResult;
                        Ok(Event::Continue)
                    }
                }
            }
            (SessionState::AwaitingArtifactBytes, Incoming::Text(text)) => {
                tracing::warn!(%text, "text frame while awaiting artifact bytes, ignoring");
                Ok(Event::Continue)
            }
            (SessionState::Connecting | SessionState::Closed, frame) => {
                tracing::warn!(?frame, state = ?self.state, "frame outside active session, ignoring");
                Ok(Event::Continue)
            }
        }
    }

    /// The transport reported normal closure. Success only if the artifact
    /// already arrived; an earlier close abandons the upload.
    pub fn on_close(&mut self) -> Result<(), TransferError> {
        self.state = SessionState::Closed;
        if self.artifact_delivered {
            Ok(())
        } else {
            Err(crate::errors::TransportError::ClosedEarly.into())
        }
    }
}
