//! Error taxonomy for a transfer session.
//!
//! Callers get the failure kind (auth vs transport vs packaging) so they can
//! report it distinctly; none of these are retried by the library.

use thiserror::Error;

/// Top-level failure of an upload session.
#[derive(Debug, Error)]
pub enum TransferError {
    /// The server answered the credentials message with something other than
    /// the success token.
    #[error("server rejected credentials: {reply:?}")]
    Authentication { reply: String },

    /// The connection could not be opened, dropped mid-stream, or errored at
    /// the websocket layer. The in-flight upload is abandoned wholesale.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A batch could not be packaged. The session aborts before any further
    /// network activity; already-sent batches are the server's problem (it
    /// never sees the end marker, so the job is incomplete on its side too).
    #[error("failed to package batch {batch_index}: {source}")]
    Packaging {
        batch_index: usize,
        #[source]
        source: PackagingError,
    },
}

/// Websocket-level failures. Reasons are carried as strings so the taxonomy
/// stays independent of the websocket crate's error type.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to connect to {url}: {reason}")]
    Connect { url: String, reason: String },

    #[error("websocket send failed: {0}")]
    Send(String),

    #[error("websocket receive failed: {0}")]
    Recv(String),

    /// The server closed the connection before delivering the result
    /// artifact. Closure is only a success signal after the artifact.
    #[error("connection closed before the result artifact arrived")]
    ClosedEarly,
}

/// Why a batch could not be turned into a payload.
#[derive(Debug, Error)]
pub enum PackagingError {
    #[error("failed to read {name}: {source}")]
    Read {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {name} into the archive: {source}")]
    Write {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to start archive entry {name}: {source}")]
    Entry {
        name: String,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("failed to finalize archive: {0}")]
    Finalize(#[source] zip::result::ZipError),

    #[error("packaging task failed: {0}")]
    Task(String),
}
