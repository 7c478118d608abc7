//! One upload session: credentials, ordered batch streaming, result receive.
//!
//! The driver owns the transport and feeds every inbound frame through the
//! state machine. Payloads are packaged one batch at a time and only after the
//! previous send has been accepted, so unsent data never piles up beyond a
//! single payload.

pub mod artifact;
pub mod machine;
pub mod transport;

use std::sync::Arc;

use crate::batch::{batch_count, Batcher, FileItem};
use crate::errors::{PackagingError, TransferError, TransportError};
use crate::progress::TransferProgress;

pub use artifact::{save_artifact, ResultArtifact, ResultMetadata};
pub use machine::{
    Credentials, Event, Incoming, ProtocolMachine, SessionState, END_MARKER, SUCCESS_TOKEN,
};
pub use transport::{Transport, WsTransport};

/// What a completed session hands back to the caller.
#[derive(Debug)]
pub struct TransferOutcome {
    pub files_sent: usize,
    pub batches_sent: usize,
    pub artifact: ResultArtifact,
}

pub struct TransferSession<T: Transport> {
    transport: T,
    machine: ProtocolMachine,
    batch_limit: usize,
    progress: Arc<TransferProgress>,
}

impl<T: Transport> TransferSession<T> {
    pub fn new(transport: T, batch_limit: usize) -> Self {
        Self {
            transport,
            machine: ProtocolMachine::new(),
            batch_limit: batch_limit.max(1),
            progress: Arc::new(TransferProgress::new()),
        }
    }

    /// Observable progress, usable while `run` is in flight.
    pub fn progress(&self) -> Arc<TransferProgress> {
        Arc::clone(&self.progress)
    }

    pub fn state(&self) -> SessionState {
        self.machine.state()
    }

    /// Drive the whole protocol: authenticate, stream every batch in order,
    /// send the end marker once, then receive the result artifact.
    ///
    /// Any failure abandons the session; a retry means a fresh session with
    /// the full file set.
    pub async fn run(
        mut self,
        credentials: Credentials,
        files: Vec<FileItem>,
    ) -> Result<TransferOutcome, TransferError> {
        let total_files = files.len();
        self.progress.init(
            total_files as u64,
            batch_count(total_files, self.batch_limit) as u64,
        );

        let frame = self.machine.credentials_frame(&credentials);
        self.transport.send_text(frame).await?;
        tracing::debug!("credentials sent, awaiting acknowledgement");

        // Handed to stream_batches exactly once, on the success token.
        let mut files = Some(files);
        let mut artifact: Option<ResultArtifact> = None;

        loop {
            let message = match self.transport.recv().await? {
                Some(message) => message,
                None => break,
            };
            match self.machine.on_message(message)? {
                Event::Authenticated => {
                    let files = files.take().unwrap_or_default();
                    self.stream_batches(files).await?;
                }
                Event::Artifact(received) => {
                    tracing::info!(
                        file_name = %received.file_name(),
                        bytes = received.len(),
                        "result artifact received"
                    );
                    artifact = Some(received);
                }
                Event::Continue => {}
            }
        }

        self.machine.on_close()?;
        // on_close already rejects a close without a delivered artifact.
        let artifact = artifact.ok_or(TransportError::ClosedEarly)?;

        // Mirror the server's close. Best-effort: the upload already
        // completed, a failed close handshake does not undo it.
        if let Err(err) = self.transport.close().await {
            tracing::debug!(error = %err, "close after completed session failed");
        }

        let snapshot = self.progress.snapshot();
        Ok(TransferOutcome {
            files_sent: snapshot.files_sent as usize,
            batches_sent: snapshot.batches_sent as usize,
            artifact,
        })
    }

    /// Package and send every batch in input order, then the end marker.
    ///
    /// Packaging runs on a blocking thread (file reads plus deflate), but the
    /// next batch is not touched until this payload's send has resolved.
    async fn stream_batches(&mut self, files: Vec<FileItem>) -> Result<(), TransferError> {
        let mut batcher = Batcher::new(files, self.batch_limit);

        while let Some(batch) = batcher.next_batch() {
            let batch_index = batch.index();
            let file_count = batch.len();

            let payload = tokio::task::spawn_blocking(move || batch.into_payload())
                .await
                .map_err(|err| TransferError::Packaging {
                    batch_index,
                    source: PackagingError::Task(err.to_string()),
                })??;

            let payload_len = payload.len();
            self.transport.send_binary(payload.into_bytes()).await?;
            self.progress.record_batch_sent(file_count as u64);
            tracing::debug!(
                batch = batch_index,
                files = file_count,
                bytes = payload_len,
                "payload sent"
            );
        }

        self.transport.send_text(END_MARKER.to_string()).await?;
        self.machine.finish_streaming();
        tracing::debug!("end marker sent, awaiting result");
        Ok(())
    }
}

/// Connect to the service and run one upload end to end.
pub async fn upload(
    url: &str,
    credentials: Credentials,
    files: Vec<FileItem>,
    batch_limit: usize,
) -> Result<TransferOutcome, TransferError> {
    let transport = WsTransport::connect(url).await?;
    TransferSession::new(transport, batch_limit)
        .run(credentials, files)
        .await
}
