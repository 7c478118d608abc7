#![allow(dead_code)]
//! Shared test helpers: a scripted transport standing in for the server.

pub mod config_test_utils;

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anonsend::batch::FileItem;
use anonsend::errors::TransportError;
use anonsend::session::{Incoming, Transport};

/// Frame recorded on the client->server side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentFrame {
    Text(String),
    Binary(Vec<u8>),
}

impl SentFrame {
    pub fn is_binary(&self) -> bool {
        matches!(self, SentFrame::Binary(_))
    }
}

/// What the fake server does on each `recv` call, in order. Running off the
/// end of the script behaves like a close.
pub enum ScriptStep {
    Recv(Incoming),
    Close,
    Fail(&'static str),
}

/// Transport whose server side follows a fixed script and records every
/// outbound frame.
pub struct MockTransport {
    script: VecDeque<ScriptStep>,
    sent: Arc<Mutex<Vec<SentFrame>>>,
    close_calls: Arc<AtomicUsize>,
}

impl MockTransport {
    pub fn new(script: Vec<ScriptStep>) -> (Self, Arc<Mutex<Vec<SentFrame>>>) {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let transport = Self {
            script: script.into(),
            sent: Arc::clone(&sent),
            close_calls: Arc::new(AtomicUsize::new(0)),
        };
        (transport, sent)
    }

    /// Handle for asserting on `close` calls after the session consumed the
    /// transport.
    pub fn close_calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.close_calls)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        self.sent.lock().unwrap().push(SentFrame::Text(text));
        Ok(())
    }

    async fn send_binary(&mut self, bytes: Vec<u8>) -> Result<(), TransportError> {
        self.sent.lock().unwrap().push(SentFrame::Binary(bytes));
        Ok(())
    }

    async fn recv(&mut self) -> Result<Option<Incoming>, TransportError> {
        match self.script.pop_front() {
            Some(ScriptStep::Recv(message)) => Ok(Some(message)),
            Some(ScriptStep::Fail(reason)) => Err(TransportError::Recv(reason.to_string())),
            Some(ScriptStep::Close) | None => Ok(None),
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// `count` small in-memory files named file-00000.mwf, file-00001.mwf, ...
pub fn make_files(count: usize) -> Vec<FileItem> {
    (0..count)
        .map(|i| {
            FileItem::from_bytes(
                format!("file-{i:05}.mwf"),
                format!("payload {i}").into_bytes(),
            )
        })
        .collect()
}

pub fn metadata_json() -> String {
    r#"{"fileName":"result.zip","fileType":"application/zip"}"#.to_string()
}

/// Entry names of a zip payload, in archive order.
pub fn zip_entry_names(bytes: &[u8]) -> Vec<String> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).expect("valid zip payload");
    (0..archive.len())
        .map(|i| archive.by_index(i).expect("zip entry").name().to_string())
        .collect()
}
