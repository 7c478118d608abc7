//! Client for the ECG anonymization service: batches a folder of files into
//! zip payloads, streams them over one websocket session, and brings back the
//! processed archive.

pub mod batch;
pub mod config;
pub mod errors;
pub mod progress;
pub mod session;
