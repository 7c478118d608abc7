//! Lock-free upload progress counters.
//!
//! Totals are set once before streaming starts; counters advance as payloads
//! are handed to the transport. `last_batch_sent` is the hook a future resume
//! layer would read — the session itself never resumes.

use std::sync::atomic::{AtomicU64, Ordering};

pub struct TransferProgress {
    files_total: AtomicU64,
    batches_total: AtomicU64,
    files_sent: AtomicU64,
    batches_sent: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub files_total: u64,
    pub batches_total: u64,
    pub files_sent: u64,
    pub batches_sent: u64,
}

impl Default for TransferProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl TransferProgress {
    pub fn new() -> Self {
        Self {
            files_total: AtomicU64::new(0),
            batches_total: AtomicU64::new(0),
            files_sent: AtomicU64::new(0),
            batches_sent: AtomicU64::new(0),
        }
    }

    /// Set expected totals. Called once, before the first payload is built.
    pub fn init(&self, files_total: u64, batches_total: u64) {
        self.files_total.store(files_total, Ordering::Relaxed);
        self.batches_total.store(batches_total, Ordering::Relaxed);
    }

    /// Record one payload handed to the transport.
    pub fn record_batch_sent(&self, file_count: u64) {
        self.batches_sent.fetch_add(1, Ordering::Relaxed);
        self.files_sent.fetch_add(file_count, Ordering::Relaxed);
    }

    /// Zero-based index of the last batch handed to the transport, if any.
    pub fn last_batch_sent(&self) -> Option<u64> {
        let sent = self.batches_sent.load(Ordering::Relaxed);
        if sent == 0 {
            None
        } else {
            Some(sent - 1)
        }
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            files_total: self.files_total.load(Ordering::Relaxed),
            batches_total: self.batches_total.load(Ordering::Relaxed),
            files_sent: self.files_sent.load(Ordering::Relaxed),
            batches_sent: self.batches_sent.load(Ordering::Relaxed),
        }
    }
}
