//! Batch planning: slicing an ordered file set into bounded transfer units.
//!
//! The batcher is pull-based. The session asks for the next batch only after
//! the transport has accepted the previous payload, so at most one payload's
//! worth of file content is buffered at a time.

mod archive;

use anyhow::{Context, Result};
use std::borrow::Cow;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::errors::TransferError;

/// Default cap on files per batch. Exists to keep any single wire message a
/// manageable size on huge folder uploads, not for correctness.
pub const DEFAULT_BATCH_LIMIT: usize = 1000;

/// Where a file's bytes come from when the batch is packaged.
#[derive(Debug, Clone)]
pub enum FileSource {
    Memory(Vec<u8>),
    Disk(PathBuf),
}

/// One input file: an archive entry name plus its content source.
///
/// Content is only read when the owning batch is packaged; a disk-backed item
/// whose file has vanished by then fails packaging for the whole session.
#[derive(Debug, Clone)]
pub struct FileItem {
    name: String,
    source: FileSource,
}

impl FileItem {
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            source: FileSource::Memory(bytes),
        }
    }

    pub fn from_path(name: impl Into<String>, path: PathBuf) -> Self {
        Self {
            name: name.into(),
            source: FileSource::Disk(path),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn read(&self) -> io::Result<Cow<'_, [u8]>> {
        match &self.source {
            FileSource::Memory(bytes) => Ok(Cow::Borrowed(bytes)),
            FileSource::Disk(path) => fs::read(path).map(Cow::Owned),
        }
    }
}

/// Walk a folder and produce one `FileItem` per regular file, named by its
/// slash-separated path relative to the folder, in deterministic order.
pub fn collect_dir(root: &Path) -> Result<Vec<FileItem>> {
    let mut items = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path().to_path_buf();
        let rel = path.strip_prefix(root).unwrap_or(path.as_path());
        let name = rel.to_string_lossy().replace('\\', "/");
        items.push(FileItem::from_path(name, path));
    }
    Ok(items)
}

/// Number of payloads a file set will produce: ceil(total / limit).
pub fn batch_count(total_files: usize, limit: usize) -> usize {
    let limit = limit.max(1);
    total_files.div_ceil(limit)
}

/// Pull-based splitter over an ordered file set.
///
/// Every input file lands in exactly one batch, order preserved within and
/// across batches.
pub struct Batcher {
    files: std::collections::VecDeque<FileItem>,
    limit: usize,
    next_index: usize,
}

impl Batcher {
    pub fn new(files: Vec<FileItem>, limit: usize) -> Self {
        Self {
            files: files.into(),
            limit: limit.max(1),
            next_index: 0,
        }
    }

    pub fn remaining_files(&self) -> usize {
        self.files.len()
    }

    pub fn next_batch(&mut self) -> Option<Batch> {
        if self.files.is_empty() {
            return None;
        }
        let take = self.limit.min(self.files.len());
        let files: Vec<FileItem> = self.files.drain(..take).collect();
        let batch = Batch {
            index: self.next_index,
            files,
        };
        self.next_index += 1;
        Some(batch)
    }
}

impl Iterator for Batcher {
    type Item = Batch;

    fn next(&mut self) -> Option<Batch> {
        self.next_batch()
    }
}

/// An ordered, size-bounded slice of the input assigned to one transfer unit.
#[derive(Debug)]
pub struct Batch {
    index: usize,
    files: Vec<FileItem>,
}

impl Batch {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn file_names(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|f| f.name())
    }

    /// Read every member fully and seal the batch into one zip payload.
    ///
    /// Any unreadable member fails the batch; skipping a file would break the
    /// "each file sent exactly once" guarantee.
    pub fn into_payload(self) -> Result<Payload, TransferError> {
        let batch_index = self.index;
        let file_count = self.files.len();
        let bytes = archive::build_zip(&self.files)
            .map_err(|source| TransferError::Packaging { batch_index, source })?;
        Ok(Payload {
            batch_index,
            file_count,
            bytes,
        })
    }
}

/// One compressed archive, byte-for-byte the unit placed on the wire.
#[derive(Debug)]
pub struct Payload {
    batch_index: usize,
    file_count: usize,
    bytes: Vec<u8>,
}

impl Payload {
    pub fn batch_index(&self) -> usize {
        self.batch_index
    }

    pub fn file_count(&self) -> usize {
        self.file_count
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}
