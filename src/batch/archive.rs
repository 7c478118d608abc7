//! In-memory zip packaging of one batch.

use std::io::{Cursor, Write};

use zip::write::FileOptions;

use crate::errors::PackagingError;

use super::FileItem;

/// Write every file of a batch into a deflate zip archive, keyed by its
/// original name. The whole batch is buffered before the payload is sealed.
pub(crate) fn build_zip(files: &[FileItem]) -> Result<Vec<u8>, PackagingError> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for file in files {
        let content = file.read().map_err(|source| PackagingError::Read {
            name: file.name().to_string(),
            source,
        })?;
        writer
            .start_file(file.name(), options)
            .map_err(|source| PackagingError::Entry {
                name: file.name().to_string(),
                source,
            })?;
        writer
            .write_all(&content)
            .map_err(|source| PackagingError::Write {
                name: file.name().to_string(),
                source,
            })?;
    }

    let cursor = writer.finish().map_err(PackagingError::Finalize)?;
    Ok(cursor.into_inner())
}
