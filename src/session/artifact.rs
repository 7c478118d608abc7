//! Result artifact reassembly and save.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Describes the next binary frame the server will send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultMetadata {
    pub file_name: String,
    pub file_type: String,
}

/// The processed archive the server sent back, tagged with its metadata.
#[derive(Debug)]
pub struct ResultArtifact {
    pub metadata: ResultMetadata,
    pub bytes: Vec<u8>,
}

impl ResultArtifact {
    pub fn file_name(&self) -> &str {
        &self.metadata.file_name
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Reduce a server-supplied file name to a safe basename. Path separators and
/// NUL are server input, not something we ever join into a local path.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base.chars().filter(|c| *c != '\0').collect();
    let trimmed = cleaned.trim();
    if trimmed.is_empty() || trimmed == "." || trimmed == ".." {
        "result.zip".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Write the artifact into `dir` under its (sanitized) advertised name.
pub async fn save_artifact(dir: &Path, artifact: &ResultArtifact) -> Result<PathBuf> {
    let name = sanitize_file_name(&artifact.metadata.file_name);
    let path = dir.join(name);

    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    tokio::fs::write(&path, &artifact.bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    tracing::info!(path = %path.display(), bytes = artifact.bytes.len(), "saved result artifact");
    Ok(path)
}
