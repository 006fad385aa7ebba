//! JSON-file backends for session memory and best practices.
//!
//! Each store is one JSON array of records (item fields plus `embedding`),
//! rewritten atomically after every mutation.

pub mod best_practice_store;
pub mod session_store;

use std::path::{Path, PathBuf};

use onward_types::error::RepositoryError;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::filesystem::write_atomic;

pub use best_practice_store::JsonBestPracticeStore;
pub use session_store::JsonSessionStore;

/// Read a JSON array of records.
///
/// A missing file is an empty store. An unreadable file is logged at WARN
/// and treated as empty. A malformed file is renamed to `<name>.corrupt`
/// first, so the next write cannot destroy the records it holds.
async fn read_records<T: DeserializeOwned>(path: &Path) -> Vec<T> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "No store file yet, starting empty");
            return Vec::new();
        }
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "Failed to read store file, starting empty");
            return Vec::new();
        }
    };

    if content.trim().is_empty() {
        return Vec::new();
    }

    match serde_json::from_str::<Vec<T>>(&content) {
        Ok(records) => records,
        Err(err) => {
            let aside = corrupt_path(path);
            match tokio::fs::rename(path, &aside).await {
                Ok(()) => tracing::warn!(
                    path = %path.display(),
                    moved_to = %aside.display(),
                    error = %err,
                    "Malformed store file moved aside, starting empty"
                ),
                Err(rename_err) => tracing::warn!(
                    path = %path.display(),
                    error = %err,
                    rename_error = %rename_err,
                    "Malformed store file could not be moved aside, starting empty"
                ),
            }
            Vec::new()
        }
    }
}

/// `<file>.corrupt` next to the store file.
fn corrupt_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".corrupt");
    path.with_file_name(name)
}

/// Serialize `records` and atomically replace the file at `path`.
async fn write_records<T: Serialize>(path: &Path, records: &[T]) -> Result<(), RepositoryError> {
    let bytes = serde_json::to_vec_pretty(records)
        .map_err(|e| RepositoryError::Storage(format!("failed to serialize store: {e}")))?;
    write_atomic(path, &bytes)
        .await
        .map_err(|e| RepositoryError::Storage(format!("failed to write {}: {e}", path.display())))
}

/// Create the parent directory of a store file.
async fn ensure_parent(path: &Path) -> Result<(), RepositoryError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(|e| {
            RepositoryError::Storage(format!("failed to create {}: {e}", parent.display()))
        })?;
    }
    Ok(())
}
