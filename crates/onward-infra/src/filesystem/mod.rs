//! Filesystem helpers for Onward: data-dir resolution and atomic writes.

use std::io::Write;
use std::path::{Path, PathBuf};

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `ONWARD_DATA_DIR` environment variable
/// 2. `~/.onward`
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("ONWARD_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".onward");
    }

    // Last resort: current directory
    PathBuf::from(".onward")
}

/// Resolve a configured path: absolute paths pass through, relative ones
/// are taken relative to `data_dir`.
pub fn resolve_path(data_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        data_dir.join(path)
    }
}

/// Replace `path` with `contents` via a uniquely named temp file in the same
/// directory and a rename, so readers never observe a half-written file and
/// concurrent writers never share a temp file. Parent directories are created.
pub async fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), std::io::Error> {
    let parent = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => parent.to_path_buf(),
        None => PathBuf::from("."),
    };
    tokio::fs::create_dir_all(&parent).await?;

    let path = path.to_path_buf();
    let contents = contents.to_vec();
    tokio::task::spawn_blocking(move || {
        let mut tmp = tempfile::NamedTempFile::new_in(&parent)?;
        tmp.write_all(&contents)?;
        tmp.as_file().sync_all()?;
        // A failed persist drops the temp file, which removes it.
        tmp.persist(&path).map_err(|e| e.error)?;
        Ok::<(), std::io::Error>(())
    })
    .await
    .map_err(std::io::Error::other)?
}
