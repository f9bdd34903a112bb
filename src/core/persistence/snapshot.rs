// src/core/persistence/snapshot.rs

//! Reads and writes the snapshot file.
//!
//! The snapshot is a single JSON object mapping every key to its value. Writes
//! go to a temporary sibling file first and are renamed into place, so a crash
//! during a save leaves the previous snapshot intact.

use crate::core::MemoryDbError;
use crate::core::metrics;
use crate::core::storage::Entries;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info};

/// Decodes snapshot bytes into entries.
pub fn decode(bytes: &[u8]) -> Result<Entries, MemoryDbError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Encodes entries into snapshot bytes.
pub fn encode(entries: &Entries) -> Result<Vec<u8>, MemoryDbError> {
    let mut bytes = serde_json::to_vec(entries)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Reads the snapshot at `path`.
///
/// Returns `Ok(None)` when there is nothing to load (the file is missing or
/// empty) and an error when the file exists but cannot be read or decoded.
pub async fn read_snapshot(path: &Path) -> Result<Option<Entries>, MemoryDbError> {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    if bytes.iter().all(u8::is_ascii_whitespace) {
        debug!("Snapshot {} is empty.", path.display());
        return Ok(None);
    }
    decode(&bytes).map(Some)
}

/// Writes `entries` to `path`, replacing any previous snapshot.
pub async fn write_snapshot(entries: &Entries, path: &Path) -> Result<(), MemoryDbError> {
    let result = write_atomically(entries, path).await;
    match &result {
        Ok(()) => {
            metrics::SNAPSHOT_SAVES_TOTAL
                .with_label_values(&["success"])
                .inc();
            info!(
                "Snapshot with {} keys saved to {}.",
                entries.len(),
                path.display()
            );
        }
        Err(e) => {
            metrics::SNAPSHOT_SAVES_TOTAL
                .with_label_values(&["failure"])
                .inc();
            error!("Failed to save snapshot to {}: {}", path.display(), e);
        }
    }
    result
}

async fn write_atomically(entries: &Entries, path: &Path) -> Result<(), MemoryDbError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent).await?;
        info!("Created snapshot directory: {}", parent.display());
    }

    let bytes = encode(entries)?;
    let temp_path = temp_path_for(path);

    if let Err(e) = write_file(&temp_path, &bytes).await {
        remove_temp_file(&temp_path).await;
        return Err(e);
    }

    if let Err(e) = fs::rename(&temp_path, path).await {
        remove_temp_file(&temp_path).await;
        return Err(MemoryDbError::Snapshot(format!(
            "failed to rename temporary snapshot '{}' to '{}': {e}",
            temp_path.display(),
            path.display()
        )));
    }
    Ok(())
}

async fn write_file(path: &Path, bytes: &[u8]) -> Result<(), MemoryDbError> {
    let mut file = fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    Ok(())
}

async fn remove_temp_file(path: &Path) {
    if let Err(e) = fs::remove_file(path).await
        && e.kind() != ErrorKind::NotFound
    {
        error!(
            "Additionally failed to remove temporary snapshot file '{}': {e}",
            path.display()
        );
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "snapshot".into());
    name.push(format!(".tmp.{}", rand::random::<u32>()));
    path.with_file_name(name)
}
