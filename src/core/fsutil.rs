use std::path::Path;

use uuid::Uuid;

use crate::core::error::{LauncherError, LauncherResult};

/// Write `contents` beside `path` and rename it into place.
///
/// Readers see either the old file or the new one, never a partial write.
pub async fn write_atomic(path: &Path, contents: &[u8]) -> LauncherResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| LauncherError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
    }

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let temp = path.with_file_name(format!(".{}.{}.tmp", name, Uuid::new_v4().simple()));

    if let Err(source) = tokio::fs::write(&temp, contents).await {
        let _ = tokio::fs::remove_file(&temp).await;
        return Err(LauncherError::Io { path: temp, source });
    }
    if let Err(source) = tokio::fs::rename(&temp, path).await {
        let _ = tokio::fs::remove_file(&temp).await;
        return Err(LauncherError::Io {
            path: path.to_path_buf(),
            source,
        });
    }
    Ok(())
}

#[cfg(windows)]
const NEWLINE: &str = "\r\n";
#[cfg(not(windows))]
const NEWLINE: &str = "\n";

/// Rewrite every line ending to the host convention.
pub fn to_host_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\n', NEWLINE)
}
