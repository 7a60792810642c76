// ─── Progress ───
// Status and byte-progress reporting towards the outer shell.

use std::sync::Arc;

use serde::Serialize;

/// Payload emitted while a download is streaming.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DownloadProgress {
    pub file_name: String,
    pub bytes_downloaded: u64,
    pub total_bytes: Option<u64>,
}

impl DownloadProgress {
    /// Whole percentage, only when the server announced a length.
    pub fn percent(&self) -> Option<u8> {
        match self.total_bytes {
            Some(total) if total > 0 => {
                Some((self.bytes_downloaded.saturating_mul(100) / total).min(100) as u8)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Status(String),
    Download(DownloadProgress),
}

/// Cheap-to-clone sink handed down through the provisioning pipeline.
#[derive(Clone)]
pub struct ProgressSink {
    callback: Arc<dyn Fn(ProgressEvent) + Send + Sync>,
}

impl ProgressSink {
    pub fn new(callback: impl Fn(ProgressEvent) + Send + Sync + 'static) -> Self {
        Self {
            callback: Arc::new(callback),
        }
    }

    /// Sink that discards everything.
    pub fn noop() -> Self {
        Self::new(|_| {})
    }

    pub fn status(&self, message: impl Into<String>) {
        (self.callback)(ProgressEvent::Status(message.into()));
    }

    pub fn download(&self, progress: DownloadProgress) {
        (self.callback)(ProgressEvent::Download(progress));
    }
}

impl Default for ProgressSink {
    fn default() -> Self {
        Self::noop()
    }
}

impl std::fmt::Debug for ProgressSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressSink").finish_non_exhaustive()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_requires_known_length() {
        let mut progress = DownloadProgress {
            file_name: "ashita.zip".into(),
            bytes_downloaded: 512,
            total_bytes: Some(1024),
        };
        assert_eq!(progress.percent(), Some(50));

        progress.total_bytes = None;
        assert_eq!(progress.percent(), None);

        progress.total_bytes = Some(0);
        assert_eq!(progress.percent(), None);
    }
}
