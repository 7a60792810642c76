use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::http::RemoteSource;
use crate::core::progress::{DownloadProgress, ProgressSink};

/// Anything smaller than this cannot be a real Windows executable; it is an
/// error page or a truncated transfer.
pub const MIN_EXECUTABLE_BYTES: u64 = 50_000;

/// One download job.
#[derive(Debug, Clone)]
pub struct FetchRequest<'a> {
    pub url: &'a str,
    pub dest: &'a Path,
    /// Reject the body if fewer bytes arrive. `0` disables the check.
    pub min_size: u64,
    /// Human name used in status lines ("Ashita", "XiLoader").
    pub label: &'a str,
}

/// Streams remote bodies to disk and commits them only once complete.
#[derive(Clone)]
pub struct ArtifactFetcher {
    remote: Arc<dyn RemoteSource>,
}

impl ArtifactFetcher {
    pub fn new(remote: Arc<dyn RemoteSource>) -> Self {
        Self { remote }
    }

    /// Download `req.url` onto `req.dest`, returning the number of bytes written.
    ///
    /// The body is written to a uniquely named sibling and renamed onto the
    /// destination at the end. On any failure, including cancellation, the
    /// temp file is removed and the destination is left as it was.
    #[instrument(skip(self, req, progress, cancel), fields(url = req.url))]
    pub async fn fetch(
        &self,
        req: FetchRequest<'_>,
        progress: &ProgressSink,
        cancel: &CancellationToken,
    ) -> LauncherResult<u64> {
        if cancel.is_cancelled() {
            return Err(LauncherError::Cancelled);
        }

        if let Some(parent) = req.dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| LauncherError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        let temp = temp_sibling(req.dest);
        let result = self.stream_to(&req, &temp, progress, cancel).await;

        let written = match result {
            Ok(written) => written,
            Err(e) => {
                let _ = tokio::fs::remove_file(&temp).await;
                return Err(e);
            }
        };

        if let Err(e) = commit(&temp, req.dest).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(e);
        }

        info!("Downloaded {} ({} bytes) -> {:?}", req.url, written, req.dest);
        Ok(written)
    }

    async fn stream_to(
        &self,
        req: &FetchRequest<'_>,
        temp: &Path,
        progress: &ProgressSink,
        cancel: &CancellationToken,
    ) -> LauncherResult<u64> {
        let body = tokio::select! {
            _ = cancel.cancelled() => return Err(LauncherError::Cancelled),
            body = self.remote.open_stream(req.url) => body?,
        };
        let total = body.total;
        let mut chunks = body.chunks;

        let file_name = req
            .dest
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        // Handle lives only inside this block; it must be closed before the rename.
        let written = {
            let mut file = tokio::fs::File::create(temp)
                .await
                .map_err(|source| LauncherError::Io {
                    path: temp.to_path_buf(),
                    source,
                })?;

            let mut written = 0_u64;
            let mut last_percent: Option<u8> = None;
            loop {
                // Cancellation wins over a chunk that is already available.
                let next = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(LauncherError::Cancelled),
                    next = chunks.next() => next,
                };
                let Some(chunk) = next else { break };
                let chunk = chunk?;

                file.write_all(&chunk)
                    .await
                    .map_err(|source| LauncherError::Io {
                        path: temp.to_path_buf(),
                        source,
                    })?;
                written = written.saturating_add(chunk.len() as u64);

                let payload = DownloadProgress {
                    file_name: file_name.clone(),
                    bytes_downloaded: written,
                    total_bytes: total,
                };
                let percent = payload.percent();
                progress.download(payload);
                if percent.is_some() && percent != last_percent {
                    last_percent = percent;
                    if let Some(p) = percent {
                        progress.status(format!("Downloading {}... {}%", req.label, p));
                    }
                }
            }

            file.flush().await.map_err(|source| LauncherError::Io {
                path: temp.to_path_buf(),
                source,
            })?;
            written
        };

        if cancel.is_cancelled() {
            return Err(LauncherError::Cancelled);
        }

        if req.min_size > 0 && written < req.min_size {
            warn!(
                "Rejecting {}: {} bytes is below the {} byte minimum",
                req.url, written, req.min_size
            );
            return Err(LauncherError::CorruptDownload {
                path: req.dest.to_path_buf(),
                size: written,
                minimum: req.min_size,
            });
        }

        Ok(written)
    }
}

/// `<dest>.<uuid>.tmp` next to the destination, so the final rename stays on one volume.
fn temp_sibling(dest: &Path) -> PathBuf {
    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "download".to_string());
    dest.with_file_name(format!("{}.{}.tmp", name, Uuid::new_v4().simple()))
}

/// Remove-then-move onto the destination.
async fn commit(temp: &Path, dest: &Path) -> LauncherResult<()> {
    if tokio::fs::try_exists(dest).await.unwrap_or(false) {
        debug!("Replacing existing {:?}", dest);
        tokio::fs::remove_file(dest)
            .await
            .map_err(|source| LauncherError::Io {
                path: dest.to_path_buf(),
                source,
            })?;
    }
    tokio::fs::rename(temp, dest)
        .await
        .map_err(|source| LauncherError::Io {
            path: dest.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use futures_util::stream;

    use super::*;
    use crate::core::error::ErrorKind;
    use crate::core::http::testing::FakeRemote;
    use crate::core::http::RemoteBody;
    use crate::core::progress::testing::{recording_sink, statuses};

    const URL: &str = "https://example.test/xiloader.exe";

    fn leftovers(dir: &Path) -> Vec<String> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .filter(|n| n.ends_with(".tmp"))
            .collect()
    }

    /// Serves five 1 000-byte chunks and fires `cancel` while producing the third.
    struct CancellingRemote {
        cancel: CancellationToken,
        pulled: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl RemoteSource for CancellingRemote {
        async fn get_text(&self, url: &str) -> LauncherResult<String> {
            Err(LauncherError::Other(format!("no text at {}", url)))
        }

        async fn open_stream(&self, _url: &str) -> LauncherResult<RemoteBody> {
            let cancel = self.cancel.clone();
            let pulled = self.pulled.clone();
            let chunks = stream::iter(0..5)
                .then(move |i| {
                    let cancel = cancel.clone();
                    let pulled = pulled.clone();
                    async move {
                        pulled.fetch_add(1, Ordering::SeqCst);
                        if i == 2 {
                            cancel.cancel();
                        }
                        Ok::<_, LauncherError>(vec![0u8; 1_000])
                    }
                })
                .boxed();
            Ok(RemoteBody {
                total: Some(5_000),
                chunks,
            })
        }
    }

    #[tokio::test]
    async fn commits_complete_download() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("bin").join("xiloader.exe");
        let remote = FakeRemote::new().with_chunk_size(10_000);
        remote.route(URL, vec![7u8; 60_000]);
        let fetcher = ArtifactFetcher::new(Arc::new(remote));
        let (sink, events) = recording_sink();

        let req = FetchRequest {
            url: URL,
            dest: &dest,
            min_size: MIN_EXECUTABLE_BYTES,
            label: "XiLoader",
        };
        let written = fetcher
            .fetch(req, &sink, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(written, 60_000);
        assert_eq!(std::fs::metadata(&dest).unwrap().len(), 60_000);
        assert!(leftovers(dest.parent().unwrap()).is_empty());
        let lines = statuses(&events);
        assert_eq!(lines.last().map(String::as_str), Some("Downloading XiLoader... 100%"));
    }

    #[tokio::test]
    async fn undersized_body_leaves_destination_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("xiloader.exe");
        std::fs::write(&dest, b"previous build").unwrap();
        let remote = FakeRemote::new();
        remote.route(URL, b"<html>rate limited</html>".to_vec());
        let fetcher = ArtifactFetcher::new(Arc::new(remote));

        let req = FetchRequest {
            url: URL,
            dest: &dest,
            min_size: MIN_EXECUTABLE_BYTES,
            label: "XiLoader",
        };
        let err = fetcher
            .fetch(req, &ProgressSink::noop(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::CorruptDownload);
        assert_eq!(std::fs::read(&dest).unwrap(), b"previous build");
        assert!(leftovers(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn http_failure_is_network_error() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("ashita.zip");
        let remote = FakeRemote::new();
        remote.fail(URL, 502);
        let fetcher = ArtifactFetcher::new(Arc::new(remote));

        let req = FetchRequest {
            url: URL,
            dest: &dest,
            min_size: 0,
            label: "Ashita",
        };
        let err = fetcher
            .fetch(req, &ProgressSink::noop(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Network);
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn cancelled_before_start_does_not_touch_network() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("ashita.zip");
        let remote = Arc::new(FakeRemote::new());
        remote.route(URL, vec![1u8; 10]);
        let fetcher = ArtifactFetcher::new(remote.clone());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let req = FetchRequest {
            url: URL,
            dest: &dest,
            min_size: 0,
            label: "Ashita",
        };
        let err = fetcher
            .fetch(req, &ProgressSink::noop(), &cancel)
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert_eq!(remote.total_hits(), 0);
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn cancel_between_chunks_discards_partial_body() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("ashita.zip");
        let cancel = CancellationToken::new();
        let pulled = Arc::new(AtomicUsize::new(0));
        let fetcher = ArtifactFetcher::new(Arc::new(CancellingRemote {
            cancel: cancel.clone(),
            pulled: pulled.clone(),
        }));

        let req = FetchRequest {
            url: URL,
            dest: &dest,
            min_size: 0,
            label: "Ashita",
        };
        let err = fetcher
            .fetch(req, &ProgressSink::noop(), &cancel)
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert_eq!(pulled.load(Ordering::SeqCst), 3);
        assert!(!dest.exists());
        assert!(leftovers(dir.path()).is_empty());
    }
}
