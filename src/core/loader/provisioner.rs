use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use crate::core::downloader::{ArtifactFetcher, FetchRequest, MIN_EXECUTABLE_BYTES};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::github::{ArtifactSource, GithubAsset, GithubRelease, VersionResolver};
use crate::core::http::RemoteSource;
use crate::core::progress::ProgressSink;

pub const LOADER_FILE: &str = "xiloader.exe";

/// Tag reported when a release carries no tag name.
const UNTAGGED: &str = "latest";

pub fn xiloader_source() -> ArtifactSource {
    ArtifactSource::releases("LandSandBoat/xiloader")
}

/// Pick the loader executable out of a release.
///
/// Exact `xiloader.exe` first, then any `*xiloader*.exe`, then any `.exe`.
pub fn select_asset(release: &GithubRelease) -> Option<&GithubAsset> {
    let lower = |a: &GithubAsset| a.name.to_ascii_lowercase();
    release
        .assets
        .iter()
        .find(|a| lower(a) == LOADER_FILE)
        .or_else(|| {
            release.assets.iter().find(|a| {
                let name = lower(a);
                name.contains("xiloader") && name.ends_with(".exe")
            })
        })
        .or_else(|| release.assets.iter().find(|a| lower(a).ends_with(".exe")))
}

/// Keeps `bootloader/xiloader.exe` at the requested release.
///
/// Unlike the runtime there is no on-disk check: every call re-resolves and
/// re-downloads.
#[derive(Clone)]
pub struct LoaderProvisioner {
    resolver: VersionResolver,
    fetcher: ArtifactFetcher,
    source: ArtifactSource,
}

impl LoaderProvisioner {
    pub fn new(remote: Arc<dyn RemoteSource>) -> Self {
        Self {
            resolver: VersionResolver::new(remote.clone()),
            fetcher: ArtifactFetcher::new(remote),
            source: xiloader_source(),
        }
    }

    /// `override` values shaped like a tag (`v...`) pin that release; anything
    /// else means latest.
    pub async fn resolve(&self, version_override: Option<&str>) -> LauncherResult<GithubRelease> {
        match version_override.map(str::trim) {
            Some(tag) if tag.starts_with('v') => {
                self.resolver.release_by_tag(&self.source, tag).await
            }
            _ => self.resolver.latest_release(&self.source).await,
        }
    }

    /// Download the release's loader onto `dest`. Returns the applied tag.
    pub async fn install(
        &self,
        release: &GithubRelease,
        dest: &Path,
        progress: &ProgressSink,
        cancel: &CancellationToken,
    ) -> LauncherResult<String> {
        let tag = if release.tag_name.trim().is_empty() {
            UNTAGGED.to_string()
        } else {
            release.tag_name.clone()
        };
        let asset = select_asset(release).ok_or_else(|| {
            LauncherError::AssetNotFound(format!(
                "{} release {} has no .exe asset",
                self.source.repo, tag
            ))
        })?;

        progress.status(format!("Downloading XiLoader {}...", tag));
        let req = FetchRequest {
            url: &asset.browser_download_url,
            dest,
            min_size: MIN_EXECUTABLE_BYTES,
            label: "XiLoader",
        };
        self.fetcher.fetch(req, progress, cancel).await?;
        info!("XiLoader {} installed from {}", tag, asset.name);
        Ok(tag)
    }

    /// Resolve, then install. `on_resolved` runs between the two, before any
    /// bytes are fetched.
    #[instrument(skip(self, progress, cancel, on_resolved))]
    pub async fn ensure_current(
        &self,
        dest: &Path,
        progress: &ProgressSink,
        cancel: &CancellationToken,
        version_override: Option<&str>,
        on_resolved: impl FnOnce(&GithubRelease),
    ) -> LauncherResult<String> {
        let release = self.resolve(version_override).await?;
        on_resolved(&release);
        self.install(&release, dest, progress, cancel).await
    }

    /// Recent release tags for a version picker. Empty on any failure.
    pub async fn list_tags(&self, count: usize) -> Vec<String> {
        self.resolver.list_recent_tags(&self.source, count).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;
    use crate::core::http::testing::FakeRemote;

    fn asset(name: &str) -> GithubAsset {
        GithubAsset {
            name: name.into(),
            browser_download_url: format!("https://dl.test/{}", name),
        }
    }

    fn release(tag: &str, names: &[&str]) -> GithubRelease {
        GithubRelease {
            tag_name: tag.into(),
            assets: names.iter().map(|n| asset(n)).collect(),
        }
    }

    #[test]
    fn asset_selection_prefers_exact_name() {
        let r = release("v1", &["tools.exe", "xiloader-x86.exe", "XILOADER.EXE", "src.zip"]);
        assert_eq!(select_asset(&r).unwrap().name, "XILOADER.EXE");

        let r = release("v1", &["tools.exe", "xiloader-x86.exe"]);
        assert_eq!(select_asset(&r).unwrap().name, "xiloader-x86.exe");

        let r = release("v1", &["src.zip", "tools.exe"]);
        assert_eq!(select_asset(&r).unwrap().name, "tools.exe");

        assert!(select_asset(&release("v1", &["src.zip"])).is_none());
    }

    fn remote_with(release_json: &str, url: &str) -> FakeRemote {
        let remote = FakeRemote::new();
        remote.route(url, release_json);
        remote.route("https://dl.test/xiloader.exe", vec![0u8; 60_000]);
        remote
    }

    #[tokio::test]
    async fn override_tag_pins_release() {
        let src = xiloader_source();
        let remote = Arc::new(remote_with(
            r#"{"tag_name":"v1.0.0","assets":[{"name":"xiloader.exe","browser_download_url":"https://dl.test/xiloader.exe"}]}"#,
            &src.release_by_tag_url("v1.0.0"),
        ));
        let loader = LoaderProvisioner::new(remote.clone());
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("bootloader").join(LOADER_FILE);

        let tag = loader
            .ensure_current(
                &dest,
                &ProgressSink::noop(),
                &CancellationToken::new(),
                Some("v1.0.0"),
                |_| {},
            )
            .await
            .unwrap();

        assert_eq!(tag, "v1.0.0");
        assert_eq!(remote.hits(&src.latest_release_url()), 0);
        assert_eq!(std::fs::metadata(&dest).unwrap().len(), 60_000);
    }

    #[tokio::test]
    async fn non_tag_override_means_latest_and_always_redownloads() {
        let src = xiloader_source();
        let remote = Arc::new(remote_with(
            r#"{"tag_name":"","assets":[{"name":"xiloader.exe","browser_download_url":"https://dl.test/xiloader.exe"}]}"#,
            &src.latest_release_url(),
        ));
        let loader = LoaderProvisioner::new(remote.clone());
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join(LOADER_FILE);
        let cancel = CancellationToken::new();

        for _ in 0..2 {
            let tag = loader
                .ensure_current(&dest, &ProgressSink::noop(), &cancel, Some("latest"), |_| {})
                .await
                .unwrap();
            assert_eq!(tag, "latest");
        }
        assert_eq!(remote.hits("https://dl.test/xiloader.exe"), 2);
    }

    #[tokio::test]
    async fn truncated_loader_keeps_previous_binary() {
        let src = xiloader_source();
        let remote = remote_with(
            r#"{"tag_name":"v2","assets":[{"name":"xiloader.exe","browser_download_url":"https://dl.test/xiloader.exe"}]}"#,
            &src.latest_release_url(),
        );
        remote.route("https://dl.test/xiloader.exe", vec![0u8; 1_000]);
        let loader = LoaderProvisioner::new(Arc::new(remote));
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join(LOADER_FILE);
        std::fs::write(&dest, vec![1u8; 70_000]).unwrap();

        let err = loader
            .ensure_current(
                &dest,
                &ProgressSink::noop(),
                &CancellationToken::new(),
                None,
                |_| {},
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::CorruptDownload);
        assert_eq!(std::fs::metadata(&dest).unwrap().len(), 70_000);
    }

    #[tokio::test]
    async fn release_without_executable_is_asset_not_found() {
        let src = xiloader_source();
        let remote = remote_with(
            r#"{"tag_name":"v3","assets":[{"name":"source.zip","browser_download_url":"https://dl.test/source.zip"}]}"#,
            &src.latest_release_url(),
        );
        let loader = LoaderProvisioner::new(Arc::new(remote));
        let dir = tempfile::tempdir().unwrap();
        let mut resolved = None;

        let err = loader
            .ensure_current(
                &dir.path().join(LOADER_FILE),
                &ProgressSink::noop(),
                &CancellationToken::new(),
                None,
                |r| resolved = Some(r.tag_name.clone()),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AssetNotFound);
        assert_eq!(resolved.as_deref(), Some("v3"));
    }
}
