use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::extensions::{install_curated, remove_blocked};
use crate::core::archive::{install_tree, InstallPlan};
use crate::core::downloader::{ArtifactFetcher, FetchRequest};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::github::{ArtifactSource, VersionMarker, VersionResolver};
use crate::core::http::RemoteSource;
use crate::core::outcome::{Outcome, Warnings};
use crate::core::progress::ProgressSink;

pub const ENTRY_POINT: &str = "Ashita-cli.exe";
pub const VERSION_FILE: &str = "version.txt";

/// User-owned paths carried across every rebuild, in restore order.
pub const PRESERVED_PATHS: &[&str] = &["addons", "plugins", "config/boot", "config/profiles"];

/// Created after each install; the archive does not ship them.
const STRUCTURAL_DIRS: &[&str] = &["bootloader", "config/boot"];

const SCRATCH_PREFIX: &str = "MistXI_Ashita_";

pub fn ashita_source() -> ArtifactSource {
    ArtifactSource::snapshot("AshitaXI/Ashita-v4beta", "main")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeCheck {
    UpToDate(VersionMarker),
    Stale {
        latest: VersionMarker,
        installed: Option<VersionMarker>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeStatus {
    /// Nothing was fetched or changed.
    UpToDate(VersionMarker),
    /// The tree was rebuilt at this marker.
    Installed(VersionMarker),
}

impl RuntimeStatus {
    pub fn marker(&self) -> &VersionMarker {
        match self {
            RuntimeStatus::UpToDate(m) | RuntimeStatus::Installed(m) => m,
        }
    }
}

/// Sole owner of the Ashita tree and its version marker.
#[derive(Clone)]
pub struct RuntimeProvisioner {
    resolver: VersionResolver,
    fetcher: ArtifactFetcher,
    source: ArtifactSource,
    scratch_base: PathBuf,
}

impl RuntimeProvisioner {
    pub fn new(remote: Arc<dyn RemoteSource>, scratch_base: impl Into<PathBuf>) -> Self {
        Self {
            resolver: VersionResolver::new(remote.clone()),
            fetcher: ArtifactFetcher::new(remote),
            source: ashita_source(),
            scratch_base: scratch_base.into(),
        }
    }

    /// Marker currently recorded on disk, if the tree looks installed.
    pub async fn installed_marker(target: &Path) -> Option<VersionMarker> {
        if !tokio::fs::try_exists(target.join(ENTRY_POINT))
            .await
            .unwrap_or(false)
        {
            return None;
        }
        let raw = tokio::fs::read_to_string(target.join(VERSION_FILE))
            .await
            .ok()?;
        let marker = VersionMarker::new(raw);
        (!marker.as_str().is_empty()).then_some(marker)
    }

    /// Compare the installed tree against the latest upstream snapshot.
    pub async fn check(&self, target: &Path) -> LauncherResult<RuntimeCheck> {
        let latest = self.resolver.resolve_latest(&self.source).await?;
        let installed = Self::installed_marker(target).await;
        if installed.as_ref() == Some(&latest) {
            debug!("Ashita {} already installed", latest);
            return Ok(RuntimeCheck::UpToDate(latest));
        }
        Ok(RuntimeCheck::Stale { latest, installed })
    }

    /// Check, then rebuild when stale. `on_stale` runs once the new marker is
    /// known and before anything is downloaded.
    #[instrument(skip(self, progress, cancel, on_stale))]
    pub async fn ensure_current(
        &self,
        target: &Path,
        progress: &ProgressSink,
        cancel: &CancellationToken,
        on_stale: impl FnOnce(&VersionMarker),
    ) -> LauncherResult<Outcome<RuntimeStatus>> {
        match self.check(target).await? {
            RuntimeCheck::UpToDate(marker) => Ok(Outcome::new(RuntimeStatus::UpToDate(marker))),
            RuntimeCheck::Stale { latest, installed } => {
                info!(
                    "Ashita update available: {} -> {}",
                    installed.as_ref().map_or("none", |m| m.as_str()),
                    latest
                );
                on_stale(&latest);
                Ok(self
                    .install(target, &latest, progress, cancel)
                    .await?
                    .map(RuntimeStatus::Installed))
            }
        }
    }

    /// Rebuild `target` at `marker`. The marker file is written last, so an
    /// interrupted install is retried on the next run.
    pub async fn install(
        &self,
        target: &Path,
        marker: &VersionMarker,
        progress: &ProgressSink,
        cancel: &CancellationToken,
    ) -> LauncherResult<Outcome<VersionMarker>> {
        let scratch = self
            .scratch_base
            .join(format!("{}{}", SCRATCH_PREFIX, Uuid::new_v4().simple()));

        let result = self
            .install_in(target, marker, &scratch, progress, cancel)
            .await;

        if tokio::fs::try_exists(&scratch).await.unwrap_or(false) {
            if let Err(e) = tokio::fs::remove_dir_all(&scratch).await {
                warn!("Could not remove scratch dir {:?}: {}", scratch, e);
            }
        }
        result
    }

    async fn install_in(
        &self,
        target: &Path,
        marker: &VersionMarker,
        scratch: &Path,
        progress: &ProgressSink,
        cancel: &CancellationToken,
    ) -> LauncherResult<Outcome<VersionMarker>> {
        let archive_url = self.source.archive_url().ok_or_else(|| {
            LauncherError::Other(format!("{} is not a snapshot source", self.source.repo))
        })?;
        let archive = scratch.join("ashita.zip");

        info!("Installing Ashita {} into {:?}", marker, target);
        progress.status("Downloading Ashita...");
        let req = FetchRequest {
            url: &archive_url,
            dest: &archive,
            min_size: 0,
            label: "Ashita",
        };
        self.fetcher.fetch(req, progress, cancel).await?;

        ensure_not_cancelled(cancel)?;
        progress.status("Extracting Ashita...");
        let plan = InstallPlan {
            archive,
            target: target.to_path_buf(),
            preserve: PRESERVED_PATHS.iter().map(PathBuf::from).collect(),
            entry_point: ENTRY_POINT.to_string(),
            scratch: scratch.to_path_buf(),
        };
        let mut warnings = Warnings::new();
        warnings.extend(install_tree(plan).await?.warnings);

        for dir in STRUCTURAL_DIRS {
            let path = target.join(dir);
            tokio::fs::create_dir_all(&path)
                .await
                .map_err(|source| LauncherError::Io { path, source })?;
        }

        ensure_not_cancelled(cancel)?;
        install_curated(
            &self.fetcher,
            &self.resolver,
            target,
            progress,
            cancel,
            &mut warnings,
        )
        .await?;

        ensure_not_cancelled(cancel)?;
        remove_blocked(target, &mut warnings).await;

        ensure_not_cancelled(cancel)?;
        let version_path = target.join(VERSION_FILE);
        tokio::fs::write(&version_path, marker.as_str())
            .await
            .map_err(|source| LauncherError::Io {
                path: version_path,
                source,
            })?;

        info!("Ashita {} installed", marker);
        Ok(warnings.finish(marker.clone()))
    }
}

fn ensure_not_cancelled(cancel: &CancellationToken) -> LauncherResult<()> {
    if cancel.is_cancelled() {
        return Err(LauncherError::Cancelled);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::archive::testing::zip_bytes;
    use crate::core::http::testing::FakeRemote;
    use crate::core::runtime::extensions::{ExtensionSource, CURATED_EXTENSIONS};

    const SHA: &str = "aaaaaaaaaaaabbbbbbbbbbbbcccccccccccccccc";
    const DEEPS_API: &str = "https://api.github.com/repos/relliko/Deeps/releases/latest";
    const DEEPS_DLL: &str = "https://github.com/relliko/Deeps/releases/download/v1/deeps.dll";

    fn nomount_url() -> &'static str {
        match CURATED_EXTENSIONS[0].source {
            ExtensionSource::DirectFile { url } => url,
            _ => unreachable!(),
        }
    }

    fn upstream(sha: &str) -> FakeRemote {
        let src = ashita_source();
        let remote = FakeRemote::new();
        remote.route(&src.commit_url("main"), format!(r#"{{"sha":"{}"}}"#, sha));
        remote.route(
            &src.archive_url().unwrap(),
            zip_bytes(&[
                ("Ashita-v4beta-main/Ashita-cli.exe", b"exe"),
                ("Ashita-v4beta-main/addons/fps/fps.lua", b"-- fps"),
                ("Ashita-v4beta-main/addons/allmaps/allmaps.lua", b"-- blocked"),
                ("Ashita-v4beta-main/plugins/addons.dll", b"dll"),
            ]),
        );
        remote.route(nomount_url(), "-- nomount");
        remote.route(
            DEEPS_API,
            format!(
                r#"{{"tag_name":"v1","assets":[{{"name":"Deeps.dll","browser_download_url":"{}"}}]}}"#,
                DEEPS_DLL
            ),
        );
        remote.route(DEEPS_DLL, "deeps");
        remote
    }

    fn scratch_dirs(base: &Path) -> usize {
        std::fs::read_dir(base)
            .map(|rd| {
                rd.filter_map(Result::ok)
                    .filter(|e| e.file_name().to_string_lossy().starts_with(SCRATCH_PREFIX))
                    .count()
            })
            .unwrap_or(0)
    }

    #[tokio::test]
    async fn fresh_install_applies_extensions_and_marker() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("ashita");
        let scratch = dir.path().join("tmp");
        let remote = Arc::new(upstream(SHA));
        let provisioner = RuntimeProvisioner::new(remote.clone(), &scratch);
        let mut announced = None;

        let outcome = provisioner
            .ensure_current(&target, &ProgressSink::noop(), &CancellationToken::new(), |m| {
                announced = Some(m.clone())
            })
            .await
            .unwrap();

        assert_eq!(
            outcome.value,
            RuntimeStatus::Installed(VersionMarker::new("aaaaaaaaaaaa"))
        );
        assert_eq!(announced, Some(VersionMarker::new("aaaaaaaaaaaa")));
        assert!(!outcome.has_warnings());
        assert_eq!(
            std::fs::read_to_string(target.join(VERSION_FILE)).unwrap(),
            "aaaaaaaaaaaa"
        );
        assert!(target.join("addons/nomount/nomount.lua").is_file());
        assert!(target.join("plugins/deeps.dll").is_file());
        assert!(target.join("bootloader").is_dir());
        assert!(target.join("config/boot").is_dir());
        assert!(!target.join("addons/allmaps").exists());
        assert_eq!(scratch_dirs(&scratch), 0);
    }

    #[tokio::test]
    async fn second_run_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("ashita");
        let remote = Arc::new(upstream(SHA));
        let provisioner = RuntimeProvisioner::new(remote.clone(), dir.path().join("tmp"));
        let cancel = CancellationToken::new();

        provisioner
            .ensure_current(&target, &ProgressSink::noop(), &cancel, |_| {})
            .await
            .unwrap();
        let archive_url = ashita_source().archive_url().unwrap();
        assert_eq!(remote.hits(&archive_url), 1);

        let mut stale_again = false;
        let second = provisioner
            .ensure_current(&target, &ProgressSink::noop(), &cancel, |_| stale_again = true)
            .await
            .unwrap();
        assert!(matches!(second.value, RuntimeStatus::UpToDate(_)));
        assert!(!stale_again);
        assert_eq!(remote.hits(&archive_url), 1);
    }

    #[tokio::test]
    async fn user_addons_survive_reinstall() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("ashita");
        std::fs::create_dir_all(target.join("addons/mine")).unwrap();
        std::fs::write(target.join("addons/mine/mine.lua"), "-- mine").unwrap();
        std::fs::write(target.join(ENTRY_POINT), "old").unwrap();
        std::fs::write(target.join(VERSION_FILE), "000000000000").unwrap();

        let remote = Arc::new(upstream(SHA));
        let provisioner = RuntimeProvisioner::new(remote, dir.path().join("tmp"));
        provisioner
            .ensure_current(&target, &ProgressSink::noop(), &CancellationToken::new(), |_| {})
            .await
            .unwrap();

        assert_eq!(
            std::fs::read_to_string(target.join("addons/mine/mine.lua")).unwrap(),
            "-- mine"
        );
        assert_eq!(std::fs::read_to_string(target.join(ENTRY_POINT)).unwrap(), "exe");
    }

    #[tokio::test]
    async fn failing_extension_is_a_warning_not_a_failure() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("ashita");
        let remote = upstream(SHA);
        remote.fail(DEEPS_API, 500);
        let provisioner = RuntimeProvisioner::new(Arc::new(remote), dir.path().join("tmp"));

        let outcome = provisioner
            .ensure_current(&target, &ProgressSink::noop(), &CancellationToken::new(), |_| {})
            .await
            .unwrap();

        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.warnings[0].stage, "curated-extension");
        assert!(target.join(VERSION_FILE).is_file());
        assert!(target.join("addons/nomount/nomount.lua").is_file());
    }

    #[tokio::test]
    async fn broken_archive_leaves_no_marker() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("ashita");
        let scratch = dir.path().join("tmp");
        let remote = upstream(SHA);
        remote.route(&ashita_source().archive_url().unwrap(), "not a zip");
        let provisioner = RuntimeProvisioner::new(Arc::new(remote), &scratch);

        let result = provisioner
            .ensure_current(&target, &ProgressSink::noop(), &CancellationToken::new(), |_| {})
            .await;

        assert!(result.is_err());
        assert!(!target.join(VERSION_FILE).exists());
        assert_eq!(scratch_dirs(&scratch), 0);
    }

    #[tokio::test]
    async fn cancelled_install_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("ashita");
        let provisioner =
            RuntimeProvisioner::new(Arc::new(upstream(SHA)), dir.path().join("tmp"));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = provisioner
            .install(
                &target,
                &VersionMarker::new("aaaaaaaaaaaa"),
                &ProgressSink::noop(),
                &cancel,
            )
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert!(!target.exists());
    }
}
