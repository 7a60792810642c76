// ─── Provisioning facade ───
// One entry point that turns "the user pressed Play" into a launchable tree.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Local;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument};

use super::phase::Phase;
use crate::core::addons::{render_script, ScriptInputs};
use crate::core::boot::{self, BootTarget};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::fsutil::write_atomic;
use crate::core::github::VersionMarker;
use crate::core::http::RemoteSource;
use crate::core::launch::LaunchPlan;
use crate::core::loader::LoaderProvisioner;
use crate::core::outcome::{Outcome, Warnings};
use crate::core::profile::GameProfile;
use crate::core::progress::ProgressSink;
use crate::core::runtime::{RuntimeProvisioner, RuntimeStatus};
use crate::core::state::LauncherPaths;

pub const DEFAULT_SERVER_HOST: &str = "play.mistxi.com";

/// Inputs for one launch preparation.
#[derive(Debug, Clone)]
pub struct LaunchRequest<'a> {
    pub profile: &'a GameProfile,
    pub ffxi_dir: &'a str,
    pub username: Option<&'a str>,
    pub password: Option<&'a str>,
    /// Picks `mistxi.ini` over `mistxi.session.ini`.
    pub persist_credentials: bool,
    pub loader_override: Option<&'a str>,
}

/// Everything produced by a successful attempt.
#[derive(Debug, Clone, Serialize)]
pub struct PreparedLaunch {
    pub runtime_marker: VersionMarker,
    /// `false` when the installed runtime was already current.
    pub runtime_installed: bool,
    pub loader_tag: String,
    pub config_name: String,
    pub config_path: PathBuf,
    pub script_path: PathBuf,
    pub plan: LaunchPlan,
}

/// Resets the single-flight flag however the attempt ends.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct ProvisioningFacade {
    runtime: RuntimeProvisioner,
    loader: LoaderProvisioner,
    paths: LauncherPaths,
    server_host: String,
    in_flight: AtomicBool,
    phase: Mutex<Phase>,
}

impl ProvisioningFacade {
    pub fn new(remote: Arc<dyn RemoteSource>, paths: LauncherPaths) -> Self {
        Self {
            runtime: RuntimeProvisioner::new(remote.clone(), paths.temp_dir()),
            loader: LoaderProvisioner::new(remote),
            paths,
            server_host: DEFAULT_SERVER_HOST.to_string(),
            in_flight: AtomicBool::new(false),
            phase: Mutex::new(Phase::Idle),
        }
    }

    pub fn with_server_host(mut self, host: impl Into<String>) -> Self {
        self.server_host = host.into();
        self
    }

    pub fn paths(&self) -> &LauncherPaths {
        &self.paths
    }

    pub fn phase(&self) -> Phase {
        self.phase
            .lock()
            .map(|p| p.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    fn set_phase(&self, phase: Phase) {
        match self.phase.lock() {
            Ok(mut slot) => *slot = phase,
            Err(poisoned) => *poisoned.into_inner() = phase,
        }
    }

    fn enter(&self, phase: Phase, progress: &ProgressSink) {
        info!("Launch preparation: {:?}", phase);
        progress.status(phase.to_string());
        self.set_phase(phase);
    }

    /// Fails with `Cancelled` if cancellation was requested and the current
    /// phase still allows it.
    fn checkpoint(&self, cancel: &CancellationToken) -> LauncherResult<()> {
        if cancel.is_cancelled() && self.phase().is_cancellable() {
            return Err(LauncherError::Cancelled);
        }
        Ok(())
    }

    /// Bring runtime and loader up to date, then write the boot config and
    /// script for `request`.
    ///
    /// A second call while one is running fails with `Busy` immediately.
    /// Nothing is retried automatically.
    #[instrument(skip_all, fields(profile = %request.profile.name))]
    pub async fn prepare(
        &self,
        request: &LaunchRequest<'_>,
        progress: &ProgressSink,
        cancel: &CancellationToken,
    ) -> LauncherResult<Outcome<PreparedLaunch>> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(LauncherError::Busy);
        }
        let _guard = InFlight(&self.in_flight);
        self.set_phase(Phase::Idle);

        match self.run(request, progress, cancel).await {
            Ok(outcome) => {
                self.enter(Phase::Ready, progress);
                Ok(outcome)
            }
            Err(e) => {
                if e.is_cancelled() {
                    info!("Launch preparation cancelled");
                } else {
                    error!("Launch preparation failed: {}", e);
                }
                self.enter(Phase::Failed(e.user_message()), progress);
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        request: &LaunchRequest<'_>,
        progress: &ProgressSink,
        cancel: &CancellationToken,
    ) -> LauncherResult<Outcome<PreparedLaunch>> {
        let runtime_dir = self.paths.runtime_dir();
        let mut warnings = Warnings::new();

        // ── Runtime ──
        self.checkpoint(cancel)?;
        self.enter(Phase::ResolvingRuntime, progress);
        let runtime = self
            .runtime
            .ensure_current(&runtime_dir, progress, cancel, |_| {
                self.enter(Phase::InstallingRuntime, progress)
            })
            .await?;
        warnings.extend(runtime.warnings);
        let runtime_installed = matches!(runtime.value, RuntimeStatus::Installed(_));
        let runtime_marker = runtime.value.marker().clone();

        // ── Loader ──
        self.checkpoint(cancel)?;
        self.enter(Phase::ResolvingLoader, progress);
        let loader_tag = self
            .loader
            .ensure_current(
                &self.paths.loader_path(),
                progress,
                cancel,
                request.loader_override,
                |_| self.enter(Phase::InstallingLoader, progress),
            )
            .await?;

        // ── Artifacts: runs to completion once started ──
        self.checkpoint(cancel)?;
        self.enter(Phase::ComposingArtifacts, progress);

        let config_name = boot::config_file_name(request.persist_credentials);
        let config_path = self.paths.boot_config_dir().join(config_name);
        let ini = boot::render(
            request.profile,
            &BootTarget {
                ffxi_dir: request.ffxi_dir,
                server_host: &self.server_host,
                username: request.username,
                password: request.password,
            },
        );
        write_atomic(&config_path, ini.as_bytes()).await?;

        let script_path = self.paths.script_path();
        let script = render_script(&ScriptInputs {
            plugins: &request.profile.enabled_plugins,
            addons: &request.profile.enabled_addons,
            fps_cap: request.profile.fps_cap,
            generated_at: Local::now().naive_local(),
        });
        write_atomic(&script_path, script.as_bytes()).await?;

        let plan = LaunchPlan::for_runtime(&runtime_dir, config_name);
        info!(
            "Prepared launch: Ashita {} / XiLoader {} / {}",
            runtime_marker, loader_tag, config_name
        );

        Ok(warnings.finish(PreparedLaunch {
            runtime_marker,
            runtime_installed,
            loader_tag,
            config_name: config_name.to_string(),
            config_path,
            script_path,
            plan,
        }))
    }
}
