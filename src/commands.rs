// ─── Commands ───
// Operations the outer shell calls. Each one loads state, does its work and
// saves, so the shell never holds launcher state itself.

use std::path::PathBuf;

use chrono::Local;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::core::addons::{render_script, scan_addons, scan_plugins, ExtensionInfo, ScriptInputs};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::fsutil::write_atomic;
use crate::core::loader::LoaderProvisioner;
use crate::core::outcome::Outcome;
use crate::core::profile::{GameProfile, ProfileSet};
use crate::core::progress::ProgressSink;
use crate::core::provision::{LaunchRequest, PreparedLaunch};
use crate::core::runtime::ENTRY_POINT;
use crate::core::state::{AppState, LauncherState};
use crate::core::web::{Announcement, NewsClient, StatusClient};

/// Login supplied for this launch only.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProfileSummary {
    pub profiles: Vec<String>,
    pub active: String,
}

#[derive(Debug, Serialize)]
pub struct ExtensionListing {
    pub addons: Vec<ExtensionInfo>,
    pub plugins: Vec<ExtensionInfo>,
}

// ── Launch ──────────────────────────────────────────────

pub async fn prepare_launch(
    app: &AppState,
    credentials: Credentials,
    progress: &ProgressSink,
    cancel: &CancellationToken,
) -> LauncherResult<Outcome<PreparedLaunch>> {
    let state = app.store.load().await;
    let ffxi_dir = state
        .ffxi_dir
        .as_ref()
        .map(|p| p.to_string_lossy().to_string())
        .ok_or_else(|| {
            LauncherError::Other("FFXI directory is not set. Run setup first.".into())
        })?;
    let profile = state.profiles.active().clone();

    let username = credentials
        .username
        .or_else(|| state.saved_user.clone())
        .or_else(|| profile.username.clone());

    let request = LaunchRequest {
        profile: &profile,
        ffxi_dir: &ffxi_dir,
        username: username.as_deref(),
        password: credentials.password.as_deref(),
        persist_credentials: state.has_saved_credentials(),
        loader_override: state.loader_override(),
    };
    app.facade.prepare(&request, progress, cancel).await
}

pub async fn loader_tags(app: &AppState, count: usize) -> Vec<String> {
    LoaderProvisioner::new(app.remote.clone())
        .list_tags(count)
        .await
}

/// Pin XiLoader to `version`, or follow latest with `None`.
pub async fn set_loader_version(app: &AppState, version: Option<String>) -> LauncherResult<()> {
    update_state(app, |state| {
        state.xi_loader_version = version.filter(|v| !v.trim().is_empty());
        Ok(())
    })
    .await
}

pub async fn set_ffxi_dir(app: &AppState, dir: PathBuf) -> LauncherResult<()> {
    update_state(app, |state| {
        state.ffxi_dir = Some(dir);
        Ok(())
    })
    .await
}

// ── Profiles ────────────────────────────────────────────

pub async fn list_profiles(app: &AppState) -> ProfileSummary {
    summarize(&app.store.load().await.profiles)
}

pub async fn create_profile(app: &AppState) -> LauncherResult<String> {
    let mut created = String::new();
    update_state(app, |state| {
        created = state.profiles.create().name.clone();
        Ok(())
    })
    .await?;
    Ok(created)
}

pub async fn rename_profile(app: &AppState, old: &str, new: &str) -> LauncherResult<()> {
    update_state(app, |state| state.profiles.rename(old, new)).await
}

pub async fn delete_profile(app: &AppState, name: &str) -> LauncherResult<()> {
    update_state(app, |state| state.profiles.delete(name)).await
}

pub async fn activate_profile(app: &AppState, name: &str) -> LauncherResult<()> {
    update_state(app, |state| state.profiles.activate(name)).await?;
    refresh_script(app).await
}

pub async fn get_profile(app: &AppState, name: &str) -> LauncherResult<GameProfile> {
    app.store.load().await.profiles.get(name).cloned()
}

/// Replace the stored profile of the same name with `profile`.
pub async fn save_profile(app: &AppState, profile: GameProfile) -> LauncherResult<()> {
    update_state(app, |state| state.profiles.update(profile)).await?;
    refresh_script(app).await
}

pub async fn set_fps_cap(app: &AppState, profile: &str, tier: i32) -> LauncherResult<()> {
    let mut dirty = false;
    update_state(app, |state| {
        dirty = state.profiles.set_fps_cap(profile, tier)?;
        Ok(())
    })
    .await?;
    if dirty {
        refresh_script(app).await?;
    }
    Ok(())
}

pub async fn set_addon_enabled(
    app: &AppState,
    profile: &str,
    addon: &str,
    enabled: bool,
) -> LauncherResult<()> {
    let mut dirty = false;
    update_state(app, |state| {
        dirty = state.profiles.set_addon_enabled(profile, addon, enabled)?;
        Ok(())
    })
    .await?;
    if dirty {
        refresh_script(app).await?;
    }
    Ok(())
}

pub async fn set_plugin_enabled(
    app: &AppState,
    profile: &str,
    plugin: &str,
    enabled: bool,
) -> LauncherResult<()> {
    let mut dirty = false;
    update_state(app, |state| {
        dirty = state.profiles.set_plugin_enabled(profile, plugin, enabled)?;
        Ok(())
    })
    .await?;
    if dirty {
        refresh_script(app).await?;
    }
    Ok(())
}

// ── Extensions / site ───────────────────────────────────

pub async fn list_extensions(app: &AppState) -> ExtensionListing {
    let state = app.store.load().await;
    let root = app.paths.runtime_dir();
    let profile = state.profiles.active();
    ExtensionListing {
        addons: scan_addons(&root, Some(profile)),
        plugins: scan_plugins(&root, Some(profile)),
    }
}

pub async fn players_online(app: &AppState) -> Option<i64> {
    StatusClient::new(app.remote.clone()).players_online().await
}

pub async fn latest_news(app: &AppState) -> Option<Announcement> {
    NewsClient::new(app.remote.clone()).latest().await
}

// ── Helpers ─────────────────────────────────────────────

fn summarize(set: &ProfileSet) -> ProfileSummary {
    ProfileSummary {
        profiles: set.names().into_iter().map(str::to_string).collect(),
        active: set.active_name().to_string(),
    }
}

async fn update_state(
    app: &AppState,
    mutate: impl FnOnce(&mut LauncherState) -> LauncherResult<()>,
) -> LauncherResult<()> {
    let mut state = app.store.load().await;
    mutate(&mut state)?;
    app.store.save(&state).await
}

/// Rewrite the startup script for the active profile if Ashita is installed.
///
/// Launch preparation rewrites it anyway; this keeps the file current for
/// users who start Ashita by hand.
async fn refresh_script(app: &AppState) -> LauncherResult<()> {
    let runtime = app.paths.runtime_dir();
    if !tokio::fs::try_exists(runtime.join(ENTRY_POINT))
        .await
        .unwrap_or(false)
    {
        return Ok(());
    }

    let state = app.store.load().await;
    let profile = state.profiles.active();
    let script = render_script(&ScriptInputs {
        plugins: &profile.enabled_plugins,
        addons: &profile.enabled_addons,
        fps_cap: profile.fps_cap,
        generated_at: Local::now().naive_local(),
    });
    let path = app.paths.script_path();
    match write_atomic(&path, script.as_bytes()).await {
        Ok(()) => {
            info!("Regenerated {:?} for profile '{}'", path, profile.name);
            Ok(())
        }
        Err(e) => {
            warn!("Failed to regenerate startup script: {}", e);
            Err(e)
        }
    }
}
