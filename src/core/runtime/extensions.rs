use std::path::Path;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::core::downloader::{ArtifactFetcher, FetchRequest};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::github::{ArtifactSource, VersionResolver};
use crate::core::outcome::Warnings;
use crate::core::progress::ProgressSink;

#[derive(Debug, Clone, Copy)]
pub enum ExtensionSource {
    /// Single file at a fixed URL.
    DirectFile { url: &'static str },
    /// Asset of the latest release whose name ends with `suffix` (case-insensitive).
    ReleaseAsset {
        repo: &'static str,
        suffix: &'static str,
    },
}

/// Third-party add-on or plugin shipped alongside every fresh runtime.
#[derive(Debug, Clone, Copy)]
pub struct CuratedExtension {
    pub name: &'static str,
    pub source: ExtensionSource,
    /// Install location relative to the runtime root.
    pub dest: &'static str,
}

pub const CURATED_EXTENSIONS: &[CuratedExtension] = &[
    CuratedExtension {
        name: "nomount",
        source: ExtensionSource::DirectFile {
            url: "https://raw.githubusercontent.com/ThornyFFXI/MiscAshita4/main/addons/NoMount/nomount.lua",
        },
        dest: "addons/nomount/nomount.lua",
    },
    CuratedExtension {
        name: "deeps",
        source: ExtensionSource::ReleaseAsset {
            repo: "relliko/Deeps",
            suffix: "deeps.dll",
        },
        dest: "plugins/deeps.dll",
    },
];

/// Add-ons not permitted on the server; removed from every fresh runtime.
pub const BLOCKED_ADDONS: &[&str] = &[
    "skeletonkey",
    "ahgo",
    "allmaps",
    "instantah",
    "instantchat",
    "paranormal",
];

/// Install each curated extension. A failing extension becomes a warning.
pub async fn install_curated(
    fetcher: &ArtifactFetcher,
    resolver: &VersionResolver,
    root: &Path,
    progress: &ProgressSink,
    cancel: &CancellationToken,
    warnings: &mut Warnings,
) -> LauncherResult<()> {
    for ext in CURATED_EXTENSIONS {
        progress.status(format!("Installing {}...", ext.name));
        match install_one(ext, fetcher, resolver, root, progress, cancel).await {
            Ok(()) => info!("Installed curated extension {}", ext.name),
            Err(LauncherError::Cancelled) => return Err(LauncherError::Cancelled),
            Err(e) => warnings.push("curated-extension", format!("{}: {}", ext.name, e)),
        }
    }
    Ok(())
}

async fn install_one(
    ext: &CuratedExtension,
    fetcher: &ArtifactFetcher,
    resolver: &VersionResolver,
    root: &Path,
    progress: &ProgressSink,
    cancel: &CancellationToken,
) -> LauncherResult<()> {
    let url = match ext.source {
        ExtensionSource::DirectFile { url } => url.to_string(),
        ExtensionSource::ReleaseAsset { repo, suffix } => {
            let release = resolver
                .latest_release(&ArtifactSource::releases(repo))
                .await?;
            let suffix = suffix.to_ascii_lowercase();
            release
                .find_asset(|name| name.to_ascii_lowercase().ends_with(&suffix))
                .map(|a| a.browser_download_url.clone())
                .ok_or_else(|| {
                    LauncherError::AssetNotFound(format!(
                        "{} release {} has no *{} asset",
                        repo, release.tag_name, suffix
                    ))
                })?
        }
    };

    let dest = root.join(ext.dest);
    let req = FetchRequest {
        url: &url,
        dest: &dest,
        min_size: 0,
        label: ext.name,
    };
    fetcher.fetch(req, progress, cancel).await?;
    Ok(())
}

/// Delete every blocked add-on directory that exists under `root/addons`.
pub async fn remove_blocked(root: &Path, warnings: &mut Warnings) {
    for name in BLOCKED_ADDONS {
        let dir = root.join("addons").join(name);
        if !tokio::fs::try_exists(&dir).await.unwrap_or(false) {
            continue;
        }
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => debug!("Removed blocked add-on {}", name),
            Err(e) => warnings.push("blocked-addon", format!("{}: {}", name, e)),
        }
    }
}
