use std::path::PathBuf;
use thiserror::Error;

/// Central error type for the provisioning backend.
/// Every module returns `Result<T, LauncherError>`.
#[derive(Debug, Error)]
pub enum LauncherError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Download failed for {url}: HTTP {status}")]
    DownloadFailed { url: String, status: u16 },

    // ── Metadata ────────────────────────────────────────
    #[error("Unexpected response from {url}: {reason}")]
    Parse { url: String, reason: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── Integrity ───────────────────────────────────────
    #[error("Downloaded file {path:?} is only {size} bytes (expected at least {minimum})")]
    CorruptDownload {
        path: PathBuf,
        size: u64,
        minimum: u64,
    },

    #[error("No matching release asset: {0}")]
    AssetNotFound(String),

    // ── Install ─────────────────────────────────────────
    #[error("Install failed: {0}")]
    Install(String),

    #[error("Zip extraction error: {0}")]
    Zip(#[from] zip::result::ZipError),

    // ── Profiles ────────────────────────────────────────
    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    #[error("A profile named '{0}' already exists")]
    ProfileAlreadyExists(String),

    #[error("Profile name cannot be empty")]
    EmptyProfileName,

    #[error("Cannot delete the last profile")]
    LastProfile,

    // ── Control flow ────────────────────────────────────
    #[error("Operation cancelled")]
    Cancelled,

    #[error("A provisioning attempt is already running")]
    Busy,

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type LauncherResult<T> = Result<T, LauncherError>;

/// Coarse classification used for user-facing messaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Parse,
    CorruptDownload,
    AssetNotFound,
    Install,
    Profile,
    Cancelled,
    Busy,
    Other,
}

impl LauncherError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LauncherError::Http(_) | LauncherError::DownloadFailed { .. } => ErrorKind::Network,
            LauncherError::Parse { .. } | LauncherError::Json(_) => ErrorKind::Parse,
            LauncherError::CorruptDownload { .. } => ErrorKind::CorruptDownload,
            LauncherError::AssetNotFound(_) => ErrorKind::AssetNotFound,
            LauncherError::Install(_) | LauncherError::Zip(_) | LauncherError::Io { .. } => {
                ErrorKind::Install
            }
            LauncherError::ProfileNotFound(_)
            | LauncherError::ProfileAlreadyExists(_)
            | LauncherError::EmptyProfileName
            | LauncherError::LastProfile => ErrorKind::Profile,
            LauncherError::Cancelled => ErrorKind::Cancelled,
            LauncherError::Busy => ErrorKind::Busy,
            LauncherError::Other(_) => ErrorKind::Other,
        }
    }

    /// User-initiated cancellation; callers should not show error UI for it.
    pub fn is_cancelled(&self) -> bool {
        self.kind() == ErrorKind::Cancelled
    }

    /// Short, actionable status line for the outer shell.
    ///
    /// Corrupt downloads are reported like network failures: to the user both
    /// mean "the download did not arrive intact, try again".
    pub fn user_message(&self) -> String {
        match self.kind() {
            ErrorKind::Network | ErrorKind::CorruptDownload => format!(
                "Network error - could not download required files. Check your internet connection and try again. ({})",
                self
            ),
            ErrorKind::Parse => format!(
                "Could not read version information from the update server. Try again later. ({})",
                self
            ),
            ErrorKind::AssetNotFound => format!(
                "The selected XiLoader release has no usable download. Pick another version in settings. ({})",
                self
            ),
            ErrorKind::Install => format!(
                "Installing Ashita failed. Check free disk space and that antivirus is not blocking the runtime folder. ({})",
                self
            ),
            ErrorKind::Profile => self.to_string(),
            ErrorKind::Cancelled => "Cancelled.".to_string(),
            ErrorKind::Busy => "A launch is already in progress.".to_string(),
            ErrorKind::Other => format!("Error - {}", self),
        }
    }
}

impl From<std::io::Error> for LauncherError {
    fn from(source: std::io::Error) -> Self {
        LauncherError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}
