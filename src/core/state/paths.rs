use std::path::{Path, PathBuf};

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::loader::LOADER_FILE;

const APP_DIR_NAME: &str = "MistXILauncher";

/// Overrides the base directory, mainly for portable installs and tests.
pub const HOME_ENV: &str = "MISTXI_HOME";

pub const STATE_FILE: &str = "state.json";
pub const SCRIPT_FILE: &str = "mistxi.txt";

/// Every on-disk location the launcher uses.
#[derive(Debug, Clone)]
pub struct LauncherPaths {
    base_dir: PathBuf,
    temp_dir: PathBuf,
}

impl LauncherPaths {
    /// `$MISTXI_HOME`, else `<local app data>/MistXILauncher`.
    pub fn from_env() -> Self {
        let base_dir = std::env::var_os(HOME_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                dirs::data_local_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(APP_DIR_NAME)
            });
        Self::with_base(base_dir)
    }

    pub fn with_base(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            temp_dir: std::env::temp_dir(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_temp_dir(mut self, temp_dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = temp_dir.into();
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    pub fn state_file(&self) -> PathBuf {
        self.base_dir.join(STATE_FILE)
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.base_dir.join("logs")
    }

    /// Ashita root.
    pub fn runtime_dir(&self) -> PathBuf {
        self.base_dir.join("runtime").join("ashita")
    }

    pub fn loader_path(&self) -> PathBuf {
        self.runtime_dir().join("bootloader").join(LOADER_FILE)
    }

    pub fn boot_config_dir(&self) -> PathBuf {
        self.runtime_dir().join("config").join("boot")
    }

    pub fn script_path(&self) -> PathBuf {
        self.runtime_dir().join("scripts").join(SCRIPT_FILE)
    }

    pub fn ensure_base_dirs(&self) -> LauncherResult<()> {
        for dir in [self.base_dir.clone(), self.logs_dir()] {
            std::fs::create_dir_all(&dir).map_err(|source| LauncherError::Io {
                path: dir.clone(),
                source,
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_hangs_off_base_dir() {
        let paths = LauncherPaths::with_base("/data/MistXILauncher");
        assert_eq!(
            paths.loader_path(),
            Path::new("/data/MistXILauncher/runtime/ashita/bootloader/xiloader.exe")
        );
        assert_eq!(
            paths.script_path(),
            Path::new("/data/MistXILauncher/runtime/ashita/scripts/mistxi.txt")
        );
        assert_eq!(
            paths.boot_config_dir(),
            Path::new("/data/MistXILauncher/runtime/ashita/config/boot")
        );
    }
}
