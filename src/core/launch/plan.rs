// ─── Launch plan ───
// What the process launcher needs to start Ashita. Spawning and elevation
// happen outside this crate.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::core::runtime::ENTRY_POINT;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaunchPlan {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    /// Ashita injects into the client; the OS may refuse elevation.
    pub requires_elevation: bool,
}

impl LaunchPlan {
    /// `Ashita-cli.exe "<boot config name>"` run from the runtime root.
    pub fn for_runtime(runtime_root: &Path, boot_config_name: &str) -> Self {
        Self {
            program: runtime_root.join(ENTRY_POINT),
            args: vec![format!("\"{}\"", boot_config_name)],
            working_dir: runtime_root.to_path_buf(),
            requires_elevation: true,
        }
    }

    /// Copy/paste friendly rendering for logs.
    pub fn display_line(&self) -> String {
        let mut line = format!("\"{}\"", self.program.display());
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_boot_config_argument() {
        let plan = LaunchPlan::for_runtime(Path::new("/base/runtime/ashita"), "mistxi.session.ini");
        assert_eq!(plan.program, Path::new("/base/runtime/ashita/Ashita-cli.exe"));
        assert_eq!(plan.args, vec!["\"mistxi.session.ini\""]);
        assert_eq!(plan.working_dir, Path::new("/base/runtime/ashita"));
        assert!(plan.requires_elevation);
        assert_eq!(
            plan.display_line(),
            "\"/base/runtime/ashita/Ashita-cli.exe\" \"mistxi.session.ini\""
        );
    }
}
