use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::core::profile::GameProfile;

/// Lines inspected for a description comment.
const DESCRIPTION_SCAN_LINES: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtensionKind {
    Addon,
    Plugin,
}

/// An add-on or plugin found in the runtime tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtensionInfo {
    pub name: String,
    pub path: PathBuf,
    pub kind: ExtensionKind,
    pub description: Option<String>,
    pub enabled: bool,
}

/// `addons/<name>/<name>.lua` entries, sorted by name.
pub fn scan_addons(runtime_root: &Path, profile: Option<&GameProfile>) -> Vec<ExtensionInfo> {
    let Ok(entries) = std::fs::read_dir(runtime_root.join("addons")) else {
        return Vec::new();
    };

    let mut found: Vec<ExtensionInfo> = entries
        .filter_map(Result::ok)
        .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .filter_map(|e| {
            let name = e.file_name().to_string_lossy().to_string();
            let main = e.path().join(format!("{}.lua", name));
            main.is_file().then(|| ExtensionInfo {
                enabled: profile
                    .map(|p| p.enabled_addons.iter().any(|a| a == &name))
                    .unwrap_or(false),
                description: read_description(&main),
                name,
                path: main,
                kind: ExtensionKind::Addon,
            })
        })
        .collect();
    found.sort_by(|a, b| a.name.cmp(&b.name));
    found
}

/// `plugins/*.dll` entries named by file stem, sorted by name.
pub fn scan_plugins(runtime_root: &Path, profile: Option<&GameProfile>) -> Vec<ExtensionInfo> {
    let Ok(entries) = std::fs::read_dir(runtime_root.join("plugins")) else {
        return Vec::new();
    };

    let mut found: Vec<ExtensionInfo> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .map(|ext| ext.eq_ignore_ascii_case("dll"))
                    .unwrap_or(false)
        })
        .filter_map(|path| {
            let name = path.file_stem()?.to_string_lossy().to_string();
            Some(ExtensionInfo {
                enabled: profile
                    .map(|p| p.enabled_plugins.iter().any(|x| x == &name))
                    .unwrap_or(false),
                description: None,
                name,
                path,
                kind: ExtensionKind::Plugin,
            })
        })
        .collect();
    found.sort_by(|a, b| a.name.cmp(&b.name));
    found
}

/// First meaningful `--` comment near the top of a Lua file.
fn read_description(lua: &Path) -> Option<String> {
    let raw = std::fs::read(lua).ok()?;
    let text = String::from_utf8_lossy(&raw);
    text.lines()
        .take(DESCRIPTION_SCAN_LINES)
        .map(str::trim)
        .filter(|l| l.starts_with("--") && l.len() > 3)
        .map(|l| l[2..].trim())
        .find(|d| d.chars().count() > 10 && !d.starts_with("[[") && !d.starts_with("Copyright"))
        .map(str::to_string)
}
