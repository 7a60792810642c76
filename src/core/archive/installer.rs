// ─── Archive installer ───
// Extracts a downloaded tree and swaps it into place while carrying user
// directories across the rebuild.

use std::path::{Component, Path, PathBuf};

use tracing::{debug, info};

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::outcome::{Outcome, Warnings};

/// Everything needed to rebuild one target directory from an archive.
#[derive(Debug, Clone)]
pub struct InstallPlan {
    pub archive: PathBuf,
    pub target: PathBuf,
    /// Relative paths under `target` that survive the rebuild.
    pub preserve: Vec<PathBuf>,
    /// File name that marks the archive's real root, e.g. `Ashita-cli.exe`.
    pub entry_point: String,
    /// Caller-owned scratch directory. Not removed here.
    pub scratch: PathBuf,
}

/// Run [`install_tree_blocking`] on the blocking pool. Not interruptible once started.
pub async fn install_tree(plan: InstallPlan) -> LauncherResult<Outcome<()>> {
    tokio::task::spawn_blocking(move || install_tree_blocking(&plan))
        .await
        .map_err(|e| LauncherError::Other(format!("Task join error: {e}")))?
}

pub fn install_tree_blocking(plan: &InstallPlan) -> LauncherResult<Outcome<()>> {
    let mut warnings = Warnings::new();
    let extract_root = plan.scratch.join("extract");
    let preserve_root = plan.scratch.join("preserve");

    extract_zip(&plan.archive, &extract_root)?;
    let source_root = effective_root(&extract_root, &plan.entry_point);
    debug!("Effective archive root: {:?}", source_root);

    // ── Set user directories aside ──
    let mut saved = Vec::new();
    for rel in &plan.preserve {
        let current = plan.target.join(rel);
        if current.is_dir() {
            let aside = preserve_root.join(rel);
            copy_dir_recursive(&current, &aside)?;
            saved.push(rel.clone());
        }
    }
    if !saved.is_empty() {
        info!("Preserved {} user directories", saved.len());
    }

    // ── Replace the tree ──
    if plan.target.exists() {
        if let Err(e) = std::fs::remove_dir_all(&plan.target) {
            warnings.push(
                "remove-old-runtime",
                format!("could not fully delete {:?}: {}", plan.target, e),
            );
        }
    }
    std::fs::create_dir_all(&plan.target).map_err(|source| LauncherError::Io {
        path: plan.target.clone(),
        source,
    })?;
    copy_dir_recursive(&source_root, &plan.target)?;

    // ── Put user directories back ──
    for rel in &saved {
        copy_dir_recursive(&preserve_root.join(rel), &plan.target.join(rel))?;
    }

    if !plan.target.join(&plan.entry_point).is_file() {
        return Err(LauncherError::Install(format!(
            "{} missing from {:?} after install",
            plan.entry_point, plan.target
        )));
    }

    Ok(warnings.finish(()))
}

/// Extract every entry under `root`, rejecting paths that escape it.
pub fn extract_zip(zip_path: &Path, root: &Path) -> LauncherResult<()> {
    let zip_file = std::fs::File::open(zip_path).map_err(|source| LauncherError::Io {
        path: zip_path.to_path_buf(),
        source,
    })?;
    let mut archive = zip::ZipArchive::new(zip_file)?;

    std::fs::create_dir_all(root).map_err(|source| LauncherError::Io {
        path: root.to_path_buf(),
        source,
    })?;

    for index in 0..archive.len() {
        let mut zipped = archive.by_index(index)?;
        let enclosed = zipped.enclosed_name().ok_or_else(|| {
            LauncherError::Install(format!("unsafe zip entry path: {}", zipped.name()))
        })?;

        let rel_path: PathBuf = enclosed
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part),
                _ => None,
            })
            .collect();
        if rel_path.as_os_str().is_empty() {
            continue;
        }

        let out_path = root.join(rel_path);
        if zipped.is_dir() {
            std::fs::create_dir_all(&out_path).map_err(|source| LauncherError::Io {
                path: out_path,
                source,
            })?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| LauncherError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let mut out = std::fs::File::create(&out_path).map_err(|source| LauncherError::Io {
            path: out_path.clone(),
            source,
        })?;
        std::io::copy(&mut zipped, &mut out).map_err(|source| LauncherError::Io {
            path: out_path,
            source,
        })?;
    }

    Ok(())
}

/// Directory holding `entry_point`; else the lone top-level directory; else `root`.
fn effective_root(root: &Path, entry_point: &str) -> PathBuf {
    if let Some(found) = find_file_recursive(root, entry_point) {
        if let Some(parent) = found.parent() {
            return parent.to_path_buf();
        }
    }

    let entries: Vec<_> = match std::fs::read_dir(root) {
        Ok(entries) => entries.filter_map(Result::ok).collect(),
        Err(_) => return root.to_path_buf(),
    };
    if entries.len() == 1 && entries[0].path().is_dir() {
        return entries[0].path();
    }
    root.to_path_buf()
}

fn find_file_recursive(root: &Path, name: &str) -> Option<PathBuf> {
    let entries = std::fs::read_dir(root).ok()?;
    let mut subdirs = Vec::new();
    for entry in entries.filter_map(Result::ok) {
        let path = entry.path();
        let file_type = entry.file_type().ok()?;

        if file_type.is_file() {
            let matches = path
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.eq_ignore_ascii_case(name))
                .unwrap_or(false);
            if matches {
                return Some(path);
            }
        } else if file_type.is_dir() {
            subdirs.push(path);
        }
    }
    // Shallowest match wins.
    subdirs.sort();
    subdirs
        .into_iter()
        .find_map(|dir| find_file_recursive(&dir, name))
}

/// Copy `source` into `destination`, overwriting files that already exist.
pub fn copy_dir_recursive(source: &Path, destination: &Path) -> LauncherResult<()> {
    std::fs::create_dir_all(destination).map_err(|source_err| LauncherError::Io {
        path: destination.to_path_buf(),
        source: source_err,
    })?;

    for entry in std::fs::read_dir(source).map_err(|source_err| LauncherError::Io {
        path: source.to_path_buf(),
        source: source_err,
    })? {
        let entry = entry.map_err(|source_err| LauncherError::Io {
            path: source.to_path_buf(),
            source: source_err,
        })?;
        let src_path = entry.path();
        let dst_path = destination.join(entry.file_name());
        let file_type = entry.file_type().map_err(|source_err| LauncherError::Io {
            path: src_path.clone(),
            source: source_err,
        })?;

        if file_type.is_dir() {
            copy_dir_recursive(&src_path, &dst_path)?;
        } else if file_type.is_file() {
            std::fs::copy(&src_path, &dst_path).map_err(|source_err| LauncherError::Io {
                path: dst_path,
                source: source_err,
            })?;
        }
    }

    Ok(())
}


#[cfg(test)]
mod tests {
    use super::testing::build_zip;
    use super::*;

    fn plan(dir: &Path, archive: PathBuf) -> InstallPlan {
        InstallPlan {
            archive,
            target: dir.join("runtime"),
            preserve: vec![PathBuf::from("addons"), PathBuf::from("config/boot")],
            entry_point: "Ashita-cli.exe".into(),
            scratch: dir.join("scratch"),
        }
    }

    #[test]
    fn entry_point_directory_becomes_root() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("a.zip");
        build_zip(
            &archive,
            &[
                ("Ashita-v4beta-main/", b""),
                ("Ashita-v4beta-main/Ashita-cli.exe", b"exe"),
                ("Ashita-v4beta-main/addons/fps/fps.lua", b"-- fps"),
            ],
        );
        let plan = plan(dir.path(), archive);

        install_tree_blocking(&plan).unwrap();

        assert!(plan.target.join("Ashita-cli.exe").is_file());
        assert!(plan.target.join("addons/fps/fps.lua").is_file());
        assert!(!plan.target.join("Ashita-v4beta-main").exists());
    }

    #[test]
    fn preserved_directories_survive_and_win() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("a.zip");
        build_zip(
            &archive,
            &[
                ("root/Ashita-cli.exe", b"new"),
                ("root/addons/fps/fps.lua", b"-- shipped"),
                ("root/docs/readme.txt", b"docs"),
            ],
        );
        let plan = plan(dir.path(), archive);

        let user_addon = plan.target.join("addons/myaddon/myaddon.lua");
        std::fs::create_dir_all(user_addon.parent().unwrap()).unwrap();
        std::fs::write(&user_addon, b"-- mine").unwrap();
        std::fs::create_dir_all(plan.target.join("addons/fps")).unwrap();
        std::fs::write(plan.target.join("addons/fps/fps.lua"), b"-- edited").unwrap();
        std::fs::create_dir_all(plan.target.join("config/boot")).unwrap();
        std::fs::write(plan.target.join("config/boot/mistxi.ini"), b"[x]").unwrap();
        std::fs::write(plan.target.join("stale.dll"), b"old").unwrap();

        let outcome = install_tree_blocking(&plan).unwrap();

        assert!(!outcome.has_warnings());
        assert_eq!(std::fs::read(&user_addon).unwrap(), b"-- mine");
        assert_eq!(
            std::fs::read(plan.target.join("addons/fps/fps.lua")).unwrap(),
            b"-- edited"
        );
        assert!(plan.target.join("config/boot/mistxi.ini").is_file());
        assert!(plan.target.join("docs/readme.txt").is_file());
        assert!(!plan.target.join("stale.dll").exists());
    }

    #[test]
    fn missing_entry_point_is_install_error() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("a.zip");
        build_zip(&archive, &[("root/readme.txt", b"nothing here")]);
        let plan = plan(dir.path(), archive);

        let err = install_tree_blocking(&plan).unwrap_err();
        assert!(matches!(err, LauncherError::Install(_)));
    }

    #[test]
    fn lone_top_level_directory_is_unwrapped() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("x");
        std::fs::create_dir_all(root.join("only/inner")).unwrap();
        assert_eq!(effective_root(&root, "Ashita-cli.exe"), root.join("only"));
    }
}
