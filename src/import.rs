//! Module import
//!
//! Copies a module folder from anywhere on disk into the modules root.
//! The copy lands enabled; the caller refreshes known modules afterwards.

use anyhow::{anyhow, bail, Context, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::constants::paths::DISABLED_DIR;

/// Module name an import of `source` would produce
pub fn module_name_for(source: &Path) -> Result<String> {
    let name = source
        .file_name()
        .ok_or_else(|| anyhow!("Cannot derive a module name from {}", source.display()))?
        .to_str()
        .ok_or_else(|| anyhow!("Module folder name is not valid UTF-8: {}", source.display()))?;

    if name.is_empty() || name == DISABLED_DIR {
        bail!("'{name}' is not a valid module name");
    }
    Ok(name.to_string())
}

/// Copy `source` into `modules_root` under its own folder name.
/// Refuses names that are already known and never overwrites an existing folder.
pub fn import_module(source: &Path, modules_root: &Path, known: &[String]) -> Result<String> {
    if !source.is_dir() {
        bail!("Source directory not found: {}", source.display());
    }

    let name = module_name_for(source)?;
    if known.contains(&name) {
        bail!("A module named '{name}' already exists");
    }

    fs::create_dir_all(modules_root)
        .with_context(|| format!("Failed to create modules directory {}", modules_root.display()))?;

    let source_abs = source
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", source.display()))?;
    let root_abs = modules_root
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", modules_root.display()))?;
    if root_abs.starts_with(&source_abs) {
        bail!(
            "Cannot import {}: it contains the modules directory {}",
            source.display(),
            modules_root.display()
        );
    }

    let destination = modules_root.join(&name);
    if destination.exists() {
        bail!("A module with this name already exists at {}", destination.display());
    }

    if let Err(e) = copy_tree(&source_abs, &destination) {
        // A partial copy would be picked up as an installed module
        if destination.exists()
            && let Err(cleanup) = fs::remove_dir_all(&destination)
        {
            warn!(path = %destination.display(), error = %cleanup, "Failed to remove partial import");
        }
        return Err(e.context(format!("Failed to import module '{name}' from {}", source.display())));
    }

    info!(module = %name, source = %source.display(), "Imported module");
    Ok(name)
}

fn copy_tree(source: &Path, destination: &Path) -> Result<()> {
    for entry in WalkDir::new(source).follow_links(true) {
        let entry = entry.context("Failed to walk source directory")?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .context("Walked outside of source directory")?;
        let target = destination.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
                .with_context(|| format!("Failed to create {}", target.display()))?;
        } else {
            debug!(from = %entry.path().display(), to = %target.display(), "Copying file");
            fs::copy(entry.path(), &target)
                .with_context(|| format!("Failed to copy {}", entry.path().display()))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn make_module(root: &Path, name: &str) -> std::path::PathBuf {
        let module = root.join(name);
        fs::create_dir_all(module.join("lib").join("native")).unwrap();
        fs::write(module.join("module.dll"), "dll").unwrap();
        fs::write(module.join("lib").join("native").join("helper.so"), "so").unwrap();
        module
    }

    #[test]
    fn test_copies_whole_tree() {
        let src = tempdir().unwrap();
        let dst = tempdir().unwrap();
        let source = make_module(src.path(), "NewTracker");
        let modules_root = dst.path().join("CustomLibs");

        let name = import_module(&source, &modules_root, &[]).unwrap();

        assert_eq!(name, "NewTracker");
        assert_eq!(fs::read_to_string(modules_root.join("NewTracker/module.dll")).unwrap(), "dll");
        assert_eq!(
            fs::read_to_string(modules_root.join("NewTracker/lib/native/helper.so")).unwrap(),
            "so"
        );
        // source left in place
        assert!(source.join("module.dll").exists());
    }

    #[test]
    fn test_refuses_known_module() {
        let src = tempdir().unwrap();
        let dst = tempdir().unwrap();
        let source = make_module(src.path(), "1.htc facial");

        let err = import_module(&source, dst.path(), &["1.htc facial".to_string()]).unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert!(!dst.path().join("1.htc facial").exists());
    }

    #[test]
    fn test_never_overwrites_existing_folder() {
        let src = tempdir().unwrap();
        let dst = tempdir().unwrap();
        let source = make_module(src.path(), "Tracker");
        fs::create_dir_all(dst.path().join("Tracker")).unwrap();
        fs::write(dst.path().join("Tracker").join("keep.txt"), "mine").unwrap();

        assert!(import_module(&source, dst.path(), &[]).is_err());
        assert_eq!(fs::read_to_string(dst.path().join("Tracker/keep.txt")).unwrap(), "mine");
        assert!(!dst.path().join("Tracker/module.dll").exists());
    }

    #[test]
    fn test_missing_source_is_an_error() {
        let dst = tempdir().unwrap();
        assert!(import_module(&dst.path().join("nope"), dst.path(), &[]).is_err());
    }

    #[test]
    fn test_refuses_folder_containing_modules_root() {
        let dir = tempdir().unwrap();
        let data = dir.path().join("data");
        let modules_root = data.join("CustomLibs");
        fs::create_dir_all(&modules_root).unwrap();
        fs::write(data.join("settings.json"), "{}").unwrap();

        let err = import_module(&data, &modules_root, &[]).unwrap_err();
        assert!(err.to_string().contains("contains the modules directory"));
        assert!(!modules_root.join("data").exists());

        // the modules root itself is refused the same way
        assert!(import_module(&modules_root, &modules_root, &[]).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_copy_leaves_nothing_behind() {
        let src = tempdir().unwrap();
        let dst = tempdir().unwrap();
        let source = make_module(src.path(), "Broken");
        // following a dangling link fails part way through the walk
        std::os::unix::fs::symlink(src.path().join("missing"), source.join("zz-dangling")).unwrap();

        assert!(import_module(&source, dst.path(), &[]).is_err());
        assert!(!dst.path().join("Broken").exists());

        // once the source is fixed a retry goes through
        fs::remove_file(source.join("zz-dangling")).unwrap();
        assert_eq!(import_module(&source, dst.path(), &[]).unwrap(), "Broken");
        assert!(dst.path().join("Broken/module.dll").exists());
    }

    #[test]
    fn test_reserved_name_rejected() {
        assert!(module_name_for(Path::new("/tmp/.disable")).is_err());
        assert_eq!(module_name_for(Path::new("/tmp/Tracker")).unwrap(), "Tracker");
    }
}
