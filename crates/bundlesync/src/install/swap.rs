use super::unzip::unzip_into;
use crate::errors::{BundleError, Result};
use crate::local::write_sidecar;
use crate::progress::{CancelFlag, Progress};
use crate::types::BundleMetadata;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// `<target>.<suffix>` next to `target`.
pub fn sibling_path(target: &Path, suffix: &str) -> PathBuf {
    let mut s = target.as_os_str().to_owned();
    s.push(".");
    s.push(suffix);
    PathBuf::from(s)
}

fn remove_stale(dir: &Path) -> std::io::Result<()> {
    if dir.exists() {
        debug!("removing stale {}", dir.display());
        fs::remove_dir_all(dir)?;
    }
    Ok(())
}

type RenameFn<'a> = &'a dyn Fn(&Path, &Path) -> std::io::Result<()>;

fn swap_error(from: &Path, to: &Path, source: std::io::Error) -> BundleError {
    BundleError::Swap {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    }
}

/// Replace `target` with the archive contents without exposing a partial tree.
///
/// 1. extract into `<target>.new` and write `metadata.json` there,
/// 2. move an existing `target` to `<target>.old`,
/// 3. move `<target>.new` to `target`,
/// 4. delete `<target>.old` (failure only logged).
///
/// Until step 2 the old install is untouched; if step 3 fails the old
/// directory is moved back.
pub fn install_atomic(
    archive: &Path,
    target: &Path,
    metadata: &BundleMetadata,
    progress: &dyn Progress,
    cancel: &CancelFlag,
) -> Result<()> {
    if !metadata.is_valid() {
        return Err(BundleError::MalformedMetadata(
            "refusing to install incomplete metadata".into(),
        ));
    }

    let new_dir = sibling_path(target, "new");
    let old_dir = sibling_path(target, "old");

    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    remove_stale(&new_dir)?;
    remove_stale(&old_dir).map_err(|e| swap_error(target, &old_dir, e))?;

    let staged = unzip_into(archive, &new_dir, progress, cancel)
        .and_then(|_| write_sidecar(&new_dir, metadata))
        .and_then(|_| cancel.check());
    if let Err(e) = staged {
        let _ = fs::remove_dir_all(&new_dir);
        return Err(e);
    }

    progress.set_text("Replacing installed bundle...");
    swap_into_place(&new_dir, target, &old_dir, &|from: &Path, to: &Path| {
        fs::rename(from, to)
    })?;

    info!("installed bundle {} into {}", metadata.version, target.display());
    Ok(())
}

/// Steps 2 to 4. On failure `target` holds whatever it held before and
/// `new_dir` is gone.
fn swap_into_place(new_dir: &Path, target: &Path, old_dir: &Path, rename: RenameFn) -> Result<()> {
    let had_old = target.exists();
    if had_old {
        if let Err(e) = rename(target, old_dir) {
            let _ = fs::remove_dir_all(new_dir);
            return Err(swap_error(target, old_dir, e));
        }
    }

    if let Err(e) = rename(new_dir, target) {
        if had_old {
            if let Err(back) = rename(old_dir, target) {
                error!(
                    "can't restore {} from {}: {back}",
                    target.display(),
                    old_dir.display()
                );
            }
        }
        let _ = fs::remove_dir_all(new_dir);
        return Err(swap_error(new_dir, target, e));
    }

    if had_old {
        if let Err(e) = fs::remove_dir_all(old_dir) {
            warn!("left orphaned {}: {e}", old_dir.display());
        }
    }
    Ok(())
}
