use crate::errors::{BundleError, Result};
use crate::progress::{CancelFlag, Progress};
use std::fs;
use std::path::Path;
use tracing::debug;
use zip::ZipArchive;

/// Extract `zip_path` into `dest`. A lone top-level directory is unwrapped
/// so its contents land directly in `dest`.
pub fn unzip_into(
    zip_path: &Path,
    dest: &Path,
    progress: &dyn Progress,
    cancel: &CancelFlag,
) -> Result<()> {
    debug!("unpacking {} -> {}", zip_path.display(), dest.display());
    let f = fs::File::open(zip_path)?;
    let mut archive = ZipArchive::new(f)?;
    fs::create_dir_all(dest)?;

    for i in 0..archive.len() {
        cancel.check()?;
        let mut file = archive.by_index(i)?;
        let rel = file
            .enclosed_name()
            .map(Path::to_path_buf)
            .ok_or_else(|| BundleError::Extraction(format!("unsafe entry path {}", file.name())))?;
        let outpath = dest.join(&rel);

        if file.is_dir() {
            fs::create_dir_all(&outpath)?;
            continue;
        }

        progress.set_text(&format!("Extracting {}...", rel.display()));
        if let Some(parent) = outpath.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = fs::File::create(&outpath)?;
        std::io::copy(&mut file, &mut out)?;

        #[cfg(unix)]
        if let Some(mode) = file.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&outpath, fs::Permissions::from_mode(mode & 0o7777))?;
        }
    }

    unwrap_single_dir(dest)
}

/// If `dir` holds exactly one entry and it is a directory, hoist its contents.
fn unwrap_single_dir(dir: &Path) -> Result<()> {
    let entries = fs::read_dir(dir)?.collect::<std::io::Result<Vec<_>>>()?;
    if entries.len() != 1 || !entries[0].file_type()?.is_dir() {
        return Ok(());
    }

    // Park the lone dir under a fresh unique name so none of its children
    // can clash with it while they move up.
    let holder = tempfile::Builder::new().prefix(".unwrap").tempdir_in(dir)?;
    let staged = holder.path().join(entries[0].file_name());
    fs::rename(entries[0].path(), &staged)?;
    for child in fs::read_dir(&staged)? {
        let child = child?;
        fs::rename(child.path(), dir.join(child.file_name()))?;
    }
    holder.close()?;
    Ok(())
}
