// ============================================================
// Layer 6 - Dataset Workspace
// ============================================================
// The upload and processed directories. Each holds plain CSV
// files; the "current" dataset of a directory is simply the
// most recently modified *.csv in it.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::domain::AgriError;

/// Most recently modified `*.csv` directly inside `dir`.
///
/// A missing directory and an empty one both give `NoDataset`.
pub fn latest_csv(dir: &Path) -> Result<PathBuf, AgriError> {
    let no_dataset = || AgriError::NoDataset(format!("no CSV file in '{}'", dir.display()));
    if !dir.is_dir() {
        return Err(no_dataset());
    }

    let mut latest: Option<(SystemTime, PathBuf)> = None;
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_csv = path.extension().map_or(false, |e| e.eq_ignore_ascii_case("csv"));
        if !is_csv || !path.is_file() {
            continue;
        }
        let modified = fs::metadata(&path)?.modified()?;
        // ties broken by name so the choice is stable
        let newer = match &latest {
            None => true,
            Some((t, p)) => modified > *t || (modified == *t && path > *p),
        };
        if newer {
            latest = Some((modified, path));
        }
    }

    let (_, path) = latest.ok_or_else(no_dataset)?;
    tracing::debug!("Latest dataset in '{}': '{}'", dir.display(), path.display());
    Ok(path)
}

/// Copy a CSV file into `dir`, keeping its file name.
pub fn store_upload(source: &Path, dir: &Path) -> Result<PathBuf, AgriError> {
    let name = source.file_name().ok_or_else(|| {
        AgriError::InvalidInput(format!("'{}' is not a file path", source.display()))
    })?;
    if !source.extension().map_or(false, |e| e.eq_ignore_ascii_case("csv")) {
        return Err(AgriError::InvalidInput(format!(
            "'{}' is not a .csv file",
            source.display()
        )));
    }
    fs::create_dir_all(dir)?;
    let dest = dir.join(name);
    fs::copy(source, &dest)?;
    tracing::info!("Stored upload '{}'", dest.display());
    Ok(dest)
}
