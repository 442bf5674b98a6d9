// src/backup.rs
//! Timestamped safety copies of output files and atomic replacement.

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use glob::{glob, Pattern};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{info, warn};

pub const BACKUP_PREFIX: &str = "BACKUP_";

/// `BACKUP_<YYYYmmdd_HHMMSS>_<file name>`
pub fn backup_name(file_name: &str, at: NaiveDateTime) -> String {
    format!("{}{}_{}", BACKUP_PREFIX, at.format("%Y%m%d_%H%M%S"), file_name)
}

/// Copy `path` next to itself under a backup name. Returns `None` when there
/// is nothing to back up.
pub fn backup_existing(path: &Path) -> Result<Option<PathBuf>> {
    if !path.is_file() {
        return Ok(None);
    }
    let file_name = path
        .file_name()
        .map(|f| f.to_string_lossy().to_string())
        .with_context(|| format!("`{}` has no file name", path.display()))?;
    let dir = parent_dir(path);
    let stamp = Local::now().naive_local();

    let mut target = dir.join(backup_name(&file_name, stamp));
    let mut n = 1;
    while target.exists() {
        target = dir.join(backup_name(&format!("{}_{}", n, file_name), stamp));
        n += 1;
    }

    fs::copy(path, &target).with_context(|| {
        format!(
            "backing up `{}` to `{}`",
            path.display(),
            target.display()
        )
    })?;
    info!(backup = %target.display(), "backup created");
    Ok(Some(target))
}

/// Delete every `BACKUP_*` file directly inside `dir`. Failures to delete a
/// single file are logged and skipped. Returns how many were removed.
pub fn purge_backups(dir: &Path) -> Result<usize> {
    let pattern = format!(
        "{}/{}*",
        Pattern::escape(&dir.to_string_lossy()),
        BACKUP_PREFIX
    );
    let mut removed = 0;
    for entry in glob(&pattern).context("invalid glob pattern for purge_backups")? {
        let path = match entry {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "cannot read glob entry");
                continue;
            }
        };
        if !path.is_file() {
            continue;
        }
        match fs::remove_file(&path) {
            Ok(()) => {
                info!(file = %path.display(), "backup deleted");
                removed += 1;
            }
            Err(e) => warn!(file = %path.display(), error = %e, "could not delete backup"),
        }
    }
    Ok(removed)
}

/// Write a new version of `path` through `write`, which receives a temporary
/// path in the same directory. The temporary file is renamed over `path` only
/// after `write` succeeds; with `keep_backup` the previous file is copied first.
pub fn replace_file<F>(path: &Path, keep_backup: bool, write: F) -> Result<Option<PathBuf>>
where
    F: FnOnce(&Path) -> Result<()>,
{
    let dir = parent_dir(path);
    fs::create_dir_all(&dir)
        .with_context(|| format!("creating output directory `{}`", dir.display()))?;

    let file_name = path
        .file_name()
        .map(|f| f.to_string_lossy().to_string())
        .with_context(|| format!("`{}` has no file name", path.display()))?;
    let tmp_path = dir.join(format!(".{}.tmp", file_name));

    if let Err(e) = write(&tmp_path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }

    let backup = if keep_backup {
        backup_existing(path)?
    } else {
        None
    };

    fs::rename(&tmp_path, path).with_context(|| {
        format!(
            "failed to rename `{}` to `{}`",
            tmp_path.display(),
            path.display()
        )
    })?;
    Ok(backup)
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use chrono::NaiveDate;
    use tempfile::tempdir;

    #[test]
    fn backup_names_carry_timestamp() {
        let at = NaiveDate::from_ymd_opt(2026, 1, 5)
            .unwrap()
            .and_hms_opt(9, 7, 3)
            .unwrap();
        assert_eq!(
            backup_name("Grilla de Pax 2030.xlsx", at),
            "BACKUP_20260105_090703_Grilla de Pax 2030.xlsx"
        );
    }

    #[test]
    fn replace_keeps_previous_version() -> Result<()> {
        let dir = tempdir()?;
        let out = dir.path().join("grid.csv");
        fs::write(&out, "old")?;

        let backup = replace_file(&out, true, |tmp| {
            fs::write(tmp, "new")?;
            Ok(())
        })?
        .expect("backup expected");

        assert_eq!(fs::read_to_string(&out)?, "new");
        assert_eq!(fs::read_to_string(&backup)?, "old");
        assert!(backup
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with(BACKUP_PREFIX));
        Ok(())
    }

    #[test]
    fn failed_write_leaves_original_untouched() -> Result<()> {
        let dir = tempdir()?;
        let out = dir.path().join("grid.csv");
        fs::write(&out, "old")?;

        let res = replace_file(&out, true, |tmp| {
            fs::write(tmp, "half")?;
            Err(anyhow!("boom"))
        });
        assert!(res.is_err());
        assert_eq!(fs::read_to_string(&out)?, "old");
        assert_eq!(fs::read_dir(dir.path())?.count(), 1);
        Ok(())
    }

    #[test]
    fn purge_only_touches_backups() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("BACKUP_20260101_000000_a.xlsx"), "")?;
        fs::write(dir.path().join("BACKUP_LIMPIEZA_20260101_000000_a.xlsx"), "")?;
        fs::write(dir.path().join("a.xlsx"), "")?;

        assert_eq!(purge_backups(dir.path())?, 2);
        assert!(dir.path().join("a.xlsx").exists());
        assert_eq!(purge_backups(dir.path())?, 0);
        Ok(())
    }
}
