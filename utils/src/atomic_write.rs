//! Atomic file writes via temp file + rename.
//!
//! The export file is either the previous complete artifact or the new one,
//! never a truncated mix. On Windows a rename over an existing file fails, so
//! the old file is moved to `.bak` first and restored if the second rename
//! also fails.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncPolicy {
    /// `fsync` the temp file before renaming it into place.
    #[default]
    SyncAll,
    SkipSync,
}

pub fn atomic_write(path: impl AsRef<Path>, bytes: &[u8]) -> io::Result<()> {
    atomic_write_with_policy(path, bytes, SyncPolicy::default())
}

pub fn atomic_write_with_policy(
    path: impl AsRef<Path>,
    bytes: &[u8],
    sync: SyncPolicy,
) -> io::Result<()> {
    let path = path.as_ref();
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(bytes)?;
    if sync == SyncPolicy::SyncAll {
        tmp.as_file().sync_all()?;
    }

    let Err(err) = tmp.persist(path) else {
        debug!(path = %path.display(), bytes = bytes.len(), "Atomic write complete");
        return Ok(());
    };
    if !path.exists() {
        return Err(err.error);
    }

    let backup = path.with_extension("bak");
    let _ = fs::remove_file(&backup);
    fs::rename(path, &backup)?;
    if let Err(retry) = err.file.persist(path) {
        let _ = fs::rename(&backup, path);
        return Err(retry.error);
    }
    if let Err(e) = fs::remove_file(&backup) {
        warn!(path = %backup.display(), "Failed to remove .bak after atomic write: {e}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::{SyncPolicy, atomic_write, atomic_write_with_policy};

    #[test]
    fn overwrites_existing_and_cleans_backup() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.json");

        atomic_write_with_policy(&path, b"one", SyncPolicy::SkipSync).expect("write one");
        atomic_write_with_policy(&path, b"two", SyncPolicy::SkipSync).expect("write two");

        assert_eq!(fs::read_to_string(&path).expect("read"), "two");
        assert!(!path.with_extension("bak").exists());
    }

    #[test]
    fn leaves_no_temp_files_behind() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.json");

        atomic_write(&path, b"[]").expect("write");

        let entries: Vec<_> = fs::read_dir(dir.path())
            .expect("read_dir")
            .map(|e| e.expect("entry").file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("out.json")]);
    }

    #[test]
    fn missing_parent_directory_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("missing").join("out.json");
        assert!(atomic_write(&path, b"[]").is_err());
    }
}
