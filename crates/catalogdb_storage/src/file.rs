//! Locked access and atomic rewrites for a single text file.

use crate::config::AccessConfig;
use crate::error::{StorageError, StorageResult};
use crate::lock::LockRegistry;
use parking_lot::{Mutex, MutexGuard};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

/// Suffix of the crash-recovery copy made before every rewrite.
pub const BACKUP_SUFFIX: &str = ".bak";
/// Suffix of the staging file a rewrite is written to.
pub const TEMP_SUFFIX: &str = ".tmp";
/// Marker between the file name and the tag of a transaction snapshot,
/// as in `products.csv.backup_<tag>`.
pub const SNAPSHOT_MARKER: &str = ".backup_";

/// Serializes access to one text file and rewrites it atomically.
///
/// # Reads
///
/// Reads wait at most [`AccessConfig::read_lock_timeout`] for the lock. If
/// the wait expires the file is read anyway, without the lock. A reader can
/// therefore race a writer, but a writer only ever swaps in a complete file
/// with a rename, so the unguarded read sees either the old or the new
/// content. Failed reads are retried [`AccessConfig::read_retries`] times.
///
/// # Writes
///
/// Writes always wait for the lock. A rewrite:
///
/// 1. creates the parent directory if needed,
/// 2. copies the current file to `<path>.bak`,
/// 3. writes every line to `<path>.tmp` and syncs it,
/// 4. renames `<path>.tmp` over `<path>`,
/// 5. removes `<path>.bak`.
///
/// If any step fails the temp file is removed and, if the live file is
/// gone, the backup is moved back before the error is returned.
///
/// # Read-modify-write
///
/// [`lock`](Self::lock) returns a [`FileGuard`] that reads and writes under
/// one acquisition. Anything that reads the file, changes it in memory and
/// writes it back must go through a single guard.
///
/// # Example
///
/// ```no_run
/// use catalogdb_storage::{FileAccessManager, LockRegistry};
/// use std::path::Path;
///
/// let registry = LockRegistry::shared();
/// let files = FileAccessManager::new(Path::new("products.csv"), &registry);
///
/// let guard = files.lock();
/// let mut lines = guard.read_all_lines().unwrap();
/// lines.push("3,Lamp,A desk lamp,12.50,4,lamp.png,false".to_string());
/// guard.write_all_lines(&lines).unwrap();
/// ```
#[derive(Debug)]
pub struct FileAccessManager {
    path: PathBuf,
    temp_path: PathBuf,
    backup_path: PathBuf,
    lock: Arc<Mutex<()>>,
    config: AccessConfig,
}

impl FileAccessManager {
    /// Creates a manager for `path` with the default timing policy.
    pub fn new(path: &Path, registry: &LockRegistry) -> Self {
        Self::with_config(path, registry, AccessConfig::default())
    }

    /// Creates a manager for `path` with an explicit timing policy.
    pub fn with_config(path: &Path, registry: &LockRegistry, config: AccessConfig) -> Self {
        Self {
            path: path.to_path_buf(),
            temp_path: sibling(path, TEMP_SUFFIX),
            backup_path: sibling(path, BACKUP_SUFFIX),
            lock: registry.lock_for(path),
            config,
        }
    }

    /// Returns the path of the managed file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the path of the staging file used by rewrites.
    #[must_use]
    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    /// Returns the path of the crash-recovery copy used by rewrites.
    #[must_use]
    pub fn backup_path(&self) -> &Path {
        &self.backup_path
    }

    /// Returns the timing policy.
    #[must_use]
    pub fn config(&self) -> &AccessConfig {
        &self.config
    }

    /// Returns true if the managed file exists.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Reads the whole file as raw bytes.
    ///
    /// A missing file reads as empty. The bytes are not required to be
    /// UTF-8; callers that tolerate damaged records decode them piecewise.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::ReadFailed`] once every retry has failed.
    pub fn read_bytes(&self) -> StorageResult<Vec<u8>> {
        match self.lock.try_lock_for(self.config.read_lock_timeout) {
            Some(_guard) => self.read_bytes_unguarded(),
            None => {
                warn!(
                    path = %self.path.display(),
                    timeout_ms = self.config.read_lock_timeout.as_millis() as u64,
                    "read lock wait timed out, reading without the lock"
                );
                self.read_bytes_unguarded()
            }
        }
    }

    /// Reads the whole file as text.
    ///
    /// A missing file reads as an empty string.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::ReadFailed`] once every retry has failed, or
    /// [`StorageError::NotText`] if the file is not valid UTF-8.
    pub fn read_text(&self) -> StorageResult<String> {
        self.to_text(self.read_bytes()?)
    }

    /// Reads every non-blank line of the file.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::ReadFailed`] once every retry has failed.
    pub fn read_all_lines(&self) -> StorageResult<Vec<String>> {
        self.read_text().map(|text| non_blank_lines(&text))
    }

    /// Atomically replaces the file content with `lines`, one per line.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::WriteFailed`] if the rewrite failed. The file
    /// then still holds its previous content.
    pub fn write_all_lines<S: AsRef<[u8]>>(&self, lines: &[S]) -> StorageResult<()> {
        let _guard = self.lock.lock();
        self.write_lines_unguarded(lines)
    }

    /// Acquires the file lock, waiting as long as needed.
    pub fn lock(&self) -> FileGuard<'_> {
        FileGuard {
            files: self,
            _guard: self.lock.lock(),
        }
    }

    /// Acquires the file lock, giving up after `timeout`.
    pub fn try_lock_for(&self, timeout: Duration) -> Option<FileGuard<'_>> {
        self.lock.try_lock_for(timeout).map(|guard| FileGuard {
            files: self,
            _guard: guard,
        })
    }

    /// Repairs the leftovers of a rewrite interrupted by a crash.
    ///
    /// If the file is missing but `<path>.bak` exists, the backup is moved
    /// back into place. A stale `<path>.tmp` is always removed; it never
    /// holds committed data because the rename is the commit point.
    ///
    /// Snapshots left by transactions that never finished are reported with
    /// a warning and kept; the live file never depends on them because a
    /// commit is a single rename.
    ///
    /// Returns true if the file was restored from its backup.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::RestoreFailed`] if the backup could not be
    /// moved back.
    pub fn recover(&self) -> StorageResult<bool> {
        let _guard = self.lock.lock();

        if self.temp_path.exists() {
            warn!(path = %self.temp_path.display(), "removing stale staging file");
            fs::remove_file(&self.temp_path)?;
        }

        let restored = if !self.path.exists() && self.backup_path.exists() {
            fs::rename(&self.backup_path, &self.path).map_err(|source| {
                StorageError::RestoreFailed {
                    path: self.path.clone(),
                    source,
                }
            })?;
            warn!(path = %self.path.display(), "restored file from interrupted rewrite");
            true
        } else {
            if self.backup_path.exists() {
                // The rename completed; only the cleanup was lost.
                fs::remove_file(&self.backup_path)?;
            }
            false
        };

        for snapshot in self.leftover_snapshots()? {
            warn!(
                path = %self.path.display(),
                snapshot = %snapshot.display(),
                "found snapshot of an unfinished transaction"
            );
        }

        Ok(restored)
    }

    /// Returns the path of a transaction snapshot tagged `tag`.
    #[must_use]
    pub fn snapshot_path(&self, tag: &str) -> PathBuf {
        sibling(&self.path, &format!("{SNAPSHOT_MARKER}{tag}"))
    }

    /// Lists transaction snapshots of this file that are still on disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be listed.
    pub fn leftover_snapshots(&self) -> StorageResult<Vec<PathBuf>> {
        let Some(name) = self.path.file_name() else {
            return Ok(Vec::new());
        };
        let mut prefix = name.to_owned();
        prefix.push(SNAPSHOT_MARKER);
        let prefix = prefix.to_string_lossy().into_owned();

        let dir = self.parent_dir().unwrap_or_else(|| Path::new("."));
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut snapshots = Vec::new();
        for entry in entries {
            let entry = entry?;
            if entry.file_name().to_string_lossy().starts_with(&prefix) {
                snapshots.push(entry.path());
            }
        }
        snapshots.sort();
        Ok(snapshots)
    }

    fn to_text(&self, bytes: Vec<u8>) -> StorageResult<String> {
        String::from_utf8(bytes).map_err(|source| StorageError::NotText {
            path: self.path.clone(),
            source,
        })
    }

    fn read_bytes_unguarded(&self) -> StorageResult<Vec<u8>> {
        let attempts = self.config.read_retries + 1;
        let mut attempt = 0;

        loop {
            attempt += 1;
            match fs::read(&self.path) {
                Ok(bytes) => return Ok(bytes),
                Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
                Err(err) if attempt < attempts && is_transient(&err) => {
                    warn!(
                        path = %self.path.display(),
                        attempt,
                        error = %err,
                        "read failed, retrying"
                    );
                    thread::sleep(self.config.retry_delay * attempt);
                }
                Err(source) => {
                    return Err(StorageError::ReadFailed {
                        path: self.path.clone(),
                        attempts: attempt,
                        source,
                    })
                }
            }
        }
    }

    fn write_lines_unguarded<S: AsRef<[u8]>>(&self, lines: &[S]) -> StorageResult<()> {
        let started = Instant::now();

        match self.replace_contents(lines) {
            Ok(()) => {
                debug!(
                    path = %self.path.display(),
                    lines = lines.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "file rewritten"
                );
                Ok(())
            }
            Err(source) => {
                self.clean_up_failed_write();
                warn!(path = %self.path.display(), error = %source, "rewrite failed");
                Err(StorageError::WriteFailed {
                    path: self.path.clone(),
                    source,
                })
            }
        }
    }

    fn replace_contents<S: AsRef<[u8]>>(&self, lines: &[S]) -> io::Result<()> {
        if let Some(parent) = self.parent_dir() {
            fs::create_dir_all(parent)?;
        }

        if self.temp_path.exists() {
            fs::remove_file(&self.temp_path)?;
        }

        let had_original = self.path.exists();
        if had_original {
            fs::copy(&self.path, &self.backup_path)?;
        }

        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.temp_path)?;
        let mut writer = BufWriter::new(file);
        for line in lines {
            writer.write_all(line.as_ref())?;
            writer.write_all(b"\n")?;
        }
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        drop(file);

        fs::rename(&self.temp_path, &self.path)?;
        self.sync_parent_dir()?;

        if had_original {
            if let Err(err) = fs::remove_file(&self.backup_path) {
                // The new content is in place; a leftover backup is removed by `recover`.
                warn!(path = %self.backup_path.display(), error = %err, "failed to remove backup");
            }
        }

        Ok(())
    }

    fn clean_up_failed_write(&self) {
        if self.temp_path.is_file() {
            if let Err(err) = fs::remove_file(&self.temp_path) {
                warn!(path = %self.temp_path.display(), error = %err, "failed to remove staging file");
            }
        }

        if !self.backup_path.exists() {
            return;
        }

        if self.path.exists() {
            if let Err(err) = fs::remove_file(&self.backup_path) {
                warn!(path = %self.backup_path.display(), error = %err, "failed to remove backup");
            }
        } else if let Err(err) = fs::rename(&self.backup_path, &self.path) {
            error!(
                path = %self.path.display(),
                error = %err,
                "failed to restore file after aborted rewrite"
            );
        }
    }

    fn copy_to_unguarded(&self, dest: &Path) -> StorageResult<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        fs::copy(&self.path, dest)?;
        Ok(true)
    }

    fn restore_from_unguarded(&self, source_path: &Path) -> StorageResult<()> {
        let restore = || -> io::Result<()> {
            if self.temp_path.exists() {
                fs::remove_file(&self.temp_path)?;
            }
            fs::copy(source_path, &self.temp_path)?;
            File::open(&self.temp_path)?.sync_all()?;
            fs::rename(&self.temp_path, &self.path)?;
            self.sync_parent_dir()
        };

        restore().map_err(|source| {
            if self.temp_path.is_file() {
                let _ = fs::remove_file(&self.temp_path);
            }
            StorageError::RestoreFailed {
                path: self.path.clone(),
                source,
            }
        })
    }

    fn remove_unguarded(&self) -> StorageResult<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    fn parent_dir(&self) -> Option<&Path> {
        self.path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
    }

    /// Syncs the parent directory so a completed rename survives a crash.
    #[cfg(unix)]
    fn sync_parent_dir(&self) -> io::Result<()> {
        let dir = self.parent_dir().unwrap_or_else(|| Path::new("."));
        File::open(dir)?.sync_all()
    }

    #[cfg(not(unix))]
    fn sync_parent_dir(&self) -> io::Result<()> {
        // NTFS journals metadata; directories cannot be fsynced on Windows.
        Ok(())
    }
}

/// Exclusive access to a file for the lifetime of the guard.
///
/// Obtained from [`FileAccessManager::lock`]. Every method runs under the
/// one acquisition the guard holds; dropping the guard releases it.
#[derive(Debug)]
pub struct FileGuard<'a> {
    files: &'a FileAccessManager,
    _guard: MutexGuard<'a, ()>,
}

impl FileGuard<'_> {
    /// Returns the path of the locked file.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.files.path()
    }

    /// Returns true if the locked file exists.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.files.exists()
    }

    /// Reads the whole file as raw bytes. A missing file reads as empty.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::ReadFailed`] once every retry has failed.
    pub fn read_bytes(&self) -> StorageResult<Vec<u8>> {
        self.files.read_bytes_unguarded()
    }

    /// Reads the whole file as text. A missing file reads as empty.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::ReadFailed`] once every retry has failed, or
    /// [`StorageError::NotText`] if the file is not valid UTF-8.
    pub fn read_text(&self) -> StorageResult<String> {
        self.files.to_text(self.read_bytes()?)
    }

    /// Reads every non-blank line of the file.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::ReadFailed`] once every retry has failed.
    pub fn read_all_lines(&self) -> StorageResult<Vec<String>> {
        self.read_text().map(|text| non_blank_lines(&text))
    }

    /// Atomically replaces the file content with `lines`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::WriteFailed`] if the rewrite failed.
    pub fn write_all_lines<S: AsRef<[u8]>>(&self, lines: &[S]) -> StorageResult<()> {
        self.files.write_lines_unguarded(lines)
    }

    /// Copies the file to `dest`. Returns false if there was no file.
    ///
    /// # Errors
    ///
    /// Returns an error if the copy failed.
    pub fn copy_to(&self, dest: &Path) -> StorageResult<bool> {
        self.files.copy_to_unguarded(dest)
    }

    /// Atomically replaces the file with a copy of `source`.
    ///
    /// `source` itself is left in place.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::RestoreFailed`] if the copy or the rename
    /// failed. The live file is untouched in that case.
    pub fn restore_from(&self, source: &Path) -> StorageResult<()> {
        self.files.restore_from_unguarded(source)
    }

    /// Deletes the file. Returns false if it did not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but could not be removed.
    pub fn remove(&self) -> StorageResult<bool> {
        self.files.remove_unguarded()
    }
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

fn non_blank_lines(text: &str) -> Vec<String> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::to_owned)
        .collect()
}

fn is_transient(err: &io::Error) -> bool {
    err.kind() != io::ErrorKind::PermissionDenied
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn fast_config() -> AccessConfig {
        AccessConfig::new()
            .read_lock_timeout(Duration::from_millis(20))
            .retry_delay(Duration::from_millis(1))
    }

    fn manager(path: &Path, registry: &LockRegistry) -> FileAccessManager {
        FileAccessManager::with_config(path, registry, fast_config())
    }

    #[test]
    fn missing_file_reads_empty() {
        let dir = tempdir().unwrap();
        let registry = LockRegistry::new();
        let files = manager(&dir.path().join("missing.csv"), &registry);

        assert!(files.read_all_lines().unwrap().is_empty());
        assert_eq!(files.read_text().unwrap(), "");
        assert!(!files.exists());
    }

    #[test]
    fn write_and_read_lines() {
        let dir = tempdir().unwrap();
        let registry = LockRegistry::new();
        let files = manager(&dir.path().join("data.csv"), &registry);

        files.write_all_lines(&["one", "two", "three"]).unwrap();

        assert_eq!(files.read_all_lines().unwrap(), vec!["one", "two", "three"]);
        assert_eq!(files.read_text().unwrap(), "one\ntwo\nthree\n");
    }

    #[test]
    fn blank_lines_are_skipped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("blank.csv");
        fs::write(&path, "a\n\n   \nb\r\n\n").unwrap();

        let registry = LockRegistry::new();
        let files = manager(&path, &registry);
        assert_eq!(files.read_all_lines().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn write_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("data.csv");
        let registry = LockRegistry::new();
        let files = manager(&path, &registry);

        files.write_all_lines(&["x"]).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn write_leaves_no_artifacts() {
        let dir = tempdir().unwrap();
        let registry = LockRegistry::new();
        let files = manager(&dir.path().join("clean.csv"), &registry);

        files.write_all_lines(&["first"]).unwrap();
        files.write_all_lines(&["second"]).unwrap();

        assert!(!files.temp_path().exists());
        assert!(!files.backup_path().exists());
        assert_eq!(files.read_all_lines().unwrap(), vec!["second"]);
    }

    #[test]
    fn empty_write_produces_empty_file() {
        let dir = tempdir().unwrap();
        let registry = LockRegistry::new();
        let files = manager(&dir.path().join("empty.csv"), &registry);

        files.write_all_lines(&["x"]).unwrap();
        files.write_all_lines::<&str>(&[]).unwrap();

        assert!(files.exists());
        assert!(files.read_all_lines().unwrap().is_empty());
    }

    #[test]
    fn failed_write_keeps_previous_content() {
        let dir = tempdir().unwrap();
        let registry = LockRegistry::new();
        let files = manager(&dir.path().join("keep.csv"), &registry);
        files.write_all_lines(&["original"]).unwrap();

        // A directory squatting on the staging path makes the rewrite fail.
        fs::create_dir(files.temp_path()).unwrap();

        let result = files.write_all_lines(&["replacement"]);
        assert!(matches!(result, Err(StorageError::WriteFailed { .. })));
        assert_eq!(files.read_all_lines().unwrap(), vec!["original"]);
        assert!(!files.backup_path().exists());
    }

    #[test]
    fn read_failure_is_retried_then_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("is_a_dir");
        fs::create_dir(&path).unwrap();

        let registry = LockRegistry::new();
        let files = manager(&path, &registry);

        match files.read_text() {
            Err(StorageError::ReadFailed { attempts, .. }) => assert_eq!(attempts, 3),
            other => panic!("expected ReadFailed, got {other:?}"),
        }
    }

    #[test]
    fn managers_for_same_path_share_lock() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("shared.csv");
        let registry = LockRegistry::new();
        let first = manager(&path, &registry);
        let second = manager(&path, &registry);

        let _guard = first.lock();
        assert!(second.try_lock_for(Duration::from_millis(10)).is_none());
    }

    #[test]
    fn read_falls_back_when_lock_is_held() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("contended.csv");
        let registry = LockRegistry::new();
        let writer = manager(&path, &registry);
        let reader = manager(&path, &registry);
        writer.write_all_lines(&["visible"]).unwrap();

        let _guard = writer.lock();
        let started = Instant::now();
        let lines = reader.read_all_lines().unwrap();

        assert_eq!(lines, vec!["visible"]);
        assert!(started.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn guard_reads_and_writes_under_one_lock() {
        let dir = tempdir().unwrap();
        let registry = LockRegistry::new();
        let files = manager(&dir.path().join("rmw.csv"), &registry);
        files.write_all_lines(&["1"]).unwrap();

        {
            let guard = files.lock();
            let mut lines = guard.read_all_lines().unwrap();
            lines.push("2".to_string());
            guard.write_all_lines(&lines).unwrap();
        }

        assert_eq!(files.read_all_lines().unwrap(), vec!["1", "2"]);
    }

    #[test]
    fn guard_copy_and_restore() {
        let dir = tempdir().unwrap();
        let registry = LockRegistry::new();
        let files = manager(&dir.path().join("snap.csv"), &registry);
        let snapshot = dir.path().join("snap.copy");
        files.write_all_lines(&["before"]).unwrap();

        let guard = files.lock();
        assert!(guard.copy_to(&snapshot).unwrap());
        guard.write_all_lines(&["after"]).unwrap();
        guard.restore_from(&snapshot).unwrap();

        assert_eq!(guard.read_all_lines().unwrap(), vec!["before"]);
        assert!(snapshot.exists());
    }

    #[test]
    fn guard_copy_of_missing_file() {
        let dir = tempdir().unwrap();
        let registry = LockRegistry::new();
        let files = manager(&dir.path().join("none.csv"), &registry);

        let guard = files.lock();
        assert!(!guard.copy_to(&dir.path().join("none.copy")).unwrap());
        assert!(!guard.remove().unwrap());
    }

    #[test]
    fn recover_restores_interrupted_rewrite() {
        let dir = tempdir().unwrap();
        let registry = LockRegistry::new();
        let files = manager(&dir.path().join("crash.csv"), &registry);
        files.write_all_lines(&["survivor"]).unwrap();

        // A crash that left only the backup and a half-written staging file.
        fs::rename(files.path(), files.backup_path()).unwrap();
        fs::write(files.temp_path(), "half writ").unwrap();

        assert!(files.recover().unwrap());
        assert_eq!(files.read_all_lines().unwrap(), vec!["survivor"]);
        assert!(!files.temp_path().exists());
        assert!(!files.backup_path().exists());
    }

    #[test]
    fn recover_without_leftovers_is_noop() {
        let dir = tempdir().unwrap();
        let registry = LockRegistry::new();
        let files = manager(&dir.path().join("fine.csv"), &registry);
        files.write_all_lines(&["ok"]).unwrap();

        assert!(!files.recover().unwrap());
        assert_eq!(files.read_all_lines().unwrap(), vec!["ok"]);
    }

    #[test]
    fn bytes_read_tolerates_bad_utf8() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("latin1.csv");
        fs::write(&path, b"1,Caf\xe9\n2,ok\n").unwrap();

        let registry = LockRegistry::new();
        let files = manager(&path, &registry);

        assert_eq!(files.read_bytes().unwrap(), b"1,Caf\xe9\n2,ok\n");
        assert!(matches!(files.read_text(), Err(StorageError::NotText { .. })));
    }

    #[test]
    fn byte_lines_are_written_verbatim() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("raw.csv");
        let registry = LockRegistry::new();
        let files = manager(&path, &registry);

        let lines: Vec<Vec<u8>> = vec![b"1,Caf\xe9".to_vec(), b"2,ok".to_vec()];
        files.lock().write_all_lines(&lines).unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"1,Caf\xe9\n2,ok\n");
    }

    #[test]
    fn recover_keeps_and_lists_transaction_snapshots() {
        let dir = tempdir().unwrap();
        let registry = LockRegistry::new();
        let files = manager(&dir.path().join("store.csv"), &registry);
        files.write_all_lines(&["live"]).unwrap();

        let snapshot = files.snapshot_path("1700000000000_deadbeef");
        fs::write(&snapshot, "old\n").unwrap();
        fs::write(dir.path().join("other.csv.backup_1_x"), "unrelated").unwrap();

        assert!(!files.recover().unwrap());
        assert_eq!(files.leftover_snapshots().unwrap(), vec![snapshot.clone()]);
        assert!(snapshot.exists());
        assert_eq!(files.read_all_lines().unwrap(), vec!["live"]);
    }

    #[test]
    fn sibling_paths() {
        let registry = LockRegistry::new();
        let files = FileAccessManager::new(Path::new("dir/products.csv"), &registry);
        assert_eq!(files.temp_path(), Path::new("dir/products.csv.tmp"));
        assert_eq!(files.backup_path(), Path::new("dir/products.csv.bak"));
        assert_eq!(
            files.snapshot_path("12_ab"),
            Path::new("dir/products.csv.backup_12_ab")
        );
    }
}
