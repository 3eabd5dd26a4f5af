use std::fs::{self, File};
use std::io;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use prefs_codec::{CodecConfig, StoreCodec};
use prefs_lock::{FileLock, LockMode, LockOptions};
use prefs_types::Snapshot;

use crate::error::{FileError, FileResult};
use crate::paths::StorePaths;

/// Durability of a write.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SyncMode {
    /// `fsync` the new data file before it replaces the old one.
    #[default]
    EveryWrite,
    /// Leave flushing to the OS page cache.
    OsDefault,
}

/// Configuration for a [`SnapshotFile`].
#[derive(Clone, Debug, Default)]
pub struct FileConfig {
    pub codec: CodecConfig,
    pub lock: LockOptions,
    pub sync_mode: SyncMode,
}

/// A store persisted as one data file guarded by a lock file.
///
/// Reads hold a shared lock, writes an exclusive one. A write renders the
/// whole snapshot, writes it to a temporary file next to the data file and
/// renames it into place, so readers see either the old or the new
/// snapshot and a failed write leaves the old one intact.
#[derive(Clone, Debug)]
pub struct SnapshotFile {
    paths: StorePaths,
    lock: FileLock,
    codec: StoreCodec,
    sync_mode: SyncMode,
}

impl SnapshotFile {
    pub fn new(paths: StorePaths) -> Self {
        Self::with_config(paths, FileConfig::default())
    }

    pub fn with_config(paths: StorePaths, config: FileConfig) -> Self {
        Self {
            lock: FileLock::with_options(paths.lock.clone(), config.lock),
            codec: StoreCodec::new(config.codec),
            sync_mode: config.sync_mode,
            paths,
        }
    }

    pub fn paths(&self) -> &StorePaths {
        &self.paths
    }

    /// Read the current snapshot. A missing data file is an empty store.
    pub fn read(&self) -> FileResult<Snapshot> {
        self.lock
            .with_lock(LockMode::Shared, || self.read_unlocked())?
    }

    /// Replace the stored snapshot with `snapshot`.
    pub fn write(&self, snapshot: &Snapshot) -> FileResult<()> {
        self.lock
            .with_lock(LockMode::Exclusive, || self.write_unlocked(snapshot))?
    }

    /// Read, modify and write back under a single exclusive lock.
    ///
    /// If `f` fails nothing is written. Returns the snapshot as written.
    pub fn update<F>(&self, f: F) -> FileResult<Snapshot>
    where
        F: FnOnce(&mut Snapshot) -> FileResult<()>,
    {
        self.lock.with_lock(LockMode::Exclusive, || -> FileResult<Snapshot> {
            let mut snapshot = self.read_unlocked()?;
            f(&mut snapshot)?;
            self.write_unlocked(&snapshot)?;
            Ok(snapshot)
        })?
    }

    fn read_unlocked(&self) -> FileResult<Snapshot> {
        let path = &self.paths.data;
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no data file yet; empty store");
                return Ok(Snapshot::empty());
            }
            Err(e) => return Err(io_error(path, e)),
        };
        Ok(self.codec.decode(file)?)
    }

    fn write_unlocked(&self, snapshot: &Snapshot) -> FileResult<()> {
        let dir = self.paths.data_dir();
        fs::create_dir_all(dir).map_err(|e| io_error(dir, e))?;

        // Dropped (and removed) on any early return below.
        let mut staged = stage_in(dir).map_err(|e| io_error(dir, e))?;
        match fs::metadata(&self.paths.data) {
            Ok(meta) => staged
                .as_file()
                .set_permissions(meta.permissions())
                .map_err(|e| io_error(staged.path(), e))?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(io_error(&self.paths.data, e)),
        }
        self.codec.encode_snapshot(snapshot, staged.as_file_mut())?;
        if self.sync_mode == SyncMode::EveryWrite {
            staged
                .as_file()
                .sync_all()
                .map_err(|e| io_error(staged.path(), e))?;
        }

        staged
            .persist(&self.paths.data)
            .map_err(|e| io_error(&self.paths.data, e.error))?;

        debug!(
            path = %self.paths.data.display(),
            entries = snapshot.len(),
            "snapshot written"
        );
        Ok(())
    }
}

/// Create the temp file a write is staged in. A new data file gets the same
/// umask-filtered mode as a plain `File::create`, not the private mode temp
/// files default to.
#[cfg_attr(not(unix), allow(unused_mut))]
fn stage_in(dir: &Path) -> io::Result<NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    builder.tempfile_in(dir)
}

fn io_error(path: &Path, source: io::Error) -> FileError {
    FileError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prefs_codec::CodecError;
    use prefs_types::{TypeError, Value};
    use std::thread;

    fn store(dir: &tempfile::TempDir) -> SnapshotFile {
        SnapshotFile::new(StorePaths::beside(dir.path().join("prefs.json")))
    }

    fn sample() -> Snapshot {
        let mut snap = Snapshot::named("app");
        snap.insert("launches", 3).unwrap();
        snap.insert("user", "ada").unwrap();
        snap.insert("features", Value::string_set(["dark", "beta"])).unwrap();
        snap
    }

    #[test]
    fn missing_data_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(store(&dir).read().unwrap(), Snapshot::empty());
    }

    #[test]
    fn write_then_read_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let file = store(&dir);
        file.write(&sample()).unwrap();

        assert!(file.paths().data.exists());
        assert!(file.paths().lock.exists());
        assert_eq!(file.read().unwrap(), sample());
    }

    #[test]
    fn write_replaces_whole_data_set() {
        let dir = tempfile::tempdir().unwrap();
        let file = store(&dir);
        file.write(&sample()).unwrap();

        let mut next = Snapshot::named("app");
        next.insert("only", true).unwrap();
        file.write(&next).unwrap();

        assert_eq!(file.read().unwrap(), next);
    }

    #[test]
    fn write_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let file = SnapshotFile::new(StorePaths::beside(dir.path().join("a").join("b").join("p.json")));
        file.write(&sample()).unwrap();
        assert_eq!(file.read().unwrap(), sample());
    }

    #[test]
    fn failed_encode_leaves_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let file = store(&dir);
        file.write(&sample()).unwrap();

        let mut bad = sample();
        bad.insert("ratio", f32::NAN).unwrap();
        let err = file.write(&bad).unwrap_err();
        assert!(matches!(err, FileError::Codec(CodecError::NonFiniteFloat { .. })));

        assert_eq!(file.read().unwrap(), sample());
        let leftovers = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 2, "only the data and lock files should remain");
    }

    #[cfg(unix)]
    #[test]
    fn write_keeps_existing_data_file_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let file = store(&dir);
        for mode in [0o644, 0o640] {
            fs::write(&file.paths().data, b"").unwrap();
            fs::set_permissions(&file.paths().data, fs::Permissions::from_mode(mode)).unwrap();

            file.write(&sample()).unwrap();

            let after = fs::metadata(&file.paths().data).unwrap().permissions().mode() & 0o777;
            assert_eq!(after, mode, "mode {mode:o} was not kept");
            assert_eq!(file.read().unwrap(), sample());
        }
    }

    #[cfg(unix)]
    #[test]
    fn new_data_file_matches_plain_create() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let reference = dir.path().join("reference");
        File::create(&reference).unwrap();
        let expected = fs::metadata(&reference).unwrap().permissions().mode() & 0o777;

        let file = store(&dir);
        file.write(&sample()).unwrap();
        let actual = fs::metadata(&file.paths().data).unwrap().permissions().mode() & 0o777;
        assert_eq!(actual, expected);
    }

    #[test]
    fn lock_failure_touches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, b"").unwrap();

        let file = SnapshotFile::new(StorePaths::new(
            dir.path().join("prefs.json"),
            blocker.join("prefs.lock"),
        ));
        let err = file.write(&sample()).unwrap_err();
        assert!(matches!(err, FileError::Lock(_)));
        assert!(!dir.path().join("prefs.json").exists());
    }

    #[test]
    fn corrupted_data_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = store(&dir);
        fs::write(&file.paths().data, br#"{"metaData": {"name": "#).unwrap();

        let err = file.read().unwrap_err();
        assert!(matches!(err, FileError::Codec(CodecError::Syntax(_))));
    }

    #[test]
    fn update_is_read_modify_write() {
        let dir = tempfile::tempdir().unwrap();
        let file = store(&dir);
        file.write(&sample()).unwrap();

        let written = file
            .update(|snap| {
                snap.remove("user");
                snap.insert("launches", 4)?;
                Ok(())
            })
            .unwrap();

        assert_eq!(written.get("launches"), Some(&Value::Int32(4)));
        assert!(!written.contains_key("user"));
        assert_eq!(file.read().unwrap(), written);
    }

    #[test]
    fn failed_update_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let file = store(&dir);
        file.write(&sample()).unwrap();

        let err = file
            .update(|snap| {
                snap.insert("launches", 100)?;
                snap.insert("", 1)?;
                Ok(())
            })
            .unwrap_err();

        assert!(matches!(err, FileError::Type(TypeError::EmptyKey)));
        assert_eq!(file.read().unwrap(), sample());
    }

    #[test]
    fn concurrent_updates_are_not_lost() {
        const THREADS: i64 = 6;
        const ROUNDS: i64 = 25;

        let dir = tempfile::tempdir().unwrap();
        let file = SnapshotFile::with_config(
            StorePaths::beside(dir.path().join("counter.json")),
            FileConfig {
                sync_mode: SyncMode::OsDefault,
                ..FileConfig::default()
            },
        );

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                // Each thread gets its own handle, like a separate process would.
                let file = file.clone();
                thread::spawn(move || {
                    for _ in 0..ROUNDS {
                        file.update(|snap| {
                            let n = snap.get("n").and_then(Value::as_i64).unwrap_or(0);
                            snap.insert("n", n + 1)?;
                            Ok(())
                        })
                        .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let snap = file.read().unwrap();
        assert_eq!(snap.get("n"), Some(&Value::Int64(THREADS * ROUNDS)));
    }

    #[test]
    fn readers_never_observe_partial_writes() {
        const KEYS: usize = 40;

        let dir = tempfile::tempdir().unwrap();
        let paths = StorePaths::beside(dir.path().join("uniform.json"));

        let writer = {
            let file = SnapshotFile::new(paths.clone());
            thread::spawn(move || {
                for round in 0..40i64 {
                    let mut snap = Snapshot::named("uniform");
                    for k in 0..KEYS {
                        snap.insert(format!("k{k}"), round).unwrap();
                    }
                    file.write(&snap).unwrap();
                }
            })
        };

        let readers: Vec<_> = (0..3)
            .map(|_| {
                let file = SnapshotFile::new(paths.clone());
                thread::spawn(move || {
                    for _ in 0..40 {
                        let snap = file.read().unwrap();
                        if snap.is_empty() {
                            continue;
                        }
                        assert_eq!(snap.len(), KEYS);
                        let first = snap.get("k0").cloned();
                        assert!(snap.iter().all(|(_, v)| Some(v) == first.as_ref()));
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
    }
}
