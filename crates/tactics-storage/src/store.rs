//! ModelStore: atomic saves, rotating backups, and corruption recovery.

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::Serialize;
use tactics_core::config::StorageConfig;
use tactics_core::constants::files;
use tactics_core::errors::{StorageError, TacticsResult};
use tactics_core::{Clock, ModelSnapshot, PredictorBackend};
use tracing::{debug, error, info, warn};

use crate::metadata::MetadataFile;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
/// Backups are assembled under this prefix and renamed when complete.
const STAGING_PREFIX: &str = ".staging_";

/// One backup directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupInfo {
    pub path: PathBuf,
    pub created_millis: i64,
    pub files: usize,
}

/// Outcome of [`ModelStore::save_all`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct SaveReport {
    pub backup: Option<PathBuf>,
    /// Component name and number of files written.
    pub saved: Vec<(String, usize)>,
    /// Component name and failure reason.
    pub failed: Vec<(String, String)>,
}

impl SaveReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn files_written(&self) -> usize {
        self.saved.iter().map(|(_, n)| n).sum()
    }
}

pub struct ModelStore {
    root: PathBuf,
    backup_dir: PathBuf,
    tmp_root: PathBuf,
    max_backups: usize,
    backup_before_save: bool,
    compress: bool,
    metadata: MetadataFile,
    clock: Arc<dyn Clock>,
    save_seq: AtomicU64,
    /// Serializes writers: saves, backups, and restores.
    write_lock: Mutex<()>,
}

impl ModelStore {
    /// Create the root and backup directories and clear leftovers of
    /// interrupted saves. Failing to create the directories is fatal.
    pub fn open(
        root: impl Into<PathBuf>,
        config: &StorageConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, StorageError> {
        let root = root.into();
        let backup_dir = root.join(files::BACKUP_DIR);
        for dir in [&root, &backup_dir] {
            fs::create_dir_all(dir).map_err(|e| StorageError::DirectoryUnavailable {
                path: dir.display().to_string(),
                reason: e.to_string(),
            })?;
        }

        let tmp_root = root.join(files::TMP_DIR);
        if tmp_root.exists() {
            match fs::remove_dir_all(&tmp_root) {
                Ok(()) => info!(path = %tmp_root.display(), "removed stale temp directory"),
                Err(e) => warn!(path = %tmp_root.display(), error = %e, "cannot remove stale temp directory"),
            }
        }
        remove_staged_backups(&backup_dir);

        info!(root = %root.display(), max_backups = config.max_backups, "model store opened");
        Ok(Self {
            metadata: MetadataFile::new(root.join(files::METADATA)),
            root,
            backup_dir,
            tmp_root,
            max_backups: config.max_backups.max(1),
            backup_before_save: config.backup_before_save,
            compress: config.compress_models,
            clock,
            save_seq: AtomicU64::new(0),
            write_lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Parent of the per-save working directories.
    pub fn tmp_dir(&self) -> &Path {
        &self.tmp_root
    }

    pub fn metadata(&self) -> &MetadataFile {
        &self.metadata
    }

    pub fn last_save(&self, component: &str) -> Option<i64> {
        self.metadata.last_save(component)
    }

    /// Write every snapshot into a fresh working directory, then rename each
    /// into the root. Live files are untouched unless every write succeeded.
    pub fn save_files(
        &self,
        snapshots: Vec<(&str, ModelSnapshot)>,
    ) -> Result<Vec<PathBuf>, StorageError> {
        if snapshots.is_empty() {
            return Ok(Vec::new());
        }
        let _writer = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let now = self.clock.now_millis();
        let work = self.tmp_root.join(format!(
            "save_{now}_{}",
            self.save_seq.fetch_add(1, Ordering::Relaxed)
        ));
        fs::create_dir_all(&work).map_err(|e| StorageError::io(&work, &e))?;

        let staged: Result<Vec<(PathBuf, PathBuf)>, StorageError> = snapshots
            .iter()
            .map(|(name, snapshot)| {
                let staged = work.join(name);
                write_synced(&staged, &self.encode(snapshot)?)?;
                Ok((staged, self.root.join(name)))
            })
            .collect();
        let staged = match staged {
            Ok(staged) => staged,
            Err(e) => {
                let _ = fs::remove_dir_all(&work);
                return Err(e);
            }
        };

        let mut written = Vec::with_capacity(staged.len());
        for (from, to) in staged {
            if let Err(e) = fs::rename(&from, &to) {
                let _ = fs::remove_dir_all(&work);
                return Err(StorageError::io(&to, &e));
            }
            written.push(to);
        }
        sync_dir(&self.root);
        if let Err(e) = fs::remove_dir_all(&work) {
            debug!(path = %work.display(), error = %e, "temp directory cleanup failed");
        }

        let mut components: Vec<&str> =
            snapshots.iter().map(|(_, s)| s.component.as_str()).collect();
        components.sort_unstable();
        components.dedup();
        self.metadata.record_saves(components, now)?;
        debug!(files = written.len(), "snapshots saved");
        Ok(written)
    }

    /// Snapshot one backend and save its files.
    pub fn save_backend(&self, backend: &dyn PredictorBackend) -> TacticsResult<Vec<PathBuf>> {
        if !backend.is_available() {
            return Ok(Vec::new());
        }
        let snapshots = backend.snapshot(self.clock.now_millis())?;
        Ok(self.save_files(snapshots)?)
    }

    /// Backup first, then every backend. A failing backend does not stop the
    /// others; a failing backup stops everything.
    pub fn save_all(
        &self,
        backends: &[Arc<dyn PredictorBackend>],
    ) -> Result<SaveReport, StorageError> {
        let mut report = SaveReport::default();
        if self.backup_before_save {
            report.backup = self.create_backup()?;
        }
        for backend in backends.iter().filter(|b| b.is_available()) {
            let component = backend.component().to_string();
            match self.save_backend(backend.as_ref()) {
                Ok(paths) => report.saved.push((component, paths.len())),
                Err(e) => {
                    error!(component = %component, error = %e, "failed to save backend");
                    report.failed.push((component, e.to_string()));
                }
            }
        }
        Ok(report)
    }

    /// Copy current model files into `backups/backup_<millis>` and prune.
    /// The copy is assembled in a staging directory first, so a failed copy
    /// never shows up as a backup. `None` when there is nothing to back up.
    pub fn create_backup(&self) -> Result<Option<PathBuf>, StorageError> {
        let _writer = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let live = self.live_model_files()?;
        if live.is_empty() {
            return Ok(None);
        }

        let latest = self.list_backups()?.last().map(|b| b.created_millis);
        let mut stamp = self.clock.now_millis();
        if let Some(latest) = latest {
            stamp = stamp.max(latest + 1);
        }
        let mut dir = self.backup_path(stamp);
        while dir.exists() {
            stamp += 1;
            dir = self.backup_path(stamp);
        }

        let staging = self
            .backup_dir
            .join(format!("{STAGING_PREFIX}{stamp}"));
        if let Err(e) = copy_into(&live, &staging).and_then(|()| {
            fs::rename(&staging, &dir).map_err(|e| StorageError::io(&dir, &e))
        }) {
            if let Err(cleanup) = fs::remove_dir_all(&staging) {
                debug!(path = %staging.display(), error = %cleanup, "staging cleanup failed");
            }
            error!(path = %dir.display(), error = %e, "backup failed");
            return Err(e);
        }
        info!(path = %dir.display(), files = live.len(), "backup created");

        let pruned = self.prune_backups()?;
        if pruned > 0 {
            debug!(pruned, "old backups removed");
        }
        Ok(Some(dir))
    }

    /// Backups oldest first.
    pub fn list_backups(&self) -> Result<Vec<BackupInfo>, StorageError> {
        let entries =
            fs::read_dir(&self.backup_dir).map_err(|e| StorageError::io(&self.backup_dir, &e))?;
        let mut backups: Vec<BackupInfo> = entries
            .filter_map(|entry| {
                let path = entry.ok()?.path();
                if !path.is_dir() {
                    return None;
                }
                let created_millis = path
                    .file_name()?
                    .to_str()?
                    .strip_prefix(files::BACKUP_PREFIX)?
                    .parse()
                    .ok()?;
                let files = fs::read_dir(&path).map(|d| d.count()).unwrap_or(0);
                Some(BackupInfo {
                    path,
                    created_millis,
                    files,
                })
            })
            .collect();
        backups.sort_by_key(|b| b.created_millis);
        Ok(backups)
    }

    /// Copy the newest backup's files over the live directory.
    pub fn restore_from_latest_backup(&self) -> Result<Option<PathBuf>, StorageError> {
        let Some(latest) = self.list_backups()?.pop() else {
            info!("no backup to restore from");
            return Ok(None);
        };
        let _writer = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let entries = fs::read_dir(&latest.path).map_err(|e| StorageError::io(&latest.path, &e))?;
        for entry in entries {
            let src = entry.map_err(|e| StorageError::io(&latest.path, &e))?.path();
            let Some(name) = src.file_name() else {
                continue;
            };
            let dest = self.root.join(name);
            let staged = self.root.join(format!("{}.restore", name.to_string_lossy()));
            fs::copy(&src, &staged).map_err(|e| StorageError::io(&staged, &e))?;
            fs::rename(&staged, &dest).map_err(|e| StorageError::io(&dest, &e))?;
        }
        info!(path = %latest.path.display(), "restored from backup");
        Ok(Some(latest.path))
    }

    /// Read and decode one model file. A corrupt file is deleted and reported
    /// as [`StorageError::LoadFailedStartFresh`].
    pub fn load_snapshot(&self, file_name: &str) -> Result<Option<ModelSnapshot>, StorageError> {
        let path = self.root.join(file_name);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::io(&path, &e)),
        };
        match self.decode(&bytes) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(e) => {
                self.discard(&path);
                Err(StorageError::LoadFailedStartFresh {
                    component: file_name.to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Restore `backend` from its files. Every file is decoded before any is
    /// applied; on corruption the backend's files are deleted and the caller
    /// keeps its fresh backend. Returns how many files were restored.
    pub fn load_backend(&self, backend: &dyn PredictorBackend) -> Result<usize, StorageError> {
        if !backend.is_available() {
            return Ok(0);
        }
        let mut decoded = Vec::new();
        for name in backend.file_names() {
            match self.load_snapshot(name) {
                Ok(Some(snapshot)) => decoded.push((*name, snapshot)),
                Ok(None) => {}
                Err(StorageError::LoadFailedStartFresh { reason, .. }) => {
                    self.discard_backend_files(backend);
                    return Err(self.start_fresh(backend, reason));
                }
                Err(e) => return Err(e),
            }
        }

        for (name, snapshot) in &decoded {
            if let Err(e) = backend.restore(name, snapshot) {
                self.discard_backend_files(backend);
                return Err(self.start_fresh(backend, e.to_string()));
            }
        }
        if !decoded.is_empty() {
            info!(component = backend.component(), files = decoded.len(), "backend restored");
        }
        Ok(decoded.len())
    }

    fn encode(&self, snapshot: &ModelSnapshot) -> Result<Vec<u8>, StorageError> {
        let raw = snapshot.encode();
        if !self.compress {
            return Ok(raw);
        }
        let mut encoder = GzEncoder::new(Vec::with_capacity(raw.len() / 2), Compression::default());
        encoder
            .write_all(&raw)
            .and_then(|()| encoder.finish())
            .map_err(|e| StorageError::malformed(format!("gzip: {e}")))
    }

    /// Gzip is recognized by its magic, whatever `compress_models` says.
    fn decode(&self, bytes: &[u8]) -> Result<ModelSnapshot, StorageError> {
        if !bytes.starts_with(&GZIP_MAGIC) {
            return ModelSnapshot::decode(bytes);
        }
        let mut raw = Vec::with_capacity(bytes.len() * 2);
        GzDecoder::new(bytes)
            .read_to_end(&mut raw)
            .map_err(|e| StorageError::malformed(format!("gzip: {e}")))?;
        ModelSnapshot::decode(&raw)
    }

    fn start_fresh(&self, backend: &dyn PredictorBackend, reason: String) -> StorageError {
        warn!(component = backend.component(), reason = %reason, "model load failed, starting fresh");
        StorageError::LoadFailedStartFresh {
            component: backend.component().to_string(),
            reason,
        }
    }

    fn discard_backend_files(&self, backend: &dyn PredictorBackend) {
        for name in backend.file_names() {
            let path = self.root.join(name);
            if path.exists() {
                self.discard(&path);
            }
        }
    }

    fn discard(&self, path: &Path) {
        match fs::remove_file(path) {
            Ok(()) => warn!(path = %path.display(), "deleted corrupt model file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %path.display(), error = %e, "cannot delete corrupt model file"),
        }
    }

    fn backup_path(&self, stamp: i64) -> PathBuf {
        self.backup_dir.join(format!("{}{stamp}", files::BACKUP_PREFIX))
    }

    fn prune_backups(&self) -> Result<usize, StorageError> {
        let backups = self.list_backups()?;
        if backups.len() <= self.max_backups {
            return Ok(0);
        }
        let excess = backups.len() - self.max_backups;
        let mut removed = 0;
        for old in backups.into_iter().take(excess) {
            match fs::remove_dir_all(&old.path) {
                Ok(()) => removed += 1,
                Err(e) => warn!(path = %old.path.display(), error = %e, "cannot remove old backup"),
            }
        }
        Ok(removed)
    }

    /// `*.model` and `*.dat` files directly under the root.
    fn live_model_files(&self) -> Result<Vec<PathBuf>, StorageError> {
        let entries = fs::read_dir(&self.root).map_err(|e| StorageError::io(&self.root, &e))?;
        let mut found: Vec<PathBuf> = entries
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.is_file())
            .filter(|p| {
                p.extension()
                    .is_some_and(|ext| ext == "model" || ext == "dat")
            })
            .collect();
        found.sort();
        Ok(found)
    }
}

impl std::fmt::Debug for ModelStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelStore")
            .field("root", &self.root)
            .field("max_backups", &self.max_backups)
            .field("compress", &self.compress)
            .finish()
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    let mut file = fs::File::create(path).map_err(|e| StorageError::io(path, &e))?;
    file.write_all(bytes)
        .and_then(|_| file.sync_all())
        .map_err(|e| StorageError::io(path, &e))
}

fn copy_into(files: &[PathBuf], dir: &Path) -> Result<(), StorageError> {
    fs::create_dir_all(dir).map_err(|e| StorageError::io(dir, &e))?;
    for file in files {
        if let Some(name) = file.file_name() {
            let dest = dir.join(name);
            fs::copy(file, &dest).map_err(|e| StorageError::io(&dest, &e))?;
        }
    }
    Ok(())
}

/// Leftovers of backups interrupted before their rename.
fn remove_staged_backups(backup_dir: &Path) {
    let Ok(entries) = fs::read_dir(backup_dir) else {
        return;
    };
    for path in entries.filter_map(|e| e.ok().map(|e| e.path())) {
        let staged = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(STAGING_PREFIX));
        if staged {
            match fs::remove_dir_all(&path) {
                Ok(()) => info!(path = %path.display(), "removed unfinished backup"),
                Err(e) => warn!(path = %path.display(), error = %e, "cannot remove unfinished backup"),
            }
        }
    }
}

/// Best effort: make renames in `dir` durable.
fn sync_dir(dir: &Path) {
    if let Ok(handle) = fs::File::open(dir) {
        let _ = handle.sync_all();
    }
}
