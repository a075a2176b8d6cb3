use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use studycards_core::{CoreError, Storage};
use tempfile::NamedTempFile;
use tokio::sync::Mutex;
use tokio::task;
use tracing::{debug, info, warn};

pub mod paths;

const FILE_VERSION: u32 = 1;
pub const DEFAULT_MAX_BACKUPS: usize = 10;

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileImage {
    version: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    entries: BTreeMap<String, Value>,
}

impl FileImage {
    fn new_empty() -> Self {
        let now = Utc::now();
        Self {
            version: FILE_VERSION,
            created_at: now,
            updated_at: now,
            entries: BTreeMap::new(),
        }
    }
}

/// Every key lives in one JSON file. Each write replaces the file atomically
/// and leaves a timestamped copy in the backups directory.
pub struct JsonStore {
    path: PathBuf,
    backups_dir: PathBuf,
    max_backups: usize,
    image: RwLock<FileImage>,
    save_lock: Mutex<()>,
}

impl JsonStore {
    pub async fn open_default() -> Result<Self, CoreError> {
        let (file, backups) = paths::default_store_file();
        Self::open_with(file, backups, DEFAULT_MAX_BACKUPS).await
    }

    pub async fn open_in(root: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let (file, backups) = paths::store_files_in(root.into());
        Self::open_with(file, backups, DEFAULT_MAX_BACKUPS).await
    }

    pub async fn open_with(path: PathBuf, backups_dir: PathBuf, max_backups: usize) -> Result<Self, CoreError> {
        ensure_parent_dirs(&path)?;
        ensure_dir(&backups_dir)?;
        let image = load_or_init(&path, &backups_dir).await?;
        info!(path = %path.display(), keys = image.entries.len(), "json store opened");
        Ok(Self {
            path,
            backups_dir,
            max_backups: max_backups.max(1),
            image: RwLock::new(image),
            save_lock: Mutex::new(()),
        })
    }

    async fn persist(&self, image: &FileImage) -> Result<(), CoreError> {
        let json = serde_json::to_vec_pretty(image)?;
        let path = self.path.clone();
        let backups = self.backups_dir.clone();
        let keep = self.max_backups;

        // Join error -> CoreError, inner io::Error -> CoreError
        task::spawn_blocking(move || {
            replace_file(&path, &json)?;
            backup_best_effort(&backups, keep, &json);
            Ok::<(), std::io::Error>(())
        })
        .await
        .map_err(|_| CoreError::Unavailable("io"))?
        .map_err(|_| CoreError::Unavailable("io"))
    }
}

#[async_trait]
impl Storage for JsonStore {
    async fn read(&self, key: &str) -> Result<Option<Value>, CoreError> {
        Ok(self.image.read().entries.get(key).cloned())
    }

    async fn write(&self, key: &str, value: Value) -> Result<(), CoreError> {
        let _guard = self.save_lock.lock().await;
        let next = {
            let mut img = self.image.read().clone();
            img.entries.insert(key.to_string(), value);
            img.updated_at = Utc::now();
            img
        };
        // Memory only moves forward once the file is on disk.
        self.persist(&next).await?;
        *self.image.write() = next;
        debug!(key, "json store written");
        Ok(())
    }
}

fn ensure_parent_dirs(path: &Path) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    Ok(())
}

fn ensure_dir(path: &Path) -> Result<(), CoreError> {
    fs::create_dir_all(path).map_err(|_| CoreError::Unavailable("io"))
}

async fn load_or_init(path: &Path, backups_dir: &Path) -> Result<FileImage, CoreError> {
    if path.exists() {
        let p = path.to_path_buf();
        let buf = task::spawn_blocking(move || {
            let mut f = fs::File::open(&p)?;
            let mut buf = String::new();
            f.read_to_string(&mut buf)?;
            Ok::<String, std::io::Error>(buf)
        })
        .await
        .map_err(|_| CoreError::Unavailable("io"))
        .and_then(|r| r.map_err(|_| CoreError::Unavailable("io")))?;
        let img: FileImage =
            serde_json::from_str(&buf).map_err(|_| CoreError::Invalid("store file"))?;
        if img.version != FILE_VERSION {
            return Err(CoreError::Invalid("store file version"));
        }
        Ok(img)
    } else {
        let img = FileImage::new_empty();
        let json = serde_json::to_vec_pretty(&img)?;
        replace_file(path, &json).map_err(|_| CoreError::Unavailable("io"))?;
        backup_best_effort(backups_dir, DEFAULT_MAX_BACKUPS, &json);
        Ok(img)
    }
}

fn replace_file(path: &Path, json: &[u8]) -> Result<(), std::io::Error> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut tmp = NamedTempFile::new_in(path.parent().unwrap_or_else(|| Path::new(".")))?;
    tmp.write_all(json)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Called once the store file is in place; failures are logged, not returned.
fn backup_best_effort(backups_dir: &Path, max_backups: usize, json: &[u8]) {
    if let Err(e) = write_backup(backups_dir, max_backups, json) {
        warn!(error = %e, dir = %backups_dir.display(), "backup skipped");
    }
}

fn write_backup(backups_dir: &Path, max_backups: usize, json: &[u8]) -> Result<(), std::io::Error> {
    fs::create_dir_all(backups_dir)?;
    let ts = chrono::Local::now().format("%Y%m%d-%H%M%S%.3f");
    let backup_path = backups_dir.join(format!("studycards-{ts}.json"));
    let mut btmp = NamedTempFile::new_in(backups_dir)?;
    btmp.write_all(json)?;
    btmp.flush()?;
    btmp.persist(&backup_path).map_err(|e| e.error)?;

    rotate_backups(backups_dir, max_backups)?;

    Ok(())
}

fn rotate_backups(dir: &Path, keep: usize) -> Result<(), std::io::Error> {
    let mut entries: Vec<_> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("json"))
        .collect();
    // Names embed the timestamp, so lexical order is age order.
    entries.sort_by_key(|e| e.file_name());
    if entries.len() > keep {
        for e in &entries[0..entries.len() - keep] {
            let _ = fs::remove_file(e.path());
        }
    }
    Ok(())
}
