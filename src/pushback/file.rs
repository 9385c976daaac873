//! File-backed pushback store: one JSON file per request hash.
//!
//! `record` writes a uniquely named temp file and hard-links it into place.
//! `link(2)` fails when the target exists, which makes create-if-absent
//! atomic across concurrent hook processes without any lock file.

use crate::pushback::{is_older_than, validate_hash, PushbackRecord, PushbackStore};
use crate::utils::state;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use uuid::Uuid;

pub struct FileStore {
    dir: PathBuf,
    ttl: Duration,
}

impl FileStore {
    /// Store under `<state>/pushback/`.
    pub fn new(ttl: Duration) -> Result<Self> {
        Ok(Self::with_dir(state::pushback_dir()?, ttl))
    }

    pub fn with_dir(dir: impl AsRef<Path>, ttl: Duration) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            ttl,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, hash: &str) -> Result<PathBuf> {
        validate_hash(hash)?;
        Ok(self.dir.join(format!("{}.json", hash)))
    }

    /// Creation time of the record at `path`, or `None` if there is no file.
    /// A file that doesn't parse still counts, aged by its mtime.
    fn created_at(&self, path: &Path) -> Result<Option<DateTime<Utc>>> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read pushback record: {}", path.display()))
            }
        };

        if let Ok(record) = serde_json::from_str::<PushbackRecord>(&content) {
            return Ok(Some(record.created_at));
        }

        tracing::warn!(path = %path.display(), "unreadable pushback record, treating as present");
        let modified = fs::metadata(path)
            .and_then(|m| m.modified())
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());
        Ok(Some(modified))
    }

    fn remove(path: &Path) -> Result<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to remove pushback record: {}", path.display())),
        }
    }

    fn record_paths(&self) -> Result<Vec<PathBuf>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let paths = fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to read pushback directory: {}", self.dir.display()))?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().map_or(false, |e| e == "json"))
            .filter(|p| {
                p.file_stem()
                    .and_then(|s| s.to_str())
                    .map_or(false, |s| validate_hash(s).is_ok())
            })
            .collect();
        Ok(paths)
    }
}

impl PushbackStore for FileStore {
    fn contains(&self, hash: &str) -> Result<bool> {
        let path = self.path_for(hash)?;
        match self.created_at(&path)? {
            Some(created) if is_older_than(created, self.ttl) => {
                Self::remove(&path)?;
                Ok(false)
            }
            Some(_) => Ok(true),
            None => Ok(false),
        }
    }

    fn record(&self, hash: &str) -> Result<bool> {
        let path = self.path_for(hash)?;
        if self.contains(hash)? {
            return Ok(false);
        }

        fs::create_dir_all(&self.dir).with_context(|| {
            format!("Failed to create pushback directory: {}", self.dir.display())
        })?;

        let tmp = self.dir.join(format!(".{}.{}.tmp", hash, Uuid::new_v4()));
        let json = serde_json::to_string(&PushbackRecord::new(hash))
            .context("Failed to serialize pushback record")?;
        fs::write(&tmp, json)
            .with_context(|| format!("Failed to write pushback record: {}", tmp.display()))?;

        let linked = fs::hard_link(&tmp, &path);
        let _ = fs::remove_file(&tmp);

        match linked {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to publish pushback record: {}", path.display())),
        }
    }

    fn clear(&self, hash: &str) -> Result<()> {
        Self::remove(&self.path_for(hash)?)
    }

    fn list(&self) -> Result<Vec<PushbackRecord>> {
        let mut records = Vec::new();
        for path in self.record_paths()? {
            let Some(hash) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if let Some(created_at) = self.created_at(&path)? {
                if !is_older_than(created_at, self.ttl) {
                    records.push(PushbackRecord {
                        request_hash: hash.to_string(),
                        created_at,
                    });
                }
            }
        }
        records.sort_by_key(|r| r.created_at);
        Ok(records)
    }

    fn purge_expired(&self) -> Result<usize> {
        let mut removed = 0;
        for path in self.record_paths()? {
            if let Some(created_at) = self.created_at(&path)? {
                if is_older_than(created_at, self.ttl) {
                    Self::remove(&path)?;
                    removed += 1;
                }
            }
        }
        Ok(removed)
    }
}
