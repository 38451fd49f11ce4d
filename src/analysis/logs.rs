// analysis/logs.rs
//! Saved analyzer logs, one file per category/day/marker.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDate};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::types::BouquetCategory;

const LOG_EXTENSION: &str = "log";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub name: String,
    pub path: PathBuf,
    pub modified: Option<DateTime<Local>>,
    pub size: u64,
}

pub struct LogStore {
    dir: PathBuf,
}

impl LogStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `astra_analyze_20250301_pid4095.log`; an empty marker becomes `no_pid`
    pub fn file_name(category: BouquetCategory, date: NaiveDate, marker_id: &str) -> String {
        let marker = if marker_id.is_empty() {
            "no_pid".to_string()
        } else {
            format!("pid{marker_id}")
        };
        format!(
            "{}_analyze_{}_{}.{}",
            category.log_prefix(),
            date.format("%Y%m%d"),
            marker,
            LOG_EXTENSION
        )
    }

    /// Writes today's log for this block, replacing an earlier one from the same day
    pub fn save(&self, category: BouquetCategory, marker_id: &str, text: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir).map_err(|e| Error::io(&self.dir, e))?;
        let path = self
            .dir
            .join(Self::file_name(category, Local::now().date_naive(), marker_id));
        fs::write(&path, text).map_err(|e| Error::io(&path, e))?;
        info!("Saved analyzer log {:?}", path);
        Ok(path)
    }

    /// Newest first; a missing directory lists as empty
    pub fn list(&self) -> Result<Vec<LogEntry>> {
        let read_dir = match fs::read_dir(&self.dir) {
            Ok(rd) => rd,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::io(&self.dir, e)),
        };

        let mut entries = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|e| Error::io(&self.dir, e))?;
            let path = entry.path();
            if !is_log(&path) {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
                continue;
            };
            let meta = match entry.metadata() {
                Ok(m) if m.is_file() => m,
                Ok(_) => continue,
                Err(e) => {
                    warn!("Skipping {:?}: {}", path, e);
                    continue;
                }
            };
            entries.push(LogEntry {
                name,
                modified: meta.modified().ok().map(DateTime::<Local>::from),
                size: meta.len(),
                path,
            });
        }

        entries.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| b.name.cmp(&a.name)));
        Ok(entries)
    }

    /// Log text by file name; `None` when it does not exist
    pub fn read(&self, name: &str) -> Result<Option<String>> {
        let path = self.resolve(name);
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::io(&path, e)),
        }
    }

    /// Returns false when there was nothing to delete. Only `.log` files are removed.
    pub fn delete(&self, name: &str) -> Result<bool> {
        let path = self.resolve(name);
        if !is_log(&path) {
            return Err(Error::NotALog(path));
        }
        match fs::remove_file(&path) {
            Ok(()) => {
                info!("Deleted analyzer log {:?}", path);
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::io(&path, e)),
        }
    }

    /// Bare names live in the store; anything with a directory part is taken as given
    fn resolve(&self, name: &str) -> PathBuf {
        let candidate = Path::new(name);
        if candidate.components().count() > 1 {
            candidate.to_path_buf()
        } else {
            self.dir.join(candidate)
        }
    }
}

fn is_log(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(LOG_EXTENSION)
}
