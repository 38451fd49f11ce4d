// bouquet/store.rs
//! Bouquet files on disk. Re-read on every call; nothing is cached.

use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::record::{BouquetFile, parse_bouquet};
use super::{candidate_record, group_records, index, merge_records, serialize_bouquet};
use crate::error::{Error, Result};
use crate::types::{BouquetCategory, DiscoveredService, MergeOutcome, MergeSummary, TuningContext};

pub struct BouquetStore {
    dir: PathBuf,
}

impl BouquetStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, category: BouquetCategory) -> PathBuf {
        self.dir.join(category.file_name())
    }

    /// Existing bouquet contents. Unreadable files load as empty.
    pub fn load(&self, category: BouquetCategory) -> BouquetFile {
        let path = self.path(category);
        match fs::read(&path) {
            Ok(bytes) => parse_bouquet(&String::from_utf8_lossy(&bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => BouquetFile::default(),
            Err(e) => {
                warn!("Could not read {:?}, starting from an empty bouquet: {}", path, e);
                BouquetFile::default()
            }
        }
    }

    /// Plain overwrite; a failure part way through can leave the file truncated
    pub fn save(&self, category: BouquetCategory, text: &str) -> Result<PathBuf> {
        let path = self.path(category);
        let write = fs::create_dir_all(&self.dir).and_then(|_| fs::write(&path, text));
        write.map_err(|source| Error::BouquetWrite {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    /// Merges discovered services into the category's bouquet and makes
    /// sure the bouquet is listed in the index file. An index failure does
    /// not undo the bouquet write; it is reported in the summary.
    pub fn merge_and_persist(
        &self,
        category: BouquetCategory,
        services: &[DiscoveredService],
        marker_id: &str,
        output_url: &str,
        tuning: &TuningContext,
    ) -> Result<MergeOutcome> {
        if services.is_empty() {
            info!("No services to merge into {}", category.file_name());
            return Ok(MergeOutcome::NothingToDo { category });
        }

        let existing = self.load(category);
        let mut records = existing.records;
        let candidates = services
            .iter()
            .map(|s| candidate_record(s, marker_id, output_url, tuning))
            .collect();
        let counts = merge_records(&mut records, candidates);
        let records_written = records.len();

        let refreshed: HashSet<String> = [marker_id.to_string()].into_iter().collect();
        let groups = group_records(
            category,
            records,
            &existing.headers,
            &refreshed,
            &tuning.satellite_label,
        );
        let name = existing
            .name
            .unwrap_or_else(|| category.title().to_string());
        let path = self.save(category, &serialize_bouquet(&name, &groups))?;
        let (index_updated, index_error) = match index::ensure_included(&self.dir, category) {
            Ok(changed) => (changed, None),
            Err(e) => {
                warn!("Bouquet written but index not updated: {}", e);
                (false, Some(e.to_string()))
            }
        };

        info!(
            "Wrote {} records to {:?} ({} added, {} updated)",
            records_written, path, counts.added, counts.updated
        );
        Ok(MergeOutcome::Written(MergeSummary {
            category,
            path,
            records_written,
            added: counts.added,
            updated: counts.updated,
            index_updated,
            index_error,
        }))
    }
}
