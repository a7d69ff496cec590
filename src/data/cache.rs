use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use super::loader::{LoadError, load};
use super::model::Dataset;

// ---------------------------------------------------------------------------
// Memoised dataset loads
// ---------------------------------------------------------------------------

/// What the file looked like when it was loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Fingerprint {
    modified: Option<SystemTime>,
    len: u64,
}

impl Fingerprint {
    fn of(path: &Path) -> Option<Self> {
        let meta = std::fs::metadata(path).ok()?;
        Some(Fingerprint {
            modified: meta.modified().ok(),
            len: meta.len(),
        })
    }
}

struct Entry {
    fingerprint: Fingerprint,
    dataset: Arc<Dataset>,
}

/// Loaded datasets keyed on (path, sheet).
///
/// An entry is reused while the file's modification time and length are
/// unchanged. Failed loads are never stored.
#[derive(Default)]
pub struct DatasetCache {
    entries: HashMap<(PathBuf, String), Entry>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached dataset for `path`/`sheet`, loading it if absent or stale.
    pub fn get_or_load(&mut self, path: &Path, sheet: &str) -> Result<Arc<Dataset>, LoadError> {
        let key = (path.to_path_buf(), sheet.to_string());
        let current = Fingerprint::of(path);

        if let (Some(entry), Some(fp)) = (self.entries.get(&key), current) {
            if entry.fingerprint == fp {
                log::debug!("Cache hit for {} [{sheet}]", path.display());
                return Ok(Arc::clone(&entry.dataset));
            }
            log::info!("{} changed on disk, reloading", path.display());
        }

        // Drop the stale entry before loading so a failed reload leaves nothing behind.
        self.entries.remove(&key);
        let dataset = Arc::new(load(path, sheet)?);
        if let Some(fingerprint) = current {
            self.entries.insert(
                key,
                Entry {
                    fingerprint,
                    dataset: Arc::clone(&dataset),
                },
            );
        }
        Ok(dataset)
    }

    /// Forget every sheet loaded from `path`.
    pub fn invalidate(&mut self, path: &Path) {
        self.entries.retain(|(p, _), _| p != path);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::DEFAULT_SHEET;

    fn write(path: &Path, contents: &str) {
        std::fs::write(path, contents).unwrap();
    }

    #[test]
    fn unchanged_file_is_served_from_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("projects.csv");
        write(&path, "Status\nDone\n");

        let mut cache = DatasetCache::new();
        let a = cache.get_or_load(&path, DEFAULT_SHEET).unwrap();
        let b = cache.get_or_load(&path, DEFAULT_SHEET).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn changed_file_is_reloaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("projects.csv");
        write(&path, "Status\nDone\n");

        let mut cache = DatasetCache::new();
        let a = cache.get_or_load(&path, DEFAULT_SHEET).unwrap();
        // Different length, so the fingerprint differs even on coarse mtime clocks.
        write(&path, "Status\nDone\nActive\n");
        let b = cache.get_or_load(&path, DEFAULT_SHEET).unwrap();

        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(b.len(), 2);
    }

    #[test]
    fn invalidate_forces_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("projects.csv");
        write(&path, "Status\nDone\n");

        let mut cache = DatasetCache::new();
        let a = cache.get_or_load(&path, DEFAULT_SHEET).unwrap();
        cache.invalidate(&path);
        assert!(cache.is_empty());
        let b = cache.get_or_load(&path, DEFAULT_SHEET).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn failures_are_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("projects.csv");

        let mut cache = DatasetCache::new();
        assert!(matches!(
            cache.get_or_load(&path, DEFAULT_SHEET),
            Err(LoadError::NotFound { .. })
        ));
        assert!(cache.is_empty());

        write(&path, "Status\nDone\n");
        assert_eq!(cache.get_or_load(&path, DEFAULT_SHEET).unwrap().len(), 1);
    }
}
