use std::path::Path;
use std::time::Instant;

use fxhash::FxHashMap;
use tracing::info;

use crate::core::types::ClassificationId;
use crate::index::{AccessionLookup, LoadError};
use crate::parsing::mapping::read_mapping_file;
use crate::utils::cancel::CancelToken;

/// Accession map held entirely in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryTable {
    map: FxHashMap<String, ClassificationId>,
}

impl InMemoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan a two-column `<accession>\t<id>` file (gzip aware).
    /// Later lines win when an accession repeats.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::Parse` for unreadable or malformed files and
    /// `LoadError::Canceled` if the token is canceled mid-scan.
    pub fn load(path: &Path, cancel: &CancelToken) -> Result<Self, LoadError> {
        let start = Instant::now();
        let mut table = Self::new();
        let count = read_mapping_file(path, cancel, |accession, id| {
            table.insert(accession, id);
        })?;
        info!(
            "Loaded {count} accessions from {} in {:.1}s",
            path.display(),
            start.elapsed().as_secs_f64()
        );
        Ok(table)
    }

    /// Add an entry; ids that are not positive are ignored
    pub fn insert(&mut self, accession: impl Into<String>, id: ClassificationId) {
        if id > 0 {
            self.map.insert(accession.into(), id);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl AccessionLookup for InMemoryTable {
    fn get(&self, accession: &str) -> Option<ClassificationId> {
        self.map.get(accession).copied()
    }
}

impl FromIterator<(String, ClassificationId)> for InMemoryTable {
    fn from_iter<I: IntoIterator<Item = (String, ClassificationId)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (accession, id) in iter {
            table.insert(accession, id);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_later_lines_win() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("acc.tsv");
        std::fs::write(&path, "AB1\t5\nAB2\t17\nAB1\t6\n").unwrap();

        let table = InMemoryTable::load(&path, &CancelToken::new()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("AB1"), Some(6));
        assert_eq!(table.get("AB2"), Some(17));
        assert_eq!(table.get("ab2"), None);
    }

    #[test]
    fn test_from_iter() {
        let table: InMemoryTable = vec![("X".to_string(), 1)].into_iter().collect();
        assert_eq!(table.get("X"), Some(1));
    }

    #[test]
    fn test_non_positive_ids_are_ignored() {
        let mut table: InMemoryTable = vec![("A0".to_string(), 0), ("A5".to_string(), 5)]
            .into_iter()
            .collect();
        table.insert("Aneg", -1);
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("A0"), None);
        assert_eq!(table.get("Aneg"), None);
        assert_eq!(table.get("A5"), Some(5));
    }
}
