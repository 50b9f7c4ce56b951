use std::path::Path;

use fxhash::FxHashMap;
use tracing::info;

use crate::core::types::ClassificationId;
use crate::index::LoadError;
use crate::parsing::mapping::read_mapping_file;
use crate::utils::cancel::CancelToken;

/// Alternate and common names for classification ids, consulted
/// separately from the primary name dictionary
#[derive(Debug, Clone, Default)]
pub struct SynonymIndex {
    map: FxHashMap<String, ClassificationId>,
}

impl SynonymIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a two-column `<synonym>\t<id>` file (gzip aware)
    ///
    /// # Errors
    ///
    /// Returns `LoadError::Parse` if the file cannot be read or is malformed.
    pub fn load(path: &Path, cancel: &CancelToken) -> Result<Self, LoadError> {
        let mut index = Self::new();
        let count = read_mapping_file(path, cancel, |name, id| index.put(name, id))?;
        info!("Loaded {count} synonyms from {}", path.display());
        Ok(index)
    }

    /// Add a synonym; ids that are not positive are ignored
    pub fn put(&mut self, name: impl Into<String>, id: ClassificationId) {
        if id > 0 {
            self.map.insert(name.into(), id);
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<ClassificationId> {
        self.map.get(name).copied()
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

impl FromIterator<(String, ClassificationId)> for SynonymIndex {
    fn from_iter<I: IntoIterator<Item = (String, ClassificationId)>>(iter: I) -> Self {
        let mut index = Self::new();
        for (name, id) in iter {
            index.put(name, id);
        }
        index
    }
}
