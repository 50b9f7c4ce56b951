use fxhash::FxHashMap;

use crate::core::tree::TaxonomyTree;
use crate::core::types::{ClassificationId, Rank};

/// Known ambiguous taxonomy names and the id they should resolve to.
///
/// e.g. `Bacteria` is also a stick-insect genus in NCBI (629395).
const TAXONOMY_OVERRIDES: &[(&str, ClassificationId)] = &[
    ("Bacteria", 2),
    ("Archaea", 2157),
    ("Eukaryota", 2759),
    ("Viruses", 10239),
];

/// Exact-string map from names to classification ids, with rank and
/// tooltip side tables keyed by id.
///
/// An id may have many names; the first name inserted for an id is its
/// primary name.
#[derive(Debug, Clone, Default)]
pub struct NameIdDictionary {
    name_to_id: FxHashMap<String, ClassificationId>,
    id_to_name: FxHashMap<ClassificationId, String>,
    ranks: FxHashMap<ClassificationId, Rank>,
    tooltips: FxHashMap<ClassificationId, String>,
}

impl NameIdDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map a name to an id. A name seen before is remapped to the new id.
    pub fn put(&mut self, name: impl Into<String>, id: ClassificationId) {
        let name = name.into();
        self.id_to_name.entry(id).or_insert_with(|| name.clone());
        self.name_to_id.insert(name, id);
    }

    pub fn set_rank(&mut self, id: ClassificationId, rank: Rank) {
        self.ranks.insert(id, rank);
    }

    pub fn set_tooltip(&mut self, id: ClassificationId, tooltip: impl Into<String>) {
        self.tooltips.insert(id, tooltip.into());
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<ClassificationId> {
        self.name_to_id.get(name).copied()
    }

    /// Primary name of an id
    #[must_use]
    pub fn name(&self, id: ClassificationId) -> Option<&str> {
        self.id_to_name.get(&id).map(String::as_str)
    }

    /// Rank of an id; `NoRank` when unknown
    #[must_use]
    pub fn rank(&self, id: ClassificationId) -> Rank {
        self.ranks.get(&id).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn tooltip(&self, id: ClassificationId) -> Option<&str> {
        self.tooltips.get(&id).map(String::as_str)
    }

    /// Number of names
    #[must_use]
    pub fn len(&self) -> usize {
        self.name_to_id.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name_to_id.is_empty()
    }

    /// Apply the hard-coded remaps for ambiguous taxonomy names.
    /// An override is skipped when its target id is not in the tree.
    /// Returns the number of overrides applied.
    pub fn apply_taxonomy_overrides(&mut self, tree: &TaxonomyTree) -> usize {
        let mut applied = 0;
        for &(name, id) in TAXONOMY_OVERRIDES {
            if tree.contains(id) && self.get(name) != Some(id) {
                self.put(name, id);
                applied += 1;
            }
        }
        applied
    }
}
