use std::sync::Arc;

use crate::core::dictionary::NameIdDictionary;
use crate::core::tree::TaxonomyTree;
use crate::core::types::{is_taxonomy, ClassificationId};

/// A named classification: its tree and its name dictionary, both read-only
#[derive(Debug, Clone)]
pub struct Classification {
    pub name: String,
    pub tree: Arc<TaxonomyTree>,
    pub dictionary: Arc<NameIdDictionary>,
}

impl Classification {
    /// Bundle a tree and dictionary. For the taxonomy the curative name
    /// overrides are applied here, once.
    pub fn new(name: impl Into<String>, tree: TaxonomyTree, mut dictionary: NameIdDictionary) -> Self {
        let name = name.into();
        if is_taxonomy(&name) {
            let applied = dictionary.apply_taxonomy_overrides(&tree);
            if applied > 0 {
                tracing::debug!("Applied {applied} taxonomy name overrides");
            }
        }
        Self {
            name,
            tree: Arc::new(tree),
            dictionary: Arc::new(dictionary),
        }
    }

    #[must_use]
    pub fn is_taxonomy(&self) -> bool {
        is_taxonomy(&self.name)
    }

    /// Display name of an id, falling back to the number itself
    #[must_use]
    pub fn display_name(&self, id: ClassificationId) -> String {
        self.dictionary
            .name(id)
            .map_or_else(|| id.to_string(), str::to_string)
    }
}
