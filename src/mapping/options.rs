use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::types::{is_taxonomy, Algorithm, ClassificationId};

/// Default accession tags
pub const DEFAULT_ACCESSION_TAGS: &[&str] = &["gb|", "ref|"];

/// Default id tags for the taxonomy
pub const DEFAULT_TAXONOMY_TAGS: &[&str] = &["tax|", "taxid|"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// Resolution options of one classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverOptions {
    /// Literal prefixes that introduce an embedded numeric id (e.g. `tax|`)
    pub id_tags: Vec<String>,
    /// Whether tagged ids are extracted at all
    pub use_id_parsing: bool,
    /// Literal prefixes that introduce an accession (e.g. `gb|`)
    pub accession_tags: Vec<String>,
    /// Also try the first word of a header as an accession
    pub first_word_is_accession: bool,
    /// Free-text and path parsing (taxonomy only)
    pub use_text_parsing: bool,
    pub algorithm: Algorithm,
    /// Ids only reported when nothing else is found
    pub disabled_ids: BTreeSet<ClassificationId>,
}

impl ResolverOptions {
    /// Defaults for a classification: the taxonomy uses `tax|`/`taxid|` and
    /// text parsing, other classifications use `<lowercase name>|` as tag.
    #[must_use]
    pub fn for_classification(classification: &str) -> Self {
        let taxonomy = is_taxonomy(classification);
        let id_tags = if taxonomy {
            DEFAULT_TAXONOMY_TAGS.iter().map(|s| (*s).to_string()).collect()
        } else {
            vec![format!("{}|", classification.to_lowercase())]
        };

        Self {
            id_tags,
            use_id_parsing: true,
            accession_tags: DEFAULT_ACCESSION_TAGS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            first_word_is_accession: true,
            use_text_parsing: taxonomy,
            algorithm: Algorithm::default(),
            disabled_ids: BTreeSet::new(),
        }
    }
}

/// Partial options as written in a config file; unset fields keep the
/// classification defaults
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptionsOverride {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_id_parsing: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accession_tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_word_is_accession: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_text_parsing: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<Algorithm>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled_ids: Option<BTreeSet<ClassificationId>>,
}

impl OptionsOverride {
    pub fn apply(&self, options: &mut ResolverOptions) {
        if let Some(tags) = &self.id_tags {
            options.id_tags.clone_from(tags);
        }
        if let Some(v) = self.use_id_parsing {
            options.use_id_parsing = v;
        }
        if let Some(tags) = &self.accession_tags {
            options.accession_tags.clone_from(tags);
        }
        if let Some(v) = self.first_word_is_accession {
            options.first_word_is_accession = v;
        }
        if let Some(v) = self.use_text_parsing {
            options.use_text_parsing = v;
        }
        if let Some(v) = self.algorithm {
            options.algorithm = v;
        }
        if let Some(ids) = &self.disabled_ids {
            options.disabled_ids.clone_from(ids);
        }
    }
}

/// Config file: classification name to option overrides.
///
/// ```json
/// {
///   "Taxonomy": { "algorithm": "lca", "disabled_ids": [32644] },
///   "KEGG": { "id_tags": ["ko|"] }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResolverConfig {
    pub classifications: BTreeMap<String, OptionsOverride>,
}

impl ResolverConfig {
    /// Load a JSON config file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ReadError` if the file cannot be read and
    /// `ConfigError::ParseError` for invalid JSON or unknown fields.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// # Errors
    ///
    /// Returns `ConfigError::ParseError` for invalid JSON or unknown fields.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Options for a classification: its defaults with the file's overrides
    #[must_use]
    pub fn options_for(&self, classification: &str) -> ResolverOptions {
        let mut options = ResolverOptions::for_classification(classification);
        if let Some(overrides) = self.classifications.get(classification) {
            overrides.apply(&mut options);
        }
        options
    }
}
