use serde::{Deserialize, Serialize};

/// Numeric id of a node in a classification (taxonomy or functional ontology).
///
/// Positive values are real nodes, `0` means "absent" and negative values are
/// reserved sentinels for non-assignment outcomes.
pub type ClassificationId = i32;

/// The read had no alignment hits
pub const NO_HITS: ClassificationId = -1;
/// The read had hits, but none could be assigned
pub const UNASSIGNED: ClassificationId = -2;
/// The read was filtered as low complexity
pub const LOW_COMPLEXITY: ClassificationId = -3;
/// The read was explicitly assigned to "unclassified"
pub const UNCLASSIFIED: ClassificationId = -4;
/// Reserved by one ontology; never produced here
pub const RESERVED_SLOT: ClassificationId = -5;
/// The read was flagged as a contaminant
pub const CONTAMINANT: ClassificationId = -6;

/// Check whether an id is one of the reserved non-assignment sentinels
#[must_use]
pub fn is_sentinel(id: ClassificationId) -> bool {
    matches!(
        id,
        NO_HITS | UNASSIGNED | LOW_COMPLEXITY | UNCLASSIFIED | RESERVED_SLOT | CONTAMINANT
    )
}

/// Name of the NCBI taxonomy classification. Only this classification
/// gets the free-text fallback.
pub const TAXONOMY: &str = "Taxonomy";

/// Check whether a classification name denotes the taxonomy
#[must_use]
pub fn is_taxonomy(classification: &str) -> bool {
    classification.eq_ignore_ascii_case(TAXONOMY)
}

/// Taxonomic rank of a node; `NoRank` is `0`
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Rank {
    #[default]
    NoRank = 0,
    Domain = 1,
    Kingdom = 2,
    Phylum = 3,
    Class = 4,
    Order = 5,
    Family = 6,
    Genus = 7,
    Species = 8,
    Subspecies = 9,
    Strain = 10,
}

impl Rank {
    /// Parse a rank name as used in NCBI `nodes.dmp` and tree files
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "domain" | "superkingdom" | "d" => Rank::Domain,
            "kingdom" | "k" => Rank::Kingdom,
            "phylum" | "p" => Rank::Phylum,
            "class" | "c" => Rank::Class,
            "order" | "o" => Rank::Order,
            "family" | "f" => Rank::Family,
            "genus" | "g" => Rank::Genus,
            "species" | "s" => Rank::Species,
            "subspecies" => Rank::Subspecies,
            "strain" | "t" => Rank::Strain,
            _ => Rank::NoRank,
        }
    }

    #[must_use]
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl std::fmt::Display for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::NoRank => "no rank",
            Self::Domain => "domain",
            Self::Kingdom => "kingdom",
            Self::Phylum => "phylum",
            Self::Class => "class",
            Self::Order => "order",
            Self::Family => "family",
            Self::Genus => "genus",
            Self::Species => "species",
            Self::Subspecies => "subspecies",
            Self::Strain => "strain",
        };
        write!(f, "{name}")
    }
}

/// How multiple candidate ids for one read are reduced to a single id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    /// Return the first valid, enabled id found
    #[default]
    FirstHit,
    /// Return the id found most often (ties go to the first seen)
    Majority,
    /// Return the lowest common ancestor of all ids found
    Lca,
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FirstHit => write!(f, "first-hit"),
            Self::Majority => write!(f, "majority"),
            Self::Lca => write!(f, "lca"),
        }
    }
}

/// Pluggable lookup strategy a classification can use to go from text to id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapType {
    /// Accession map held in memory or in a disk hash table
    Accession,
    /// Synonym (alternate name) map
    Synonyms,
    /// Accession map held in an embedded database
    EmbeddedDb,
}

impl MapType {
    pub const ALL: [MapType; 3] = [MapType::Accession, MapType::Synonyms, MapType::EmbeddedDb];
}

impl std::fmt::Display for MapType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Accession => write!(f, "accession"),
            Self::Synonyms => write!(f, "synonyms"),
            Self::EmbeddedDb => write!(f, "embedded-db"),
        }
    }
}
