//! # taxon-resolver
//!
//! A library for assigning taxonomy and functional-ontology ids to sequence
//! read headers.
//!
//! Read headers from reference databases carry their classification in many
//! shapes: an explicit `tax|562`, an accession such as `gb|NC_000913.3|`, a
//! bracketed organism name, or a QIIME path like
//! `k__Bacteria;p__Proteobacteria`. `taxon-resolver` tries each of these in a
//! fixed order against the lookup sources loaded for a classification and
//! reduces the hits to one id.
//!
//! ## Features
//!
//! - **Tagged ids**: configurable tags per classification (`tax|`, `kegg|`, ...)
//! - **Accession lookup**: in-memory, memory-mapped disk table or SQLite
//! - **Synonyms and names**: NCBI synonyms, bracketed names and free text
//! - **Reduction**: first hit, majority vote or lowest common ancestor
//! - **Disabled ids**: ids reported only when nothing else is found
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use taxon_resolver::{MapRegistry, MapType};
//! use taxon_resolver::parsing::ncbi::parse_taxdump_dir;
//! use taxon_resolver::utils::cancel::CancelToken;
//!
//! let taxonomy = parse_taxdump_dir(Path::new("taxdump")).unwrap();
//! let registry = MapRegistry::with_defaults(taxonomy.classification);
//! registry.install_synonyms(taxonomy.synonyms).unwrap();
//! registry
//!     .load(MapType::Accession, Path::new("acc2tax.idx"), false, &CancelToken::new())
//!     .unwrap();
//!
//! let mut resolver = registry.create_resolver().unwrap();
//! for header in [">gb|NC_000913.3| chromosome", ">read7 [Escherichia coli]"] {
//!     println!("{header}: {}", resolver.resolve(header).unwrap());
//! }
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Ids, ranks, the classification tree and name dictionary
//! - [`index`]: Accession and synonym lookup backends
//! - [`mapping`]: Per-classification registries and resolution options
//! - [`resolve`]: Header resolution
//! - [`parsing`]: Readers for tree, taxdump and mapping files
//! - [`cli`]: Command-line interface implementation

pub mod cli;
pub mod core;
pub mod index;
pub mod mapping;
pub mod parsing;
pub mod resolve;
pub mod utils;

// Re-export commonly used types for convenience
pub use crate::core::classification::Classification;
pub use crate::core::dictionary::NameIdDictionary;
pub use crate::core::tree::{TaxonomyTree, TreeError, TreeNode};
pub use crate::core::types::*;
pub use crate::index::{AccessionIndex, AccessionLookup, LoadError};
pub use crate::mapping::{MapRegistry, Registries, ResolverOptions};
pub use crate::resolve::HeaderResolver;
