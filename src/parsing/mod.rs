//! Readers for classification and mapping files.
//!
//! - [`mapping`]: two-column `<key>\t<id>` text, optionally gzipped, shared
//!   by the accession and synonym loaders and the index builders
//! - [`tree`]: tab-separated `id  parent  rank  name  [tooltip]` trees
//! - [`ncbi`]: NCBI taxdump `nodes.dmp` and `names.dmp`
//!
//! ## Example
//!
//! ```rust,no_run
//! use taxon_resolver::parsing::ncbi::parse_taxdump_dir;
//! use std::path::Path;
//!
//! let taxonomy = parse_taxdump_dir(Path::new("taxdump")).unwrap();
//! println!("{} nodes", taxonomy.classification.tree.len());
//! ```

pub mod mapping;
pub mod ncbi;
pub mod tree;
