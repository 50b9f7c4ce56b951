//! Per-classification registries of lookup sources and resolution options.
//!
//! A [`MapRegistry`] owns the loaded backends of one classification and its
//! [`ResolverOptions`]. Resolvers are created from a registry and work on a
//! private snapshot of it, so loads and option changes never race with
//! resolution:
//!
//! ```rust,no_run
//! use std::path::Path;
//! use taxon_resolver::core::types::MapType;
//! use taxon_resolver::mapping::MapRegistry;
//! use taxon_resolver::parsing::tree::parse_tree_file;
//! use taxon_resolver::utils::cancel::CancelToken;
//!
//! let classification = parse_tree_file(Path::new("taxonomy.tsv"), "Taxonomy").unwrap();
//! let registry = MapRegistry::with_defaults(classification);
//! registry
//!     .load(MapType::Accession, Path::new("acc2tax.idx"), false, &CancelToken::new())
//!     .unwrap();
//!
//! let mut resolver = registry.create_resolver().unwrap();
//! let taxid = resolver.resolve(">gb|NC_000913.3| Escherichia coli").unwrap();
//! ```

pub mod options;
pub mod registry;

pub use options::{ConfigError, OptionsOverride, ResolverConfig, ResolverOptions};
pub use registry::{LoadStatus, MapRegistry, Registries, RegistrySnapshot};
