//! Core data types for classification resolution.
//!
//! This module provides the fundamental types used throughout the library:
//!
//! - [`ClassificationId`]: Numeric node id, with reserved negative sentinels
//! - [`TaxonomyTree`]: Rooted tree with ancestor queries and LCA
//! - [`NameIdDictionary`]: Exact-name lookup of ids, with rank and tooltip tables
//! - [`Classification`]: A named tree plus its dictionary
//! - [`Algorithm`], [`MapType`], [`Rank`]: Configuration and metadata enums
//!
//! ## Sentinels
//!
//! | Constant | Value | Meaning |
//! |----------|-------|---------|
//! | `NO_HITS` | -1 | Read had no hits |
//! | `UNASSIGNED` | -2 | Hits could not be assigned |
//! | `LOW_COMPLEXITY` | -3 | Low complexity read |
//! | `UNCLASSIFIED` | -4 | Explicitly unclassified |
//! | `CONTAMINANT` | -6 | Contaminant |
//!
//! `-5` is reserved by one ontology. Sentinels are never tree ids, and a
//! resolver returns `0` when nothing was found; mapping that to a sentinel is
//! up to the caller.
//!
//! [`ClassificationId`]: types::ClassificationId
//! [`TaxonomyTree`]: tree::TaxonomyTree
//! [`NameIdDictionary`]: dictionary::NameIdDictionary
//! [`Classification`]: classification::Classification
//! [`Algorithm`]: types::Algorithm
//! [`MapType`]: types::MapType
//! [`Rank`]: types::Rank

pub mod classification;
pub mod dictionary;
pub mod tree;
pub mod types;
