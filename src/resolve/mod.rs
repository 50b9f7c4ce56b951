//! Header resolution.
//!
//! [`HeaderResolver::resolve`] runs these steps in order, each only when its
//! source is enabled and loaded:
//!
//! 1. tagged ids such as `tax|562`
//! 2. synonyms of up to five consecutive words
//! 3. accessions after tags such as `gb|`, then the first word
//! 4. for the taxonomy only, and only when nothing was found: semicolon
//!    paths, bracketed names and free-text segments
//!
//! Under `FirstHit` the first enabled hit ends resolution. Otherwise the
//! hits are reduced by LCA or majority vote. Disabled ids are only
//! reported when no enabled id was found.

pub mod reduce;
pub mod resolver;
pub mod text;
pub mod tokens;

pub use resolver::HeaderResolver;
