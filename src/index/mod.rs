//! Accession and synonym lookup backends.
//!
//! Every backend answers the same question, "which id does this key map
//! to?", through the [`AccessionLookup`] capability:
//!
//! - [`InMemoryTable`]: two-column text scanned into a hash map
//! - [`DiskHashTable`]: pre-built, memory-mapped open-addressing table
//! - [`EmbeddedDb`]: SQLite file with one table per classification
//!
//! [`AccessionIndex`] is the closed set of these backends. The backend is
//! picked from the file suffix when loading:
//!
//! | Suffix | Backend |
//! |--------|---------|
//! | `.idx` | `DiskHashTable` |
//! | `.db`, `.mdb`, `.sqlite` | `EmbeddedDb` |
//! | anything else (incl. `.gz`) | `InMemoryTable` |
//!
//! ## Example
//!
//! ```rust,no_run
//! use taxon_resolver::index::{AccessionIndex, AccessionLookup};
//! use taxon_resolver::utils::cancel::CancelToken;
//! use std::path::Path;
//!
//! let index = AccessionIndex::open(Path::new("acc2tax.idx"), "Taxonomy", &CancelToken::new()).unwrap();
//! let taxid = index.get("NC_000913");
//! ```

use std::path::Path;

use thiserror::Error;

use crate::core::types::ClassificationId;
use crate::parsing::mapping::ParseError;
use crate::utils::cancel::CancelToken;

pub mod disk;
pub mod embedded;
pub mod memory;
pub mod synonyms;

pub use disk::{DiskHashTable, DiskHashTableBuilder};
pub use embedded::EmbeddedDb;
pub use memory::InMemoryTable;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse mapping: {0}")]
    Parse(ParseError),

    #[error("Invalid index file: {0}")]
    InvalidFormat(String),

    #[error("Unsupported file format for {map_type}: {path}")]
    UnsupportedFormat { map_type: String, path: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Invalid table name: '{0}'")]
    InvalidTableName(String),

    #[error("A {backend} backend cannot serve the {map_type} map type")]
    WrongMapType { map_type: String, backend: String },

    #[error("Canceled by user")]
    Canceled,

    #[error("Registry for '{0}' has been closed")]
    Closed(String),
}

impl From<ParseError> for LoadError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::Canceled => LoadError::Canceled,
            other => LoadError::Parse(other),
        }
    }
}

/// Lookup of an accession (or other key) to a classification id.
/// `None` means the key is not mapped.
pub trait AccessionLookup {
    fn get(&self, accession: &str) -> Option<ClassificationId>;
}

/// Which backend a mapping file needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    InMemory,
    DiskHash,
    Embedded,
}

impl IndexKind {
    /// Detect the backend from a file suffix
    #[must_use]
    pub fn detect(path: &Path) -> Self {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        match extension.as_deref() {
            Some("idx") => IndexKind::DiskHash,
            Some("db" | "mdb" | "sqlite") => IndexKind::Embedded,
            _ => IndexKind::InMemory,
        }
    }
}

/// One of the three accession backends
#[derive(Debug)]
pub enum AccessionIndex {
    InMemory(InMemoryTable),
    DiskHash(DiskHashTable),
    Embedded(EmbeddedDb),
}

impl AccessionIndex {
    /// Open a mapping source, choosing the backend by file suffix.
    /// `classification` selects the table inside an embedded database.
    ///
    /// # Errors
    ///
    /// Returns a `LoadError` if the backend cannot be constructed.
    pub fn open(
        path: &Path,
        classification: &str,
        cancel: &CancelToken,
    ) -> Result<Self, LoadError> {
        match IndexKind::detect(path) {
            IndexKind::InMemory => Ok(Self::InMemory(InMemoryTable::load(path, cancel)?)),
            IndexKind::DiskHash => Ok(Self::DiskHash(DiskHashTable::open(path)?)),
            IndexKind::Embedded => Ok(Self::Embedded(EmbeddedDb::open(path, classification)?)),
        }
    }

    #[must_use]
    pub fn kind(&self) -> IndexKind {
        match self {
            Self::InMemory(_) => IndexKind::InMemory,
            Self::DiskHash(_) => IndexKind::DiskHash,
            Self::Embedded(_) => IndexKind::Embedded,
        }
    }

    /// Whether this backend needs a private handle per resolver
    #[must_use]
    pub fn is_embedded(&self) -> bool {
        matches!(self, Self::Embedded(_))
    }

    /// Open a second, independent handle to the same embedded database.
    /// Returns `None` for the shareable backends.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::Database` if the database cannot be reopened.
    pub fn reopen_embedded(&self) -> Result<Option<Self>, LoadError> {
        match self {
            Self::Embedded(db) => Ok(Some(Self::Embedded(db.reopen()?))),
            _ => Ok(None),
        }
    }
}

impl AccessionLookup for AccessionIndex {
    fn get(&self, accession: &str) -> Option<ClassificationId> {
        match self {
            Self::InMemory(table) => table.get(accession),
            Self::DiskHash(table) => table.get(accession),
            Self::Embedded(db) => db.get(accession),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_kind() {
        assert_eq!(IndexKind::detect(Path::new("a.idx")), IndexKind::DiskHash);
        assert_eq!(IndexKind::detect(Path::new("a.MDB")), IndexKind::Embedded);
        assert_eq!(IndexKind::detect(Path::new("a.sqlite")), IndexKind::Embedded);
        assert_eq!(IndexKind::detect(Path::new("a.tsv.gz")), IndexKind::InMemory);
        assert_eq!(IndexKind::detect(Path::new("mapping")), IndexKind::InMemory);
    }

    #[test]
    fn test_open_in_memory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("acc.tsv");
        std::fs::write(&path, "AB123456\t9606\n").unwrap();

        let index = AccessionIndex::open(&path, "Taxonomy", &CancelToken::new()).unwrap();
        assert_eq!(index.kind(), IndexKind::InMemory);
        assert!(!index.is_embedded());
        assert!(index.reopen_embedded().unwrap().is_none());
        assert_eq!(index.get("AB123456"), Some(9606));
        assert_eq!(index.get("AB000000"), None);
    }

    #[test]
    fn test_canceled_load_maps_to_canceled() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("acc.tsv");
        std::fs::write(&path, "AB123456\t9606\n").unwrap();

        let cancel = CancelToken::new();
        cancel.cancel();
        let result = AccessionIndex::open(&path, "Taxonomy", &cancel);
        assert!(matches!(result, Err(LoadError::Canceled)));
    }
}
