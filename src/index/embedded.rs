use std::path::{Path, PathBuf};
use std::time::Instant;

use parking_lot::Mutex;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use tracing::{debug, info};

use crate::core::types::ClassificationId;
use crate::index::{AccessionLookup, LoadError};
use crate::parsing::mapping::read_mapping_file;
use crate::utils::cancel::CancelToken;
use crate::utils::validation::is_valid_table_name;

/// Accession map stored in an SQLite file with one table per
/// classification: `accession TEXT PRIMARY KEY, id INTEGER`.
///
/// One handle serves one resolver. Concurrent workers each open their own
/// handle to the same file with [`EmbeddedDb::reopen`]; the mutex only
/// guards against accidental sharing and is never contended in that setup.
#[derive(Debug)]
pub struct EmbeddedDb {
    path: PathBuf,
    table: String,
    query: String,
    conn: Mutex<Connection>,
}

impl EmbeddedDb {
    /// Open a database read-only and check that the classification's table
    /// exists with the expected columns.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::InvalidTableName` for names that are not plain
    /// identifiers, `LoadError::InvalidFormat` if the table is missing and
    /// `LoadError::Database` for SQLite failures.
    pub fn open(path: &Path, classification: &str) -> Result<Self, LoadError> {
        if !is_valid_table_name(classification) {
            return Err(LoadError::InvalidTableName(classification.to_string()));
        }
        if !path.exists() {
            return Err(LoadError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("database not found: {}", path.display()),
            )));
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        let tables: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [classification],
            |row| row.get(0),
        )?;
        if tables == 0 {
            return Err(LoadError::InvalidFormat(format!(
                "{}: no table '{classification}'",
                path.display()
            )));
        }

        let query = format!("SELECT id FROM \"{classification}\" WHERE accession = ?1");
        // Fails early if the columns are wrong
        conn.prepare_cached(&query)?;

        debug!("Opened {} table in {}", classification, path.display());

        Ok(Self {
            path: path.to_path_buf(),
            table: classification.to_string(),
            query,
            conn: Mutex::new(conn),
        })
    }

    /// Open a fresh, independent handle to the same database and table
    ///
    /// # Errors
    ///
    /// Returns a `LoadError` if the database can no longer be opened.
    pub fn reopen(&self) -> Result<Self, LoadError> {
        Self::open(&self.path, &self.table)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Close the handle, reporting any error SQLite raises on close
    ///
    /// # Errors
    ///
    /// Returns `LoadError::Database` if SQLite fails to close cleanly.
    pub fn close(self) -> Result<(), LoadError> {
        self.conn.into_inner().close().map_err(|(_, e)| e.into())
    }

    /// Create (or extend) a classification table from a two-column mapping
    /// file. Returns the number of rows written.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::InvalidTableName`, `LoadError::Parse`,
    /// `LoadError::Canceled` or `LoadError::Database`.
    pub fn write_mapping(
        db_path: &Path,
        classification: &str,
        mapping: &Path,
        cancel: &CancelToken,
    ) -> Result<usize, LoadError> {
        if !is_valid_table_name(classification) {
            return Err(LoadError::InvalidTableName(classification.to_string()));
        }
        let start = Instant::now();
        let mut conn = Connection::open(db_path)?;
        conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS \"{classification}\" \
                 (accession TEXT PRIMARY KEY, id INTEGER NOT NULL)"
            ),
            [],
        )?;

        let tx = conn.transaction()?;
        let mut insert_error = None;
        let count = {
            let mut stmt = tx.prepare(&format!(
                "INSERT OR REPLACE INTO \"{classification}\" (accession, id) VALUES (?1, ?2)"
            ))?;
            read_mapping_file(mapping, cancel, |accession, id| {
                if insert_error.is_none() {
                    if let Err(e) = stmt.execute(params![accession, id]) {
                        insert_error = Some(e);
                    }
                }
            })?
        };
        if let Some(e) = insert_error {
            return Err(e.into());
        }
        tx.commit()?;

        info!(
            "Wrote {count} accessions to table '{classification}' in {} in {:.1}s",
            db_path.display(),
            start.elapsed().as_secs_f64()
        );
        Ok(count)
    }
}

impl AccessionLookup for EmbeddedDb {
    fn get(&self, accession: &str) -> Option<ClassificationId> {
        let conn = self.conn.lock();
        let result = conn.prepare_cached(&self.query).and_then(|mut stmt| {
            stmt.query_row([accession], |row| row.get::<_, i64>(0))
                .optional()
        });
        match result {
            Ok(id) => id
                .and_then(|id| ClassificationId::try_from(id).ok())
                .filter(|&id| id > 0),
            Err(e) => {
                debug!("Lookup of '{accession}' in {} failed: {e}", self.table);
                None
            }
        }
    }
}
