//! Centralized validation and helper functions.

/// Maximum length of a classification name used as a database table name
pub const MAX_TABLE_NAME_LENGTH: usize = 64;

/// Maximum number of "unparseable id" warnings logged per registry
pub const MAX_PARSE_WARNINGS: usize = 5;

/// Validate that a classification name can be used verbatim as an SQL table
/// name (ASCII letters, digits and underscores, not starting with a digit).
///
/// Table names cannot be bound as query parameters, so anything else is
/// rejected before it reaches a statement.
///
/// # Examples
///
/// ```
/// use taxon_resolver::utils::validation::is_valid_table_name;
///
/// assert!(is_valid_table_name("Taxonomy"));
/// assert!(is_valid_table_name("EGGNOG_v5"));
/// assert!(!is_valid_table_name("KEGG; DROP TABLE x"));
/// assert!(!is_valid_table_name("9lives"));
/// ```
#[must_use]
pub fn is_valid_table_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_TABLE_NAME_LENGTH
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Strip a trailing `.version` from an accession (`NC_000913.3` -> `NC_000913`).
/// Returns `None` if there is no version suffix.
#[must_use]
pub fn strip_accession_version(accession: &str) -> Option<&str> {
    let (base, version) = accession.rsplit_once('.')?;
    if !base.is_empty() && !version.is_empty() && version.chars().all(|c| c.is_ascii_digit()) {
        Some(base)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_names() {
        assert!(is_valid_table_name("SEED"));
        assert!(!is_valid_table_name(""));
        assert!(!is_valid_table_name("a-b"));
        assert!(!is_valid_table_name(&"x".repeat(MAX_TABLE_NAME_LENGTH + 1)));
    }

    #[test]
    fn test_strip_accession_version() {
        assert_eq!(strip_accession_version("NC_000913.3"), Some("NC_000913"));
        assert_eq!(strip_accession_version("AB123456"), None);
        assert_eq!(strip_accession_version("AB123456."), None);
        assert_eq!(strip_accession_version("XP_1.a"), None);
    }
}
