use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use thiserror::Error;

use crate::core::tree::TreeError;
use crate::core::types::ClassificationId;
use crate::utils::cancel::CancelToken;

/// Lines read between two cancellation checks
const CANCEL_CHECK_INTERVAL: usize = 10_000;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Invalid tree: {0}")]
    Tree(#[from] TreeError),

    #[error("Canceled by user")]
    Canceled,
}

/// Open a text file for buffered reading, transparently decompressing
/// files with a `.gz` suffix.
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be opened.
pub fn open_text(path: &Path) -> Result<Box<dyn BufRead>, ParseError> {
    let file = File::open(path)?;
    let is_gzip = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("gz"));

    if is_gzip {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Read two-column `<key>\t<id>` text, calling `on_entry` for each entry.
///
/// Blank lines and lines starting with `#` are skipped, as are entries whose
/// id is not positive (`0` and sentinels never become lookup results).
/// Returns the number of entries passed to `on_entry`.
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` for a line without a second column or
/// with a non-integer id, `ParseError::Io` on read failure and
/// `ParseError::Canceled` if the token is canceled.
pub fn read_mapping<R, F>(
    reader: R,
    cancel: &CancelToken,
    mut on_entry: F,
) -> Result<usize, ParseError>
where
    R: BufRead,
    F: FnMut(&str, ClassificationId),
{
    let mut count = 0;

    for (i, line) in reader.lines().enumerate() {
        if i % CANCEL_CHECK_INTERVAL == 0 && cancel.is_canceled() {
            return Err(ParseError::Canceled);
        }

        let line = line?;
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }

        // Line numbers in errors are 1-based for user friendliness
        let line_num = i + 1;

        let mut fields = line.split('\t');
        let key = fields.next().unwrap_or_default().trim();
        let value = fields.next().ok_or_else(|| {
            ParseError::InvalidFormat(format!("Line {line_num} has fewer than 2 fields"))
        })?;
        let id: ClassificationId = value.trim().parse().map_err(|_| {
            ParseError::InvalidFormat(format!("Invalid id on line {line_num}: '{value}'"))
        })?;

        if key.is_empty() || id <= 0 {
            continue;
        }

        on_entry(key, id);
        count += 1;
    }

    Ok(count)
}

/// [`read_mapping`] over a file path (gzip aware)
///
/// # Errors
///
/// See [`open_text`] and [`read_mapping`].
pub fn read_mapping_file<F>(
    path: &Path,
    cancel: &CancelToken,
    on_entry: F,
) -> Result<usize, ParseError>
where
    F: FnMut(&str, ClassificationId),
{
    let reader = open_text(path)?;
    read_mapping(reader, cancel, on_entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    fn collect(text: &str) -> Result<Vec<(String, ClassificationId)>, ParseError> {
        let mut entries = Vec::new();
        read_mapping(Cursor::new(text), &CancelToken::new(), |k, v| {
            entries.push((k.to_string(), v));
        })?;
        Ok(entries)
    }

    #[test]
    fn test_read_mapping() {
        let text = "# accession\ttaxid\nAB123456\t9606\n\nNC_000913\t562\r\nXP_1\t0\n";
        let entries = collect(text).unwrap();
        assert_eq!(
            entries,
            vec![("AB123456".to_string(), 9606), ("NC_000913".to_string(), 562)]
        );
    }

    #[test]
    fn test_extra_columns_ignored() {
        let entries = collect("AB1\t7\tcomment\n").unwrap();
        assert_eq!(entries, vec![("AB1".to_string(), 7)]);
    }

    #[test]
    fn test_invalid_lines() {
        assert!(matches!(
            collect("AB123456 9606\n"),
            Err(ParseError::InvalidFormat(msg)) if msg.contains("Line 1")
        ));
        assert!(matches!(
            collect("A\t1\nB\tx\n"),
            Err(ParseError::InvalidFormat(msg)) if msg.contains("line 2")
        ));
    }

    #[test]
    fn test_canceled() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let result = read_mapping(Cursor::new("A\t1\n"), &cancel, |_, _| {});
        assert!(matches!(result, Err(ParseError::Canceled)));
    }

    #[test]
    fn test_read_gzip_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.tsv.gz");
        {
            let file = File::create(&path).unwrap();
            let mut encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
            encoder.write_all(b"AB1\t42\nAB2\t43\n").unwrap();
            encoder.finish().unwrap();
        }

        let mut total = 0;
        let count = read_mapping_file(&path, &CancelToken::new(), |_, v| total += v).unwrap();
        assert_eq!(count, 2);
        assert_eq!(total, 85);
    }
}
