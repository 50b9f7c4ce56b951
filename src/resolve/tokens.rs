//! Header tokenization: tagged runs, the first word and word spans.

/// Characters of a tagged numeric id run
#[must_use]
pub fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Characters of an accession token
#[must_use]
pub fn is_accession_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

/// Word delimiters for synonym and segment lookups
#[must_use]
pub fn is_word_delimiter(c: char) -> bool {
    c.is_whitespace() || matches!(c, '|' | ';' | ',' | '[' | ']' | '(' | ')' | '>')
}

/// The run of `is_char` characters following every occurrence of `tag`,
/// in header order. Occurrences followed by an empty run are skipped.
///
/// ```
/// use taxon_resolver::resolve::tokens::{is_id_char, tagged_tokens};
///
/// let runs: Vec<&str> = tagged_tokens("tax|562|tax|9606 x", "tax|", is_id_char).collect();
/// assert_eq!(runs, vec!["562", "9606"]);
/// ```
pub fn tagged_tokens<'a>(
    text: &'a str,
    tag: &'a str,
    is_char: fn(char) -> bool,
) -> impl Iterator<Item = &'a str> + 'a {
    text.match_indices(tag).filter_map(move |(start, _)| {
        let rest = &text[start + tag.len()..];
        let end = rest.find(|c: char| !is_char(c)).unwrap_or(rest.len());
        (end > 0).then(|| &rest[..end])
    })
}

/// Accession run after a tag with trailing dots removed (`AB1.` -> `AB1`)
#[must_use]
pub fn trim_accession(token: &str) -> &str {
    token.trim_end_matches('.')
}

/// First word of a header: leading `>` and whitespace removed, ended by
/// whitespace or `|`
#[must_use]
pub fn first_word(header: &str) -> Option<&str> {
    let text = header.trim_start();
    let text = text.strip_prefix('>').unwrap_or(text).trim_start();
    let end = text
        .find(|c: char| c.is_whitespace() || c == '|')
        .unwrap_or(text.len());
    (end > 0).then(|| &text[..end])
}

/// Fill `spans` with the byte ranges of the words of `text`
pub fn word_spans_into(text: &str, spans: &mut Vec<(usize, usize)>) {
    spans.clear();
    let mut start = None;
    for (i, c) in text.char_indices() {
        if is_word_delimiter(c) {
            if let Some(s) = start.take() {
                spans.push((s, i));
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        spans.push((s, text.len()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tagged_tokens() {
        let header = ">gb|AB123456.1| ref|NC_000913.3. gb|";
        let runs: Vec<&str> = tagged_tokens(header, "gb|", is_accession_char).collect();
        assert_eq!(runs, vec!["AB123456.1"]);

        let runs: Vec<&str> = tagged_tokens(header, "ref|", is_accession_char).collect();
        assert_eq!(runs, vec!["NC_000913.3."]);
        assert_eq!(trim_accession(runs[0]), "NC_000913.3");

        let runs: Vec<&str> = tagged_tokens("tax|12x4;tax|-3", "tax|", is_id_char).collect();
        assert_eq!(runs, vec!["12x4"]);
    }

    #[test]
    fn test_tags_are_case_sensitive() {
        assert_eq!(tagged_tokens("TAX|562", "tax|", is_id_char).count(), 0);
    }

    #[test]
    fn test_first_word() {
        assert_eq!(first_word(">NC_000913.3 Escherichia coli"), Some("NC_000913.3"));
        assert_eq!(first_word("  > AB1|rest"), Some("AB1"));
        assert_eq!(first_word(">"), None);
        assert_eq!(first_word(""), None);
    }

    #[test]
    fn test_word_spans() {
        let text = ">read1 [Escherichia coli], strain|K-12";
        let mut spans = Vec::new();
        word_spans_into(text, &mut spans);
        let words: Vec<&str> = spans.iter().map(|&(s, e)| &text[s..e]).collect();
        assert_eq!(words, vec!["read1", "Escherichia", "coli", "strain", "K-12"]);

        word_spans_into("  ;; ", &mut spans);
        assert!(spans.is_empty());
    }
}
