//! Free-text heuristics for taxonomy headers: semicolon paths and
//! bracketed names.

/// A header is treated as a taxonomic path when it has at least one `;`
/// and at least one `;` per 32 bytes.
#[must_use]
pub fn looks_like_path(text: &str) -> bool {
    let separators = text.bytes().filter(|&b| b == b';').count();
    separators >= 1 && separators >= text.len() / 32
}

/// Remove a QIIME/Greengenes (`k__`, `g__`) or SILVA (`D_0__`, `D_11__`)
/// rank prefix from a path element
#[must_use]
pub fn strip_rank_prefix(name: &str) -> &str {
    let Some(pos) = name.find("__") else {
        return name;
    };
    let prefix = &name[..pos];
    let single_letter = prefix.len() == 1 && prefix.bytes().all(|b| b.is_ascii_alphabetic());
    let silva = prefix
        .strip_prefix("D_")
        .is_some_and(|level| !level.is_empty() && level.bytes().all(|b| b.is_ascii_digit()));
    if single_letter || silva {
        name[pos + 2..].trim_start()
    } else {
        name
    }
}

/// Names of a path, in path order, with rank prefixes removed and empty
/// elements (`g__;s__`) skipped
pub fn path_names(text: &str) -> impl Iterator<Item = &str> {
    text.split(';')
        .map(|element| strip_rank_prefix(element.trim()).trim())
        .filter(|name| !name.is_empty())
}

/// Contents of `[...]` and `(...)` groups that start with an uppercase
/// letter, in header order. Groups are not nested; an unclosed group ends
/// the scan.
#[must_use]
pub fn bracketed(text: &str) -> Vec<&str> {
    let mut groups = Vec::new();
    let mut rest = text;
    while let Some(open) = rest.find(['[', '(']) {
        let close = if rest.as_bytes()[open] == b'[' { ']' } else { ')' };
        let inner_start = open + 1;
        let Some(len) = rest[inner_start..].find(close) else {
            break;
        };
        let inner = rest[inner_start..inner_start + len].trim();
        if inner.starts_with(|c: char| c.is_uppercase()) {
            groups.push(inner);
        }
        rest = &rest[inner_start + len + 1..];
    }
    groups
}
