use std::io::BufRead;
use std::path::Path;

use crate::core::classification::Classification;
use crate::core::dictionary::NameIdDictionary;
use crate::core::tree::{TaxonomyTree, TreeNode};
use crate::core::types::{ClassificationId, Rank};
use crate::parsing::mapping::{open_text, ParseError};

/// Parse a tree file with columns: id, parent, rank, name, [tooltip]
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, or other parse errors
/// if the content is invalid.
pub fn parse_tree_file(path: &Path, classification: &str) -> Result<Classification, ParseError> {
    let reader = open_text(path)?;
    parse_tree(reader, classification)
}

/// Parse tab-separated tree text. A parent of `0` (or the node's own id)
/// marks the root.
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` for lines with fewer than 4 fields or
/// invalid ids, and `ParseError::Tree` if the nodes do not form a tree.
pub fn parse_tree<R: BufRead>(reader: R, classification: &str) -> Result<Classification, ParseError> {
    let mut nodes = Vec::new();
    let mut dictionary = NameIdDictionary::new();

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let line_num = i + 1;

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 4 {
            return Err(ParseError::InvalidFormat(format!(
                "Line {line_num} has fewer than 4 fields"
            )));
        }

        let id = parse_id(fields[0], line_num)?;
        let parent = parse_id(fields[1], line_num)?;
        let rank = Rank::parse(fields[2]);
        let name = fields[3].trim();

        nodes.push(TreeNode::new(id, (parent != 0).then_some(parent), rank));
        if !name.is_empty() {
            dictionary.put(name, id);
        }
        dictionary.set_rank(id, rank);
        if let Some(tooltip) = fields.get(4).map(|s| s.trim()).filter(|s| !s.is_empty()) {
            dictionary.set_tooltip(id, tooltip);
        }
    }

    let tree = TaxonomyTree::from_nodes(nodes)?;
    Ok(Classification::new(classification, tree, dictionary))
}

fn parse_id(field: &str, line_num: usize) -> Result<ClassificationId, ParseError> {
    field.trim().parse().map_err(|_| {
        ParseError::InvalidFormat(format!("Invalid id on line {line_num}: '{field}'"))
    })
}
