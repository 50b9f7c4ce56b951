use std::io::BufRead;
use std::path::Path;

use crate::core::classification::Classification;
use crate::core::dictionary::NameIdDictionary;
use crate::core::tree::{TaxonomyTree, TreeNode};
use crate::core::types::{ClassificationId, Rank, TAXONOMY};
use crate::index::synonyms::SynonymIndex;
use crate::parsing::mapping::{open_text, ParseError};

/// Name classes in `names.dmp` that become synonyms
const SYNONYM_CLASSES: &[&str] = &[
    "synonym",
    "equivalent name",
    "genbank synonym",
    "genbank common name",
    "common name",
    "blast name",
    "acronym",
    "genbank acronym",
];

/// Taxonomy parsed from an NCBI taxdump
#[derive(Debug)]
pub struct NcbiTaxonomy {
    pub classification: Classification,
    pub synonyms: SynonymIndex,
}

/// Parse `nodes.dmp` and `names.dmp` from a taxdump directory
///
/// # Errors
///
/// Returns `ParseError::Io` if either file cannot be read, or other parse
/// errors if the content is invalid.
pub fn parse_taxdump_dir(dir: &Path) -> Result<NcbiTaxonomy, ParseError> {
    let nodes = open_text(&dir.join("nodes.dmp"))?;
    let names = open_text(&dir.join("names.dmp"))?;
    parse_taxdump(nodes, names)
}

/// Parse NCBI taxdump `nodes.dmp` and `names.dmp` content.
///
/// Scientific names (and their unique variants) go into the dictionary; the
/// other common name classes go into the synonym index.
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` for malformed lines and
/// `ParseError::Tree` if the nodes do not form a tree.
pub fn parse_taxdump<N: BufRead, M: BufRead>(nodes: N, names: M) -> Result<NcbiTaxonomy, ParseError> {
    let mut tree_nodes = Vec::new();
    let mut dictionary = NameIdDictionary::new();

    for (i, line) in nodes.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let fields = split_dmp_line(&line);
        if fields.len() < 3 {
            return Err(ParseError::InvalidFormat(format!(
                "nodes.dmp line {} has fewer than 3 fields",
                i + 1
            )));
        }
        let id = parse_dmp_id(fields[0], i + 1)?;
        let parent = parse_dmp_id(fields[1], i + 1)?;
        let rank = Rank::parse(fields[2]);
        tree_nodes.push(TreeNode::new(id, Some(parent), rank));
        dictionary.set_rank(id, rank);
    }

    let mut synonyms = SynonymIndex::new();
    for (i, line) in names.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let fields = split_dmp_line(&line);
        if fields.len() < 4 {
            return Err(ParseError::InvalidFormat(format!(
                "names.dmp line {} has fewer than 4 fields",
                i + 1
            )));
        }
        let id = parse_dmp_id(fields[0], i + 1)?;
        let (name, unique_name, name_class) = (fields[1], fields[2], fields[3]);

        if name_class == "scientific name" {
            dictionary.put(name, id);
            if !unique_name.is_empty() {
                dictionary.put(unique_name, id);
            }
        } else if SYNONYM_CLASSES.contains(&name_class) {
            synonyms.put(name, id);
        }
    }

    let tree = TaxonomyTree::from_nodes(tree_nodes)?;
    Ok(NcbiTaxonomy {
        classification: Classification::new(TAXONOMY, tree, dictionary),
        synonyms,
    })
}

fn split_dmp_line(line: &str) -> Vec<&str> {
    line.trim_end_matches(['\t', '|'])
        .split("\t|\t")
        .map(str::trim)
        .collect()
}

fn parse_dmp_id(field: &str, line_num: usize) -> Result<ClassificationId, ParseError> {
    field.parse().map_err(|_| {
        ParseError::InvalidFormat(format!("Invalid taxid on line {line_num}: '{field}'"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const NODES: &str = "1\t|\t1\t|\tno rank\t|\t\t|
2\t|\t131567\t|\tsuperkingdom\t|\t\t|
131567\t|\t1\t|\tno rank\t|\t\t|
562\t|\t2\t|\tspecies\t|\t\t|
";

    const NAMES: &str = "1\t|\troot\t|\t\t|\tscientific name\t|
2\t|\tBacteria\t|\tBacteria <bacteria>\t|\tscientific name\t|
2\t|\teubacteria\t|\t\t|\tgenbank common name\t|
131567\t|\tcellular organisms\t|\t\t|\tscientific name\t|
562\t|\tEscherichia coli\t|\t\t|\tscientific name\t|
562\t|\tE. coli\t|\t\t|\tcommon name\t|
562\t|\tMigula 1895\t|\t\t|\tauthority\t|
";

    #[test]
    fn test_parse_taxdump() {
        let ncbi = parse_taxdump(Cursor::new(NODES), Cursor::new(NAMES)).unwrap();
        let classification = &ncbi.classification;

        assert_eq!(classification.name, "Taxonomy");
        assert_eq!(classification.tree.root(), 1);
        assert_eq!(classification.tree.parent(2).unwrap(), Some(131_567));
        assert_eq!(classification.dictionary.get("Bacteria"), Some(2));
        assert_eq!(classification.dictionary.get("Bacteria <bacteria>"), Some(2));
        assert_eq!(classification.dictionary.rank(2), Rank::Domain);

        assert_eq!(ncbi.synonyms.get("E. coli"), Some(562));
        assert_eq!(ncbi.synonyms.get("eubacteria"), Some(2));
        assert_eq!(ncbi.synonyms.get("Migula 1895"), None);
    }

    #[test]
    fn test_split_dmp_line() {
        assert_eq!(
            split_dmp_line("562\t|\tE. coli\t|\t\t|\tcommon name\t|"),
            vec!["562", "E. coli", "", "common name"]
        );
    }
}
