//! Command-line interface for taxon-resolver.
//!
//! Available commands:
//!
//! - **resolve**: Assign a classification id to every read header
//! - **build-index**: Convert a mapping file into a disk table or SQLite table
//! - **lca**: Print the lowest common ancestor of a set of ids
//!
//! ## Usage
//!
//! ```text
//! # Resolve FASTA headers against an NCBI taxdump and an accession table
//! taxon-resolver resolve reads.fasta --ncbi-dump taxdump/ --accessions acc2tax.idx
//!
//! # Pipe headers, LCA of all hits, JSON output
//! grep '>' hits.fasta | taxon-resolver resolve - --tree tax.tsv --algorithm lca --format json
//!
//! # Build a memory-mapped accession table once
//! taxon-resolver build-index acc2tax.tsv.gz acc2tax.idx
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use crate::core::classification::Classification;
use crate::core::types::TAXONOMY;
use crate::index::synonyms::SynonymIndex;
use crate::parsing::ncbi::parse_taxdump_dir;
use crate::parsing::tree::parse_tree_file;

pub mod build_index;
pub mod lca;
pub mod resolve;

#[derive(Parser)]
#[command(name = "taxon-resolver")]
#[command(author = "Fulcrum Genomics")]
#[command(version)]
#[command(about = "Assign taxonomy and ontology ids to sequence read headers")]
#[command(
    long_about = "taxon-resolver assigns each read header a classification id.\n\nIt combines:\n- Ids embedded behind tags such as tax|562\n- Accession lookups (in memory, memory-mapped or SQLite)\n- Synonym and free-text name lookups for the taxonomy"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve read headers to classification ids
    Resolve(resolve::ResolveArgs),

    /// Build an accession index from a mapping file
    BuildIndex(build_index::BuildIndexArgs),

    /// Lowest common ancestor of ids
    Lca(lca::LcaArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}

/// Where the classification tree comes from
#[derive(Args)]
pub struct TreeArgs {
    /// Tree file: id, parent, rank, name, [tooltip] (tab-separated)
    #[arg(long, conflicts_with = "ncbi_dump", required_unless_present = "ncbi_dump")]
    pub tree: Option<PathBuf>,

    /// NCBI taxdump directory with nodes.dmp and names.dmp
    #[arg(long)]
    pub ncbi_dump: Option<PathBuf>,

    /// Classification name (e.g. Taxonomy, KEGG, SEED)
    #[arg(long, default_value = TAXONOMY)]
    pub classification: String,
}

impl TreeArgs {
    /// Load the classification, plus the synonyms of an NCBI taxdump
    ///
    /// # Errors
    ///
    /// Returns an error if the tree cannot be read or is not a valid tree.
    pub fn load(&self) -> anyhow::Result<(Classification, Option<SynonymIndex>)> {
        if let Some(dir) = &self.ncbi_dump {
            let taxonomy = parse_taxdump_dir(dir)
                .with_context(|| format!("reading taxdump in {}", dir.display()))?;
            return Ok((taxonomy.classification, Some(taxonomy.synonyms)));
        }
        let path = self
            .tree
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("either --tree or --ncbi-dump is required"))?;
        let classification = parse_tree_file(path, &self.classification)
            .with_context(|| format!("reading tree {}", path.display()))?;
        Ok((classification, None))
    }
}
