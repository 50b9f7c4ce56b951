use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::Args;
use rayon::prelude::*;
use tracing::info;

use crate::cli::{OutputFormat, TreeArgs};
use crate::core::classification::Classification;
use crate::core::types::{Algorithm, ClassificationId, MapType};
use crate::index::synonyms::SynonymIndex;
use crate::mapping::options::{ResolverConfig, ResolverOptions};
use crate::mapping::registry::MapRegistry;
use crate::parsing::mapping::open_text;
use crate::utils::cancel::CancelToken;

#[derive(Args)]
pub struct ResolveArgs {
    /// Headers to resolve: FASTA (only '>' lines are used) or one header per line.
    /// Use '-' for stdin
    #[arg(required = true)]
    pub input: PathBuf,

    #[command(flatten)]
    pub tree: TreeArgs,

    /// Accession mapping: <accession>\t<id> text (optionally .gz), .idx table or SQLite file
    #[arg(long)]
    pub accessions: Option<PathBuf>,

    /// SQLite file with one accession table per classification
    #[arg(long)]
    pub embedded_db: Option<PathBuf>,

    /// Synonym mapping: <name>\t<id> text (optionally .gz)
    #[arg(long)]
    pub synonyms: Option<PathBuf>,

    /// JSON config with per-classification options
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// How multiple hits are reduced to one id
    #[arg(long, value_enum)]
    pub algorithm: Option<Algorithm>,

    /// Ids only reported when nothing else is found (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub disable: Vec<ClassificationId>,

    /// Id tag, replaces the defaults (repeatable)
    #[arg(long = "id-tag")]
    pub id_tags: Vec<String>,

    /// Accession tag, replaces the defaults (repeatable)
    #[arg(long = "accession-tag")]
    pub accession_tags: Vec<String>,

    /// Also try the first word of each header as an accession
    #[arg(long, value_name = "BOOL")]
    pub first_word_accession: Option<bool>,

    /// Disable free-text name parsing
    #[arg(long)]
    pub no_text: bool,

    /// Worker threads (default: all cores)
    #[arg(short, long)]
    pub threads: Option<usize>,
}

/// Execute resolve subcommand
///
/// # Errors
///
/// Returns an error if inputs cannot be loaded or a header hits an id that
/// is missing from the tree.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: ResolveArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let (classification, ncbi_synonyms) = args.tree.load()?;
    if verbose {
        eprintln!(
            "Loaded {} with {} nodes",
            classification.name,
            classification.tree.len()
        );
    }

    let options = build_options(&args, &classification.name)?;
    let registry = MapRegistry::new(classification, options);
    load_maps(&args, &registry, ncbi_synonyms)?;

    let headers = read_headers(&args.input)?;
    let start = Instant::now();
    let ids = resolve_parallel(&registry, &headers, args.threads)?;
    info!(
        "Resolved {} headers in {:.1}s",
        headers.len(),
        start.elapsed().as_secs_f64()
    );

    if verbose {
        let assigned = ids.iter().filter(|&&id| id > 0).count();
        eprintln!("Assigned {assigned} of {} headers", headers.len());
    }

    let classification = registry.classification();
    match format {
        OutputFormat::Text => print_text_results(&headers, &ids, classification, false),
        OutputFormat::Tsv => print_text_results(&headers, &ids, classification, true),
        OutputFormat::Json => print_json_results(&headers, &ids, classification)?,
    }

    registry.close();
    Ok(())
}

fn build_options(args: &ResolveArgs, classification: &str) -> anyhow::Result<ResolverOptions> {
    let mut options = match &args.config {
        Some(path) => ResolverConfig::load_from_file(path)
            .with_context(|| format!("reading config {}", path.display()))?
            .options_for(classification),
        None => ResolverOptions::for_classification(classification),
    };

    if let Some(algorithm) = args.algorithm {
        options.algorithm = algorithm;
    }
    if !args.disable.is_empty() {
        options.disabled_ids = args.disable.iter().copied().collect();
    }
    if !args.id_tags.is_empty() {
        options.id_tags.clone_from(&args.id_tags);
    }
    if !args.accession_tags.is_empty() {
        options.accession_tags.clone_from(&args.accession_tags);
    }
    if let Some(first_word) = args.first_word_accession {
        options.first_word_is_accession = first_word;
    }
    if args.no_text {
        options.use_text_parsing = false;
    }
    Ok(options)
}

fn load_maps(
    args: &ResolveArgs,
    registry: &MapRegistry,
    ncbi_synonyms: Option<SynonymIndex>,
) -> anyhow::Result<()> {
    let cancel = CancelToken::new();

    if let Some(path) = &args.synonyms {
        registry.load(MapType::Synonyms, path, false, &cancel)?;
    } else if let Some(synonyms) = ncbi_synonyms.filter(|s| !s.is_empty()) {
        registry.install_synonyms(synonyms)?;
    }
    if let Some(path) = &args.accessions {
        registry.load(MapType::Accession, path, false, &cancel)?;
    }
    if let Some(path) = &args.embedded_db {
        registry.load(MapType::EmbeddedDb, path, false, &cancel)?;
    }
    Ok(())
}

/// Read FASTA header lines, or every non-empty line if there are none
fn read_headers(input: &Path) -> anyhow::Result<Vec<String>> {
    let reader: Box<dyn BufRead> = if input.to_string_lossy() == "-" {
        Box::new(io::stdin().lock())
    } else {
        open_text(input).with_context(|| format!("reading {}", input.display()))?
    };

    let lines: Vec<String> = reader
        .lines()
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .filter(|line| !line.trim().is_empty())
        .collect();

    if lines.iter().any(|line| line.starts_with('>')) {
        Ok(lines.into_iter().filter(|line| line.starts_with('>')).collect())
    } else {
        Ok(lines)
    }
}

/// Resolve headers on a rayon pool, one resolver per worker, keeping input order
fn resolve_parallel(
    registry: &MapRegistry,
    headers: &[String],
    threads: Option<usize>,
) -> anyhow::Result<Vec<ClassificationId>> {
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(threads) = threads {
        builder = builder.num_threads(threads);
    }
    let pool = builder.build()?;

    pool.install(|| {
        headers
            .par_iter()
            .map_init(
                || registry.create_resolver(),
                |resolver, header| {
                    let resolver = resolver
                        .as_mut()
                        .map_err(|e| anyhow::anyhow!("creating resolver: {e}"))?;
                    resolver
                        .resolve(header)
                        .with_context(|| format!("resolving '{header}'"))
                },
            )
            .collect()
    })
}

fn display_header(header: &str) -> &str {
    header.strip_prefix('>').unwrap_or(header).trim()
}

fn print_text_results(
    headers: &[String],
    ids: &[ClassificationId],
    classification: &Classification,
    with_header_row: bool,
) {
    if with_header_row {
        println!("header\tid\tname");
    }
    for (header, &id) in headers.iter().zip(ids) {
        let name = if id > 0 {
            classification.display_name(id)
        } else {
            "-".to_string()
        };
        println!("{}\t{id}\t{name}", display_header(header));
    }
}

fn print_json_results(
    headers: &[String],
    ids: &[ClassificationId],
    classification: &Classification,
) -> anyhow::Result<()> {
    let output: Vec<serde_json::Value> = headers
        .iter()
        .zip(ids)
        .map(|(header, &id)| {
            serde_json::json!({
                "header": display_header(header),
                "id": id,
                "name": (id > 0).then(|| classification.display_name(id)),
            })
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
