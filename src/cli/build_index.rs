use std::path::PathBuf;
use std::time::Instant;

use clap::Args;

use crate::cli::OutputFormat;
use crate::core::types::TAXONOMY;
use crate::index::{DiskHashTableBuilder, EmbeddedDb, IndexKind};
use crate::utils::cancel::CancelToken;

#[derive(Args)]
pub struct BuildIndexArgs {
    /// Two-column <accession>\t<id> mapping (optionally .gz)
    #[arg(required = true)]
    pub input: PathBuf,

    /// Output: .idx for a disk table, .db/.mdb/.sqlite for an SQLite table
    #[arg(required = true)]
    pub output: PathBuf,

    /// Table name inside an SQLite output
    #[arg(long, default_value = TAXONOMY)]
    pub classification: String,
}

/// Execute build-index subcommand
///
/// # Errors
///
/// Returns an error if the output suffix is not an index format or the
/// mapping cannot be read or written.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: BuildIndexArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let start = Instant::now();
    let cancel = CancelToken::new();

    let kind = IndexKind::detect(&args.output);
    let count = match kind {
        IndexKind::DiskHash => {
            let builder = DiskHashTableBuilder::from_mapping_file(&args.input, &cancel)?;
            if verbose {
                eprintln!("Read {} accessions from {}", builder.len(), args.input.display());
            }
            builder.write(&args.output)?
        }
        IndexKind::Embedded => {
            EmbeddedDb::write_mapping(&args.output, &args.classification, &args.input, &cancel)?
        }
        IndexKind::InMemory => anyhow::bail!(
            "Output {} must end in .idx, .db, .mdb or .sqlite",
            args.output.display()
        ),
    };
    let elapsed = start.elapsed().as_secs_f64();

    match format {
        OutputFormat::Text => {
            println!(
                "Wrote {count} accessions to {} in {elapsed:.1}s",
                args.output.display()
            );
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "output": args.output.display().to_string(),
                "kind": format!("{kind:?}"),
                "entries": count,
                "seconds": elapsed,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Tsv => {
            println!("output\tkind\tentries");
            println!("{}\t{kind:?}\t{count}", args.output.display());
        }
    }
    Ok(())
}
