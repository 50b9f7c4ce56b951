use clap::Args;

use crate::cli::{OutputFormat, TreeArgs};
use crate::core::types::ClassificationId;

#[derive(Args)]
pub struct LcaArgs {
    #[command(flatten)]
    pub tree: TreeArgs,

    /// Ids to reduce
    #[arg(required = true, num_args = 1..)]
    pub ids: Vec<ClassificationId>,
}

/// Execute lca subcommand
///
/// # Errors
///
/// Returns an error if the tree cannot be loaded or an id is not in it.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: LcaArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let (classification, _) = args.tree.load()?;
    let tree = &classification.tree;
    let lca = tree.lca(args.ids.iter().copied())?;
    let name = classification.display_name(lca);
    let rank = tree.rank(lca)?;

    if verbose {
        for &id in &args.ids {
            let path: Vec<String> = tree
                .ancestors(id)?
                .iter()
                .rev()
                .map(ToString::to_string)
                .collect();
            eprintln!("{id}: {}", path.join(" > "));
        }
    }

    match format {
        OutputFormat::Text => println!("{lca}\t{name}\t{rank}"),
        OutputFormat::Json => {
            let output = serde_json::json!({
                "ids": args.ids,
                "lca": lca,
                "name": name,
                "rank": rank.to_string(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Tsv => {
            println!("lca\tname\trank");
            println!("{lca}\t{name}\t{rank}");
        }
    }
    Ok(())
}
