use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod core;
mod index;
mod mapping;
mod parsing;
mod resolve;
mod utils;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    // Initialize logging based on verbosity flag
    let filter = if cli.verbose {
        EnvFilter::new("taxon_resolver=debug,info")
    } else {
        EnvFilter::new("taxon_resolver=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        cli::Commands::Resolve(args) => {
            cli::resolve::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::BuildIndex(args) => {
            cli::build_index::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Lca(args) => {
            cli::lca::run(args, cli.format, cli.verbose)?;
        }
    }

    Ok(())
}
