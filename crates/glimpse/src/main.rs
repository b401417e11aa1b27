//! Glimpse CLI - perceptual hashing and image similarity.
//!
//! Glimpse fingerprints images with a DCT-based perceptual hash. Images that
//! look alike get hashes a small Hamming distance apart, whatever their size
//! or encoding.
//!
//! # Usage
//!
//! ```bash
//! # Hash a single image
//! glimpse hash image.jpg
//!
//! # Hash a directory tree as JSON Lines
//! glimpse hash ./photos/ --format jsonl --output hashes.jsonl
//!
//! # Compare two images
//! glimpse compare a.jpg b.png
//!
//! # View configuration
//! glimpse config show
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod input;
mod logging;

/// Glimpse - perceptual hashing and image similarity.
#[derive(Parser, Debug)]
#[command(name = "glimpse")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Compute perceptual hashes of images
    Hash(cli::hash::HashArgs),

    /// Score how similar two images look
    Compare(cli::compare::CompareArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging is not up yet, so config problems go straight to stderr.
    let config = match glimpse_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `glimpse config path`."
            );
            glimpse_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Glimpse v{}", glimpse_core::VERSION);

    match cli.command {
        Commands::Hash(args) => cli::hash::execute(args).await,
        Commands::Compare(args) => cli::compare::execute(args).await,
        Commands::Config(args) => cli::config::execute(args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_hash_command() {
        let cli = Cli::try_parse_from([
            "glimpse",
            "hash",
            "a.jpg",
            "photos",
            "--thumb-size",
            "8",
            "-f",
            "jsonl",
            "-v",
        ])
        .unwrap();

        assert!(cli.verbose);
        match cli.command {
            Commands::Hash(args) => {
                assert_eq!(args.inputs.len(), 2);
                assert_eq!(args.thumb_size, Some(8));
                assert_eq!(args.hash_size, None);
                assert!(matches!(args.format, Some(cli::hash::OutputFormat::Jsonl)));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_compare_fast() {
        let cli = Cli::try_parse_from(["glimpse", "compare", "a.png", "b.png", "--fast"]).unwrap();
        assert!(matches!(cli.command, Commands::Compare(ref args) if args.fast));
    }

    #[test]
    fn test_hash_requires_input() {
        assert!(Cli::try_parse_from(["glimpse", "hash"]).is_err());
    }
}
