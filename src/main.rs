use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

use adaptbound::Config;

mod commands;

#[derive(Parser)]
#[command(name = "adaptbd")]
#[command(about = "Bound the number of adaptive query rounds in a pipeline graph")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to ./adaptbound.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the adaptivity bound by SCC decomposition
    Bound {
        /// Pipeline file (.json, .yaml, .yml or .toml)
        file: PathBuf,

        /// Cross-check against the exhaustive enumerator
        #[arg(long)]
        verify: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compute the bound by exhaustive walk enumeration
    Naive {
        file: PathBuf,

        #[arg(long)]
        json: bool,
    },

    /// Print a walk that achieves the bound
    Path {
        file: PathBuf,

        #[arg(long)]
        json: bool,
    },

    /// Show strongly connected components and their internal bounds
    Components {
        file: PathBuf,

        #[arg(long)]
        json: bool,
    },

    /// Analyze the built-in voter pipeline
    Demo {
        #[arg(long)]
        json: bool,
    },
}

fn log_level(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(log_level(cli.verbose, cli.quiet)),
    )
    .init();

    let cwd = std::env::current_dir()?;
    let config = Config::resolve(cli.config.as_deref(), &cwd)?;

    match cli.command {
        Commands::Bound { file, verify, json } => {
            commands::bound::run(&file, &config, verify, json)
        }
        Commands::Naive { file, json } => commands::naive::run(&file, &config, json),
        Commands::Path { file, json } => commands::path::run(&file, &config, json),
        Commands::Components { file, json } => commands::components::run(&file, &config, json),
        Commands::Demo { json } => commands::demo::run(&config, json),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_log_level() {
        assert_eq!(log_level(0, false), "warn");
        assert_eq!(log_level(2, false), "debug");
        assert_eq!(log_level(5, false), "trace");
        assert_eq!(log_level(0, true), "error");
    }

    #[test]
    fn test_parse_bound_flags() {
        let cli = Cli::try_parse_from(["adaptbd", "-vv", "bound", "p.yaml", "--verify"]).unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Bound { file, verify, json } => {
                assert_eq!(file, PathBuf::from("p.yaml"));
                assert!(verify);
                assert!(!json);
            }
            _ => panic!("expected bound"),
        }
    }
}
