//! argtree - declarative argv resolution over nested command trees.

use anyhow::{Context, Result};
use argtree::{report_string, resolve_with, write_report, AliasResolver, Config};
use clap::{Parser, Subcommand};

/// Declarative argv resolution over nested command trees.
#[derive(Parser, Debug)]
#[command(name = "argtree", version, about, disable_help_subcommand = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve target argv against a declaration table
    Resolve {
        /// JSON declaration table for the target program
        #[arg(long)]
        config: String,

        /// Print the JSON report to stdout instead of a temp file
        #[arg(long)]
        stdout: bool,

        /// Argv tokens to resolve for the target program
        #[arg(last = true)]
        args: Vec<String>,
    },

    /// Validate a declaration table without resolving anything
    Check {
        /// JSON declaration table for the target program
        #[arg(long)]
        config: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Resolve {
            config,
            stdout,
            args,
        } => {
            let cfg = Config::from_json(&config).context("failed to parse declaration JSON")?;
            cfg.validate().context("invalid declaration table")?;

            let names = AliasResolver::from_config(&cfg);
            let resolution = resolve_with(&cfg, &args, &names);

            if stdout {
                println!("{}", report_string(&resolution)?);
            } else {
                let path =
                    write_report(&resolution).context("failed to write resolution report")?;
                println!("{}", path.display());
            }

            if !resolution.errors.is_empty() {
                std::process::exit(1);
            }
        }
        Commands::Check { config } => {
            let cfg = Config::from_json(&config).context("failed to parse declaration JSON")?;
            cfg.validate().context("invalid declaration table")?;
            println!("ok");
        }
    }

    Ok(())
}
