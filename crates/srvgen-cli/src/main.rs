//! srvgen CLI - Service binding generator
//!
//! Commands:
//! - `srvgen generate` - Generate Java bindings for `.srv` files
//! - `srvgen check` - Resolve and hash `.srv` files without writing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod codegen;
mod generate;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "srvgen")]
#[command(author, version, about = "Generate service bindings from .srv files", long_about = None)]
struct Cli {
    /// Path to srvgen.toml (default: ./srvgen.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Extra package search root (repeatable)
    #[arg(short = 'I', long = "include", global = true)]
    include: Vec<PathBuf>,

    /// Log at debug level unless RUST_LOG is set
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate bindings; a trailing directory or new path is the output root
    Generate {
        /// Schema files, optionally followed by the output root
        #[arg(required = true)]
        args: Vec<PathBuf>,
    },

    /// Print the compatibility hash of each schema file
    Check {
        /// Schema files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Print a JSON report
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = generate::BatchOptions::load(cli.config.as_deref(), cli.include)?;
    logging::init_logging(&options.config.logging.level, cli.verbose);

    match cli.command {
        Commands::Generate { args } => {
            let summary = generate::run(&args, &options)?;
            if !summary.is_success() {
                for (file, error) in &summary.failed {
                    eprintln!("{}: {error}", file.display());
                }
                anyhow::bail!(
                    "{} of {} schema files failed",
                    summary.failed.len(),
                    summary.failed.len() + summary.generated.len()
                );
            }
        }
        Commands::Check { files, json } => {
            let report = generate::check(&files, &options);
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", report.to_text());
            }
            if report.failures() > 0 {
                anyhow::bail!("{} of {} schema files failed", report.failures(), files.len());
            }
        }
    }

    Ok(())
}
