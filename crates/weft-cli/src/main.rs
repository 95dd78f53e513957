//! weft CLI: render templates to text through the compile-and-run pipeline.
//!
//! Three commands cover the template lifecycle: `render` (full pipeline),
//! `expand` (print the generated program source), and `check` (parse and
//! resolve only). Each delegates to [`weft_core::Pipeline`].

mod commands;
mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "weft",
    about = "Compile-and-run template engine",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a template against a data context
    Render {
        /// Path to the template file
        template: PathBuf,

        /// Path to a JSON file with the render context (default: empty object)
        #[arg(long, short)]
        data: Option<PathBuf>,

        /// Directory for the compiled-binary cache (no caching if omitted)
        #[arg(long)]
        cache_dir: Option<PathBuf>,

        /// Write the rendered text here instead of stdout
        #[arg(long, short)]
        out: Option<PathBuf>,

        /// Kill the generated program after this many seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
    },

    /// Print the generated program source for a template
    Expand {
        /// Path to the template file
        template: PathBuf,
    },

    /// Parse and resolve a template without building it
    Check {
        /// Path to the template file
        template: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    // Rendered text owns stdout; diagnostics go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Render {
            template,
            data,
            cache_dir,
            out,
            timeout_secs,
        } => {
            commands::render::run(&template, data.as_deref(), cache_dir, out.as_deref(), timeout_secs)?;
        }
        Commands::Expand { template } => {
            commands::expand::run(&template)?;
        }
        Commands::Check { template } => {
            commands::check::run(&template)?;
        }
    }

    Ok(())
}
