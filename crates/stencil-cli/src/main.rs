//! Stencil CLI
//!
//! Command-line interface for inspecting annotated template files

use clap::{Parser, Subcommand};
use stencil_core::logging_facility::{init, Profile};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "stencil")]
#[command(about = "Stencil - annotated code templates", long_about = None)]
struct Cli {
    /// Emit debug logs
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List the annotation regions of a file
    Regions(commands::regions::RegionsArgs),
    /// Print a file with annotation syntax blanked
    Mask(commands::mask::MaskArgs),
    /// Build a snippet group from a file and describe it
    Inspect(commands::inspect::InspectArgs),
}

fn main() {
    let cli = Cli::parse();
    if cli.verbose {
        init(Profile::Development);
    }

    let result = match cli.command {
        Commands::Regions(args) => commands::regions::execute(args),
        Commands::Mask(args) => commands::mask::execute(args),
        Commands::Inspect(args) => commands::inspect::execute(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
