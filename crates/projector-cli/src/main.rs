//! Projector CLI
//!
//! Command-line interface for projecting study data through templates

use clap::{Parser, Subcommand};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "projector")]
#[command(about = "Projector - Render relational study data through class templates", long_about = None)]
struct Cli {
    /// Emit JSON log lines instead of human-readable ones
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Project every study and subject and write the documents
    Run(commands::run::RunArgs),
    /// List the class templates a project would load
    Templates(commands::templates::TemplatesArgs),
    /// Print the model's edge table and projection scope
    Model(commands::model::ModelArgs),
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run(args) => commands::run::execute(args, cli.json_logs),
        Commands::Templates(args) => commands::templates::execute(args, cli.json_logs),
        Commands::Model(args) => commands::model::execute(args, cli.json_logs),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
