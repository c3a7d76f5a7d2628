//! Run command
//!
//! Usage: projector run --config <FILE> [--templates <DIR>] [--db <FILE>]
//!        [--output <PATH>] [--buffer-size <N>] [--stream]

use clap::Args;
use projector_engine::{ConfigOverrides, Project};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Project configuration file
    #[arg(short, long)]
    pub config: PathBuf,

    /// Template directory (overrides the config)
    #[arg(short, long)]
    pub templates: Option<PathBuf>,

    /// SQLite database (overrides the config)
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Output file or directory (overrides the config)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Documents buffered per file before a flush (overrides the config)
    #[arg(long)]
    pub buffer_size: Option<usize>,

    /// Write each anchor's documents as soon as they are rendered
    #[arg(long)]
    pub stream: bool,
}

/// Execute run command
pub fn execute(args: RunArgs, json_logs: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = super::load_config(&args.config, json_logs)?;
    config.apply_overrides(&ConfigOverrides {
        templates: args.templates,
        database: args.db,
        output: args.output,
        buffer_size: args.buffer_size,
    })?;

    let output = config.output.path.clone();
    let project = Project::open(config)?;
    let summary = if args.stream {
        project.run_streaming()?
    } else {
        project.run_and_write()?
    };

    println!(
        "✓ Projected {} studies and {} subjects into {} documents ({} render failures) in {} ms",
        summary.studies,
        summary.subjects,
        summary.documents,
        summary.render_failures,
        summary.duration_ms
    );
    println!("  Output: {}", output.display());
    println!("  Run: {}", summary.run_id);

    Ok(())
}
