//! Templates command
//!
//! Usage: projector templates --config <FILE> [--templates <DIR>]

use clap::Args;
use projector_core::TemplateRegistry;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct TemplatesArgs {
    /// Project configuration file
    #[arg(short, long)]
    pub config: PathBuf,

    /// Template directory (overrides the config)
    #[arg(short, long)]
    pub templates: Option<PathBuf>,
}

/// Execute templates command
pub fn execute(args: TemplatesArgs, json_logs: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(&args.config, json_logs)?;
    let dir = args.templates.unwrap_or(config.templates);

    let registry = TemplateRegistry::load(&dir)?;
    for class_name in registry.class_names() {
        println!("{}", class_name);
    }
    eprintln!("{} templates in {}", registry.len(), dir.display());

    Ok(())
}
