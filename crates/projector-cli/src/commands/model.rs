//! Model command
//!
//! Usage: projector model --config <FILE>
//!
//! Prints every class with its table and edges. Edges of the anchor
//! classes are annotated with whether traversal would follow them.

use clap::Args;
use projector_core::traversal::{AnchorRole, Projector};
use projector_core::TemplateRegistry;
use projector_engine::load_project_model;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct ModelArgs {
    /// Project configuration file
    #[arg(short, long)]
    pub config: PathBuf,

    /// Print the edge table as JSON
    #[arg(long)]
    pub json: bool,
}

/// Execute model command
pub fn execute(args: ModelArgs, json_logs: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(&args.config, json_logs)?;
    let model = load_project_model(&config)?;
    let registry = TemplateRegistry::load(&config.templates)?;
    let anchors = config.anchor_settings();
    let projector = Projector::new(&registry, &anchors);

    let role_of = |class_name: &str| {
        AnchorRole::ALL
            .into_iter()
            .find(|role| anchors.spec(*role).class_name == class_name)
    };

    if args.json {
        let classes: Vec<serde_json::Value> = model
            .classes()
            .map(|class| {
                let role = role_of(&class.name);
                let edges: Vec<serde_json::Value> = class
                    .edges
                    .iter()
                    .map(|edge| {
                        serde_json::json!({
                            "field": edge.field,
                            "target": edge.target,
                            "cardinality": edge.cardinality.as_str(),
                            "scope": role.map(|r| projector.edge_scope(r, edge).as_str()),
                        })
                    })
                    .collect();
                serde_json::json!({
                    "class": class.name,
                    "table": class.table,
                    "primary_key": class.primary_key,
                    "role": role.map(|r| r.as_str()),
                    "template": registry.contains(&class.name),
                    "edges": edges,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&classes)?);
        return Ok(());
    }

    for class in model.classes() {
        let role = role_of(&class.name);
        let marker = match role {
            Some(role) => format!(" [{}]", role),
            None => String::new(),
        };
        let template = if registry.contains(&class.name) {
            "template"
        } else {
            "no template"
        };
        println!("{}{} -> {} ({})", class.name, marker, class.table, template);
        for edge in &class.edges {
            let scope = match role {
                Some(role) => format!("  {}", projector.edge_scope(role, edge).as_str()),
                None => String::new(),
            };
            println!(
                "  .{} -> {} ({}){}",
                edge.field,
                edge.target,
                edge.cardinality.as_str(),
                scope
            );
        }
    }

    Ok(())
}
