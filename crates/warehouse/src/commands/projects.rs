//! Projects command - local project store administration.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Args, Subcommand};
use console::Style;
use serde_json::Value;

use warehouse_store::ProjectStore;
use warehouse_types::Project;

use super::Context;

/// Arguments for the projects command.
#[derive(Args, Debug)]
pub struct ProjectsArgs {
    #[command(subcommand)]
    pub command: ProjectsCommand,
}

#[derive(Subcommand, Debug)]
pub enum ProjectsCommand {
    /// Import projects from a JSON file (one object or an array)
    Import {
        /// JSON file to read
        file: PathBuf,
    },

    /// List stored projects
    List,
}

/// Run the projects command.
pub fn run(args: ProjectsArgs, ctx: &Context) -> Result<()> {
    let store = ProjectStore::open(&ctx.database)
        .with_context(|| format!("opening project store {}", ctx.database.display()))?;

    match args.command {
        ProjectsCommand::Import { file } => {
            let contents = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let projects = parse_projects(&contents)?;
            for project in &projects {
                store.upsert(project)?;
            }

            if ctx.json_output {
                println!("{}", serde_json::json!({ "imported": projects.len() }));
            } else {
                let green = Style::new().green();
                println!(
                    "{} Imported {} project(s) into {}",
                    green.apply_to("✓"),
                    projects.len(),
                    ctx.database.display()
                );
            }
        }

        ProjectsCommand::List => {
            let projects = store.list()?;

            if ctx.json_output {
                println!("{}", serde_json::to_string_pretty(&projects)?);
                return Ok(());
            }

            if projects.is_empty() {
                println!("No projects stored.");
                return Ok(());
            }

            let dim = Style::new().dim();
            let bold = Style::new().bold();
            for project in &projects {
                println!(
                    "{}  {} {}",
                    bold.apply_to(&project.id),
                    dim.apply_to(format!("group {}", project.group_id)),
                    project.name.as_deref().unwrap_or("")
                );
            }
        }
    }

    Ok(())
}

/// One project document or an array of them.
fn parse_projects(contents: &str) -> Result<Vec<Project>> {
    let value: Value = serde_json::from_str(contents).context("invalid JSON")?;
    let projects = match value {
        Value::Array(items) => items
            .into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<Project>, _>>()?,
        other => vec![serde_json::from_value(other)?],
    };
    Ok(projects)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_and_array() {
        let one = parse_projects(r#"{"_id": "p1", "group_id": 1}"#).unwrap();
        assert_eq!(one.len(), 1);

        let many =
            parse_projects(r#"[{"_id": "p1", "group_id": 1}, {"_id": "p2", "group_id": 2, "access": "private"}]"#)
                .unwrap();
        assert_eq!(many.len(), 2);
        assert_eq!(many[1].extra["access"], "private");
    }

    #[test]
    fn test_parse_rejects_missing_group() {
        assert!(parse_projects(r#"{"_id": "p1"}"#).is_err());
        assert!(parse_projects("not json").is_err());
    }
}
