//! List command
//!
//! Prints the declarations of the stack in declaration order with their
//! resource type and direct dependencies.

use super::CommandContext;
use anyhow::Result;
use clap::Parser;
use serde::Serialize;

/// Arguments for the list command
#[derive(Parser, Debug, Clone)]
pub struct ListArgs {
    /// Include tags
    #[arg(long)]
    pub tags: bool,
}

#[derive(Debug, Serialize)]
struct Entry {
    id: String,
    #[serde(rename = "type")]
    resource_type: &'static str,
    depends_on: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name_tag: Option<String>,
}

impl ListArgs {
    /// Execute the list command
    pub async fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let stack = ctx.build_stack()?;

        let entries: Vec<Entry> = stack
            .declarations()
            .map(|(id, declaration)| Entry {
                id: id.to_string(),
                resource_type: declaration.kind().terraform_type(),
                depends_on: stack.graph().dependencies_of(id),
                name_tag: if self.tags {
                    declaration
                        .tags()
                        .and_then(|tags| tags.get("Name"))
                        .cloned()
                } else {
                    None
                },
            })
            .collect();

        if ctx.output.is_json() {
            ctx.output.json(&entries);
            return Ok(0);
        }

        ctx.output.banner(&format!("DECLARATIONS [{}]", stack.name()));

        let mut headers = vec!["ID", "TYPE", "DEPENDS ON"];
        if self.tags {
            headers.push("NAME TAG");
        }
        let rows: Vec<Vec<String>> = entries
            .into_iter()
            .map(|entry| {
                let mut row = vec![
                    entry.id,
                    entry.resource_type.to_string(),
                    entry.depends_on.join(", "),
                ];
                if self.tags {
                    row.push(entry.name_tag.unwrap_or_default());
                }
                row
            })
            .collect();
        ctx.output.table(&headers, &rows);

        Ok(0)
    }
}
