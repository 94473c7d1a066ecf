//! Outputs command

use super::CommandContext;
use anyhow::Result;
use clap::Parser;
use indexmap::IndexMap;
use stackform::stack::TerraformOutput;

/// Arguments for the outputs command
#[derive(Parser, Debug, Clone)]
pub struct OutputsArgs {}

impl OutputsArgs {
    /// Execute the outputs command
    pub async fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let stack = ctx.build_stack()?;

        if ctx.output.is_json() {
            let outputs: IndexMap<&str, &TerraformOutput> = stack.outputs().collect();
            ctx.output.json(&outputs);
            return Ok(0);
        }

        ctx.output.banner(&format!("OUTPUTS [{}]", stack.name()));
        let rows: Vec<Vec<String>> = stack
            .outputs()
            .map(|(name, output)| {
                vec![
                    name.to_string(),
                    output.value.token(),
                    output.description.clone().unwrap_or_default(),
                ]
            })
            .collect();

        if rows.is_empty() {
            ctx.output.warning("Stack declares no outputs");
        } else {
            ctx.output.table(&["NAME", "VALUE", "DESCRIPTION"], &rows);
        }

        Ok(0)
    }
}
