//! Synth command
//!
//! Checks the stack and writes `stacks/<name>/cdk.tf.json` plus the app
//! manifest under the output directory, or prints the document.

use super::CommandContext;
use crate::cli::output::Status;
use anyhow::Result;
use clap::Parser;
use stackform::checks;
use stackform::synth::App;
use std::path::PathBuf;

/// Arguments for the synth command
#[derive(Parser, Debug, Clone)]
pub struct SynthArgs {
    /// Output directory (overrides `synth.outdir`)
    #[arg(short = 'o', long)]
    pub outdir: Option<PathBuf>,

    /// Print the document to stdout instead of writing files
    #[arg(long)]
    pub stdout: bool,
}

impl SynthArgs {
    /// Execute the synth command
    pub async fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let stack = ctx.build_stack()?;
        let name = stack.name().to_string();

        let report = checks::run(&stack);
        for finding in &report.findings {
            match Status::from(finding.severity) {
                Status::Error => ctx.output.error(&finding.to_string()),
                _ => ctx.output.warning(&finding.to_string()),
            }
        }
        if !report.is_ok() {
            ctx.output
                .hint("Run 'stackform validate' for the full report");
            return Ok(4);
        }

        let outdir = self
            .outdir
            .clone()
            .unwrap_or_else(|| ctx.config.synth.outdir.clone());
        let mut app = App::new(outdir)
            .with_provider_requirement(ctx.config.provider.clone())
            .with_pretty(ctx.config.synth.pretty);
        app.add_stack(stack)?;

        if self.stdout {
            let document = app.synth_stack(&name)?;
            ctx.output.plain(&document.render(ctx.config.synth.pretty)?);
            return Ok(0);
        }

        ctx.output.banner(&format!("SYNTH [{}]", name));
        let manifest = app.synth().await?;

        if ctx.output.is_json() {
            ctx.output.json(&manifest);
            return Ok(0);
        }

        for entry in manifest.stacks.values() {
            let path = app.outdir().join(&entry.synthesized_stack_path);
            ctx.output
                .status(&entry.name, Status::Ok, &path.display().to_string());
            ctx.output.list("Outputs", &entry.outputs);
        }
        ctx.output.elapsed("Synthesized");
        ctx.output.flush();

        Ok(0)
    }
}
