//! Validate command
//!
//! Declares the stack, runs every check and prints the findings without
//! writing anything.

use super::CommandContext;
use crate::cli::output::Status;
use anyhow::Result;
use clap::Parser;
use serde::Serialize;
use stackform::checks::{self, CheckReport};

/// Arguments for the validate command
#[derive(Parser, Debug, Clone)]
pub struct ValidateArgs {
    /// Treat warnings as errors
    #[arg(long)]
    pub strict: bool,
}

#[derive(Serialize)]
struct ValidateResult<'a> {
    ok: bool,
    strict: bool,
    #[serde(flatten)]
    report: &'a CheckReport,
}

impl ValidateArgs {
    /// Execute the validate command
    pub async fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let stack = ctx.build_stack()?;
        let report = checks::run(&stack);
        let ok = report.is_ok() && !(self.strict && report.has_warnings());

        if ctx.output.is_json() {
            ctx.output.json(&ValidateResult {
                ok,
                strict: self.strict,
                report: &report,
            });
            return Ok(if ok { 0 } else { 4 });
        }

        ctx.output.banner(&format!("VALIDATE [{}]", stack.name()));
        ctx.output.info(&format!(
            "{} declaration(s), {} output(s)",
            stack.len(),
            stack.outputs().count()
        ));

        if report.findings.is_empty() {
            ctx.output.status(stack.name(), Status::Ok, "no findings");
        }
        for finding in &report.findings {
            let subject = format!("{} [{}]", finding.subject, finding.check);
            ctx.output
                .status(&subject, Status::from(finding.severity), &finding.message);
        }

        let errors = report.error_count();
        let warnings = report.warnings().count();
        ctx.output.section("Summary");
        ctx.output
            .plain(&format!("errors={} warnings={}", errors, warnings));

        if !ok {
            if errors == 0 {
                ctx.output.error("Warnings are fatal with --strict");
            } else {
                ctx.output
                    .error(&format!("Stack '{}' failed {} check(s)", stack.name(), errors));
            }
            return Ok(4);
        }

        Ok(0)
    }
}
