//! Graph command
//!
//! Shows the dependency graph of the stack, either as indented text in
//! creation order or as Graphviz DOT.

use super::CommandContext;
use anyhow::Result;
use clap::{Parser, ValueEnum};
use serde::Serialize;
use stackform::stack::{GraphEdge, GraphNode};

/// Graph rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum GraphFormat {
    /// Creation order with incoming edges
    #[default]
    Text,
    /// Graphviz DOT
    Dot,
}

/// Arguments for the graph command
#[derive(Parser, Debug, Clone)]
pub struct GraphArgs {
    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: GraphFormat,
}

#[derive(Serialize)]
struct GraphDump<'a> {
    order: &'a [String],
    nodes: Vec<&'a GraphNode>,
    edges: Vec<&'a GraphEdge>,
}

impl GraphArgs {
    /// Execute the graph command
    pub async fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let stack = ctx.build_stack()?;
        let graph = stack.graph();

        if self.format == GraphFormat::Dot {
            ctx.output.plain(graph.to_dot().trim_end());
            return Ok(0);
        }

        let order = graph.topological_order()?;

        if ctx.output.is_json() {
            ctx.output.json(&GraphDump {
                order: &order,
                nodes: order.iter().filter_map(|id| graph.node(id)).collect(),
                edges: order.iter().flat_map(|id| graph.incoming_edges(id)).collect(),
            });
            return Ok(0);
        }

        ctx.output.banner(&format!("GRAPH [{}]", stack.name()));
        for id in &order {
            let node_type = graph.node(id).map(|n| n.node_type.as_str()).unwrap_or("?");
            ctx.output.plain(&format!("{} ({})", id, node_type));
            for edge in graph.incoming_edges(id) {
                ctx.output.plain(&format!(
                    "  <- {}.{} via {}",
                    edge.from_id, edge.attribute, edge.field
                ));
            }
        }
        ctx.output.info(&format!(
            "{} node(s), {} edge(s)",
            graph.node_count(),
            graph.edge_count()
        ));

        Ok(0)
    }
}
