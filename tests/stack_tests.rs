//! Integration tests for stacks and the declaration graph
//!
//! These tests cover:
//! - Reference validation at declaration time
//! - Creation order and dependency queries on the default topology
//! - DOT rendering of the graph

use pretty_assertions::assert_eq;
use stackform::blueprint::{build_stack, ids, StackSettings};
use stackform::prelude::*;

fn network_stack() -> (Stack, ResourceHandle) {
    let mut stack = Stack::new("net");
    stack.set_provider(AwsProvider::new("ca-central-1")).unwrap();
    let vpc = stack
        .declare("vpc", Vpc::new("10.0.0.0/16".parse().unwrap()))
        .unwrap();
    (stack, vpc)
}

// ============================================================================
// Reference Validation
// ============================================================================

#[test]
fn test_unknown_attribute_rejected() {
    let (mut stack, vpc) = network_stack();
    let err = stack
        .declare("igw", InternetGateway::new(vpc.attr("public_ip")))
        .unwrap_err();

    assert!(matches!(err, Error::UnknownAttribute { .. }));
    assert!(err.to_string().contains("public_ip"));
    assert_eq!(stack.len(), 1);
}

#[test]
fn test_output_must_reference_declared_resource() {
    let (mut stack, _) = network_stack();
    let ghost = ResourceAddress::new("aws_instance", "ghost");

    let err = stack.output("ip", ghost.attr("public_ip")).unwrap_err();
    assert!(matches!(err, Error::UnresolvedReference { .. }));
    assert_eq!(stack.outputs().count(), 0);
}

#[test]
fn test_duplicate_output_rejected() {
    let (mut stack, vpc) = network_stack();
    stack.output("vpc_id", vpc.id()).unwrap();
    assert!(matches!(
        stack.output("vpc_id", vpc.attr("arn")),
        Err(Error::DuplicateOutput(_))
    ));
}

#[test]
fn test_invalid_declaration_leaves_stack_untouched() {
    let (mut stack, vpc) = network_stack();
    let before = stack.graph().node_count();

    let bad = Subnet::new(vpc.id(), "10.0.1.0/24".parse().unwrap(), "");
    assert!(stack.declare("sub", bad).is_err());
    assert_eq!(stack.len(), 1);
    assert_eq!(stack.graph().node_count(), before);
}

#[test]
fn test_declaration_errors_map_to_exit_code() {
    let (mut stack, _) = network_stack();
    let err = stack
        .declare("has space", Vpc::new("10.1.0.0/16".parse().unwrap()))
        .unwrap_err();
    assert_eq!(err.exit_code(), 3);
}

// ============================================================================
// Graph Queries on the Default Topology
// ============================================================================

#[test]
fn test_creation_order_respects_references() {
    let stack = build_stack("order", &StackSettings::default()).unwrap();
    let order = stack.creation_order().unwrap();
    let pos = |id: &str| order.iter().position(|x| x == id).unwrap();

    assert_eq!(order.len(), 7);
    assert!(pos(ids::VPC) < pos(ids::INTERNET_GATEWAY));
    assert!(pos(ids::INTERNET_GATEWAY) < pos(ids::ROUTE_TABLE));
    assert!(pos(ids::SUBNET) < pos(ids::ROUTE_TABLE_ASSOCIATION));
    assert!(pos(ids::ROUTE_TABLE) < pos(ids::ROUTE_TABLE_ASSOCIATION));
    assert!(pos(ids::SECURITY_GROUP) < pos(ids::INSTANCE));
    assert!(pos(ids::SUBNET) < pos(ids::INSTANCE));
}

#[test]
fn test_direct_dependencies() {
    let stack = build_stack("deps", &StackSettings::default()).unwrap();
    let graph = stack.graph();

    assert_eq!(
        graph.dependencies_of(ids::INSTANCE),
        vec![ids::SUBNET, ids::SECURITY_GROUP]
    );
    assert_eq!(
        graph.dependencies_of(ids::ROUTE_TABLE_ASSOCIATION),
        vec![ids::ROUTE_TABLE, ids::SUBNET]
    );
    assert!(graph.dependencies_of(ids::VPC).is_empty());
}

#[test]
fn test_everything_depends_on_the_vpc() {
    let stack = build_stack("impact", &StackSettings::default()).unwrap();
    let dependents = stack.graph().transitive_dependents(ids::VPC);

    for (id, _) in stack.declarations().skip(1) {
        assert!(dependents.iter().any(|d| d == id), "{} missing", id);
    }
    assert!(dependents.iter().any(|d| d == "output.public_ip"));
}

#[test]
fn test_outputs_are_graph_nodes() {
    let stack = build_stack("outs", &StackSettings::default()).unwrap();
    let node = stack.graph().node("output.public_dns").unwrap();

    assert_eq!(node.node_type, "output");
    assert_eq!(stack.graph().dependencies_of("output.public_dns"), vec![ids::INSTANCE]);
    assert!(!stack.graph().has_cycles());
}

#[test]
fn test_edges_carry_field_names() {
    let stack = build_stack("edges", &StackSettings::default()).unwrap();
    let fields: Vec<&str> = stack
        .graph()
        .incoming_edges(ids::INSTANCE)
        .into_iter()
        .map(|e| e.field.as_str())
        .collect();

    assert_eq!(fields, vec!["subnet_id", "vpc_security_group_ids"]);
}

#[test]
fn test_dot_rendering() {
    let stack = build_stack("dot", &StackSettings::default()).unwrap();
    let dot = stack.graph().to_dot();

    assert!(dot.starts_with("digraph stack {"));
    assert!(dot.contains("\"cdktf-ig\" -> \"cdktf-rt\" [label=\"route.gateway_id\"]"));
    assert!(dot.contains("\"output.public_ip\""));
    assert!(dot.trim_end().ends_with('}'));
}

#[test]
fn test_ids_of_kind() {
    let stack = build_stack("kinds", &StackSettings::default()).unwrap();
    assert_eq!(stack.ids_of_kind(ResourceKind::Subnet), vec![ids::SUBNET]);
    assert!(stack.ids_of_kind(ResourceKind::Vpc).len() == 1);
}
