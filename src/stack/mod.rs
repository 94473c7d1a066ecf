//! Stacks: ordered collections of declarations plus outputs.
//!
//! A [`Stack`] is the unit handed to synthesis. Declarations are added in
//! literal order through [`Stack::declare`], which enforces that every
//! reference points at a resource declared earlier in the same stack, of the
//! type the reference names, and at an attribute that type exports. Because
//! nothing can reference a later declaration, the dependency graph is acyclic
//! by construction.
//!
//! # Example
//!
//! ```rust
//! use stackform::prelude::*;
//!
//! let mut stack = Stack::new("demo");
//! stack.set_provider(AwsProvider::new("ca-central-1"))?;
//!
//! let vpc = stack.declare("net", Vpc::new("10.0.0.0/16".parse()?))?;
//! let subnet = stack.declare(
//!     "public",
//!     Subnet::new(vpc.id(), "10.0.1.0/24".parse()?, "ca-central-1a"),
//! )?;
//! let vm = stack.declare(
//!     "vm",
//!     Instance::new("ami-0801628222e2e96d6", "t2.nano", subnet.id()),
//! )?;
//! stack.output("public_ip", vm.attr("public_ip"))?;
//!
//! assert_eq!(stack.len(), 3);
//! # Ok::<(), stackform::Error>(())
//! ```

pub mod graph;
pub mod output;

pub use graph::{DeclarationGraph, GraphEdge, GraphNode};
pub use output::TerraformOutput;

use indexmap::IndexMap;
use tracing::debug;

use crate::error::{Error, Result};
use crate::reference::{validate_id, Reference, ResourceAddress};
use crate::resources::{AwsProvider, Declaration, ResourceKind};

/// Handle to a declared resource, used to build references to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceHandle {
    address: ResourceAddress,
    kind: ResourceKind,
}

impl ResourceHandle {
    /// The resource address.
    pub fn address(&self) -> &ResourceAddress {
        &self.address
    }

    /// The resource kind.
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Reference to the `id` attribute.
    pub fn id(&self) -> Reference {
        self.address.attr("id")
    }

    /// Reference to any exported attribute.
    pub fn attr(&self, attribute: impl Into<String>) -> Reference {
        self.address.attr(attribute)
    }
}

/// A named set of declarations handed to synthesis as one unit.
#[derive(Debug, Clone)]
pub struct Stack {
    name: String,
    provider: Option<AwsProvider>,
    declarations: IndexMap<String, Declaration>,
    outputs: IndexMap<String, TerraformOutput>,
    graph: DeclarationGraph,
}

impl Stack {
    /// Create an empty stack.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            provider: None,
            declarations: IndexMap::new(),
            outputs: IndexMap::new(),
            graph: DeclarationGraph::new(),
        }
    }

    /// Stack name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Configure the AWS provider.
    pub fn set_provider(&mut self, provider: AwsProvider) -> Result<()> {
        provider.validate()?;
        debug!(stack = %self.name, region = %provider.region, "configured provider");
        self.provider = Some(provider);
        Ok(())
    }

    /// The configured provider.
    pub fn provider(&self) -> Option<&AwsProvider> {
        self.provider.as_ref()
    }

    /// Declare a resource under construct id `id`.
    pub fn declare(
        &mut self,
        id: &str,
        declaration: impl Into<Declaration>,
    ) -> Result<ResourceHandle> {
        let declaration = declaration.into();
        validate_id(id)?;

        if self.declarations.contains_key(id) {
            return Err(Error::DuplicateId {
                stack: self.name.clone(),
                id: id.to_string(),
            });
        }

        declaration.validate(id)?;
        for (_, reference) in declaration.references() {
            self.check_reference(id, reference)?;
        }

        let kind = declaration.kind();
        self.graph.add_node(id, kind.terraform_type());
        for (field, reference) in declaration.references() {
            self.graph.add_edge(GraphEdge {
                from_id: reference.address().id().to_string(),
                to_id: id.to_string(),
                field: field.to_string(),
                attribute: reference.attribute().to_string(),
            })?;
        }

        debug!(
            stack = %self.name,
            id,
            resource_type = kind.terraform_type(),
            references = declaration.references().len(),
            "declared resource"
        );
        self.declarations.insert(id.to_string(), declaration);

        Ok(ResourceHandle {
            address: ResourceAddress::new(kind.terraform_type(), id),
            kind,
        })
    }

    /// Declare a named output.
    pub fn output(&mut self, name: &str, output: impl Into<TerraformOutput>) -> Result<()> {
        let output = output.into();
        validate_id(name)?;

        if self.outputs.contains_key(name) {
            return Err(Error::DuplicateOutput(name.to_string()));
        }

        let node_id = format!("output.{}", name);
        self.check_reference(&node_id, &output.value)?;

        self.graph.add_node(&node_id, "output");
        self.graph.add_edge(GraphEdge {
            from_id: output.value.address().id().to_string(),
            to_id: node_id,
            field: "value".to_string(),
            attribute: output.value.attribute().to_string(),
        })?;

        debug!(stack = %self.name, output = name, value = %output.value, "declared output");
        self.outputs.insert(name.to_string(), output);
        Ok(())
    }

    /// Declarations in declaration order.
    pub fn declarations(&self) -> impl Iterator<Item = (&str, &Declaration)> {
        self.declarations.iter().map(|(id, d)| (id.as_str(), d))
    }

    /// Look up a declaration by construct id.
    pub fn get(&self, id: &str) -> Option<&Declaration> {
        self.declarations.get(id)
    }

    /// The declaration a reference points at.
    pub fn resolve(&self, reference: &Reference) -> Option<&Declaration> {
        self.declarations
            .get(reference.address().id())
            .filter(|d| d.kind().terraform_type() == reference.address().resource_type())
    }

    /// Construct ids of every declaration of `kind`, in declaration order.
    pub fn ids_of_kind(&self, kind: ResourceKind) -> Vec<&str> {
        self.declarations()
            .filter(|(_, d)| d.kind() == kind)
            .map(|(id, _)| id)
            .collect()
    }

    /// Outputs in declaration order.
    pub fn outputs(&self) -> impl Iterator<Item = (&str, &TerraformOutput)> {
        self.outputs.iter().map(|(name, o)| (name.as_str(), o))
    }

    /// The dependency graph.
    pub fn graph(&self) -> &DeclarationGraph {
        &self.graph
    }

    /// Number of declarations.
    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    /// True when nothing is declared.
    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// Verify the dependency graph is acyclic and return construct ids in
    /// topological order.
    pub fn creation_order(&self) -> Result<Vec<String>> {
        let order = self.graph.topological_order()?;
        Ok(order
            .into_iter()
            .filter(|id| self.declarations.contains_key(id))
            .collect())
    }

    fn check_reference(&self, from: &str, reference: &Reference) -> Result<()> {
        let target = reference.address();
        let declared = self
            .declarations
            .get(target.id())
            .ok_or_else(|| Error::unresolved_reference(from, target.to_string()))?;

        let actual = declared.kind();
        if actual.terraform_type() != target.resource_type() {
            return Err(Error::ReferenceTypeMismatch {
                from: from.to_string(),
                target: target.to_string(),
                id: target.id().to_string(),
                actual: actual.terraform_type().to_string(),
            });
        }

        if !actual.exports(reference.attribute()) {
            return Err(Error::UnknownAttribute {
                resource_type: actual.terraform_type().to_string(),
                attribute: reference.attribute().to_string(),
            });
        }

        Ok(())
    }
}
