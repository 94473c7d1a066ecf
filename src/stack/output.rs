//! Named output values surfaced by the external engine after apply.

use serde::Serialize;

use crate::reference::Reference;

/// A Terraform output whose value reads one attribute of a declared resource.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TerraformOutput {
    /// The referenced attribute
    pub value: Reference,
    /// Human-readable description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Hide the value in engine output
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub sensitive: bool,
}

impl TerraformOutput {
    /// Create an output for `value`.
    pub fn new(value: Reference) -> Self {
        Self {
            value,
            description: None,
            sensitive: false,
        }
    }

    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Mark the output sensitive.
    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }
}

impl From<Reference> for TerraformOutput {
    fn from(value: Reference) -> Self {
        Self::new(value)
    }
}
