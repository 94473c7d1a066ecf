//! Resource addresses and attribute references.
//!
//! A [`Reference`] is how one declaration points at another: it names the
//! target's resource type, its construct id and one exported attribute, and
//! serializes to the Terraform interpolation token the external engine
//! resolves at apply time (`${aws_vpc.cdktf-vpc.id}`).

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, Serializer};
use std::fmt;

use crate::error::{Error, Result};

static CONSTRUCT_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_-]*$").expect("construct id pattern is valid")
});

/// Validate a construct id against Terraform's block label rules.
pub fn validate_id(id: &str) -> Result<()> {
    if CONSTRUCT_ID.is_match(id) {
        Ok(())
    } else {
        Err(Error::InvalidId(id.to_string()))
    }
}

/// Validate a stack name. It becomes a directory under the outdir and part
/// of the state file name, so it follows the construct id rules.
pub fn validate_stack_name(name: &str) -> Result<()> {
    if CONSTRUCT_ID.is_match(name) {
        Ok(())
    } else {
        Err(Error::InvalidStackName(name.to_string()))
    }
}

/// The address of a declared resource, `<type>.<id>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceAddress {
    resource_type: &'static str,
    id: String,
}

impl ResourceAddress {
    /// Create an address.
    pub fn new(resource_type: &'static str, id: impl Into<String>) -> Self {
        Self {
            resource_type,
            id: id.into(),
        }
    }

    /// Terraform resource type, e.g. `aws_vpc`.
    pub fn resource_type(&self) -> &'static str {
        self.resource_type
    }

    /// Construct id, e.g. `cdktf-vpc`.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Reference one attribute of this resource.
    pub fn attr(&self, attribute: impl Into<String>) -> Reference {
        Reference {
            address: self.clone(),
            attribute: attribute.into(),
        }
    }
}

impl fmt::Display for ResourceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.resource_type, self.id)
    }
}

/// A reference to an exported attribute of a declared resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
    address: ResourceAddress,
    attribute: String,
}

impl Reference {
    /// The referenced resource.
    pub fn address(&self) -> &ResourceAddress {
        &self.address
    }

    /// The referenced attribute.
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// The interpolation token, `${<type>.<id>.<attribute>}`.
    pub fn token(&self) -> String {
        format!("${{{}.{}}}", self.address, self.attribute)
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token())
    }
}

impl Serialize for Reference {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.token())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_id() {
        assert!(validate_id("cdktf-vpc").is_ok());
        assert!(validate_id("_private").is_ok());
        assert!(validate_id("subnet_1a").is_ok());
        assert!(validate_id("1a-subnet").is_err());
        assert!(validate_id("has space").is_err());
        assert!(validate_id("dotted.name").is_err());
        assert!(validate_id("").is_err());
    }

    #[test]
    fn test_validate_stack_name() {
        assert!(validate_stack_name("AWS-Experiment3").is_ok());
        assert!(matches!(
            validate_stack_name("../escaped"),
            Err(Error::InvalidStackName(_))
        ));
        assert!(validate_stack_name("/tmp/abs").is_err());
        assert!(validate_stack_name("a/b").is_err());
        assert!(validate_stack_name("").is_err());
    }

    #[test]
    fn test_reference_token() {
        let vpc = ResourceAddress::new("aws_vpc", "cdktf-vpc");
        assert_eq!(vpc.to_string(), "aws_vpc.cdktf-vpc");

        let id = vpc.attr("id");
        assert_eq!(id.token(), "${aws_vpc.cdktf-vpc.id}");
        assert_eq!(id.attribute(), "id");
        assert_eq!(id.address(), &vpc);
    }

    #[test]
    fn test_reference_serializes_as_token() {
        let dns = ResourceAddress::new("aws_instance", "cdktf-instance").attr("public_dns");
        assert_eq!(
            serde_json::to_value(&dns).unwrap(),
            serde_json::json!("${aws_instance.cdktf-instance.public_dns}")
        );
    }
}
