//! `aws_instance` declarations.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use super::Tags;
use crate::error::{Error, Result};
use crate::reference::Reference;

static AMI_ID_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ami-([0-9a-f]{8}|[0-9a-f]{17})$").expect("Invalid AMI id regex"));

static INSTANCE_TYPE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z][a-z0-9-]*\.[a-z0-9]+$").expect("Invalid instance type regex")
});

/// An `aws_instance` declaration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Instance {
    /// Machine image id
    pub ami: String,
    /// Size class, e.g. `t2.nano`
    pub instance_type: String,
    /// Subnet to launch into
    pub subnet_id: Reference,
    /// Assign a public address on launch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub associate_public_ip_address: Option<bool>,
    /// Key pair for SSH access
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_name: Option<String>,
    /// Attached security groups
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub vpc_security_group_ids: Vec<Reference>,
    /// Resource tags
    #[serde(skip_serializing_if = "Tags::is_empty")]
    pub tags: Tags,
}

impl Instance {
    /// Create an instance declaration.
    pub fn new(ami: impl Into<String>, instance_type: impl Into<String>, subnet_id: Reference) -> Self {
        Self {
            ami: ami.into(),
            instance_type: instance_type.into(),
            subnet_id,
            associate_public_ip_address: None,
            key_name: None,
            vpc_security_group_ids: Vec::new(),
            tags: Tags::new(),
        }
    }

    /// Set public address assignment.
    pub fn associate_public_ip_address(mut self, enabled: bool) -> Self {
        self.associate_public_ip_address = Some(enabled);
        self
    }

    /// Set the key pair.
    pub fn key_name(mut self, key_name: impl Into<String>) -> Self {
        self.key_name = Some(key_name.into());
        self
    }

    /// Attach a security group.
    pub fn security_group(mut self, group_id: Reference) -> Self {
        self.vpc_security_group_ids.push(group_id);
        self
    }

    /// Add a tag.
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub(crate) fn validate(&self, id: &str) -> Result<()> {
        if !AMI_ID_REGEX.is_match(&self.ami) {
            return Err(Error::invalid_value(
                id,
                "ami",
                format!("'{}' is not an AMI id (ami- followed by 8 or 17 hex digits)", self.ami),
            ));
        }
        if !INSTANCE_TYPE_REGEX.is_match(&self.instance_type) {
            return Err(Error::invalid_value(
                id,
                "instance_type",
                format!("'{}' is not an instance type (family.size)", self.instance_type),
            ));
        }
        if let Some(key) = &self.key_name {
            if key.trim().is_empty() {
                return Err(Error::invalid_value(id, "key_name", "must not be empty"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::ResourceAddress;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn subnet() -> Reference {
        ResourceAddress::new("aws_subnet", "public").attr("id")
    }

    #[test]
    fn test_instance_body() {
        let instance = Instance::new("ami-0801628222e2e96d6", "t2.nano", subnet())
            .associate_public_ip_address(true)
            .key_name("MyKeyPair")
            .security_group(ResourceAddress::new("aws_security_group", "ssh").attr("id"))
            .tag("Name", "CDKTF_Instance");

        assert_eq!(
            serde_json::to_value(&instance).unwrap(),
            json!({
                "ami": "ami-0801628222e2e96d6",
                "instance_type": "t2.nano",
                "subnet_id": "${aws_subnet.public.id}",
                "associate_public_ip_address": true,
                "key_name": "MyKeyPair",
                "vpc_security_group_ids": ["${aws_security_group.ssh.id}"],
                "tags": {"Name": "CDKTF_Instance"}
            })
        );
        assert!(instance.validate("vm").is_ok());
    }

    #[test]
    fn test_ami_validation() {
        assert!(Instance::new("ami-12345678", "t3.micro", subnet()).validate("vm").is_ok());
        assert!(Instance::new("ami-123", "t3.micro", subnet()).validate("vm").is_err());
        assert!(Instance::new("img-12345678", "t3.micro", subnet()).validate("vm").is_err());
    }

    #[test]
    fn test_instance_type_validation() {
        assert!(Instance::new("ami-12345678", "m5d.xlarge", subnet()).validate("vm").is_ok());
        assert!(Instance::new("ami-12345678", "nano", subnet()).validate("vm").is_err());
        assert!(Instance::new("ami-12345678", "T2.Nano", subnet()).validate("vm").is_err());
    }

    #[test]
    fn test_empty_key_name_rejected() {
        let instance = Instance::new("ami-12345678", "t2.nano", subnet()).key_name("");
        assert!(instance.validate("vm").is_err());
    }
}
