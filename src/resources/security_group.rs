//! `aws_security_group` declarations and their ingress/egress rules.

use serde::{Serialize, Serializer};
use std::fmt;

use super::{require_non_empty, Tags};
use crate::error::{Error, Result};
use crate::network::Ipv4Cidr;
use crate::reference::Reference;

/// IP protocol of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    Tcp,
    Udp,
    Icmp,
    /// Every protocol (`-1`)
    All,
}

impl Protocol {
    /// The value Terraform expects.
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
            Protocol::Icmp => "icmp",
            Protocol::All => "-1",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Protocol {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One ingress or egress rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SecurityRule {
    /// First port of the range
    pub from_port: u16,
    /// Last port of the range
    pub to_port: u16,
    /// IP protocol
    pub protocol: Protocol,
    /// Source (ingress) or destination (egress) blocks
    pub cidr_blocks: Vec<Ipv4Cidr>,
    /// Rule description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl SecurityRule {
    /// A rule over a port range.
    pub fn new(from_port: u16, to_port: u16, protocol: Protocol, cidr_blocks: Vec<Ipv4Cidr>) -> Self {
        Self {
            from_port,
            to_port,
            protocol,
            cidr_blocks,
            description: None,
        }
    }

    /// A single TCP port from one block.
    pub fn tcp(port: u16, cidr: Ipv4Cidr) -> Self {
        Self::new(port, port, Protocol::Tcp, vec![cidr])
    }

    /// Every protocol and port to/from `0.0.0.0/0`.
    pub fn allow_all() -> Self {
        Self::new(0, 0, Protocol::All, vec![Ipv4Cidr::ANY])
    }

    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Check whether the rule covers `port` for `protocol`.
    pub fn permits(&self, protocol: Protocol, port: u16) -> bool {
        match self.protocol {
            Protocol::All => true,
            p => p == protocol && (self.from_port..=self.to_port).contains(&port),
        }
    }

    /// True when a block of the rule is `0.0.0.0/0`.
    pub fn is_open_to_world(&self) -> bool {
        self.cidr_blocks.iter().any(Ipv4Cidr::is_default_route)
    }

    fn validate(&self, id: &str, field: &str) -> Result<()> {
        if self.cidr_blocks.is_empty() {
            return Err(Error::invalid_value(id, field, "rule has no cidr_blocks"));
        }
        if self.protocol != Protocol::All && self.from_port > self.to_port {
            return Err(Error::invalid_value(
                id,
                field,
                format!("from_port {} is above to_port {}", self.from_port, self.to_port),
            ));
        }
        if self.protocol == Protocol::All && (self.from_port != 0 || self.to_port != 0) {
            return Err(Error::invalid_value(
                id,
                field,
                "protocol -1 requires from_port and to_port of 0",
            ));
        }
        Ok(())
    }
}

/// An `aws_security_group` declaration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SecurityGroup {
    /// Group name
    pub name: String,
    /// Group description
    pub description: String,
    /// VPC the group belongs to
    pub vpc_id: Reference,
    /// Inbound rules
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ingress: Vec<SecurityRule>,
    /// Outbound rules
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub egress: Vec<SecurityRule>,
    /// Resource tags
    #[serde(skip_serializing_if = "Tags::is_empty")]
    pub tags: Tags,
}

impl SecurityGroup {
    /// Create a group with no rules.
    pub fn new(name: impl Into<String>, vpc_id: Reference) -> Self {
        Self {
            name: name.into(),
            description: "Managed by Stackform".to_string(),
            vpc_id,
            ingress: Vec::new(),
            egress: Vec::new(),
            tags: Tags::new(),
        }
    }

    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Add an inbound rule.
    pub fn ingress(mut self, rule: SecurityRule) -> Self {
        self.ingress.push(rule);
        self
    }

    /// Add an outbound rule.
    pub fn egress(mut self, rule: SecurityRule) -> Self {
        self.egress.push(rule);
        self
    }

    /// Add a tag.
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub(crate) fn validate(&self, id: &str) -> Result<()> {
        require_non_empty(id, "name", &self.name)?;
        require_non_empty(id, "description", &self.description)?;
        if self.name.starts_with("sg-") {
            return Err(Error::invalid_value(id, "name", "must not start with 'sg-'"));
        }
        for rule in &self.ingress {
            rule.validate(id, "ingress")?;
        }
        for rule in &self.egress {
            rule.validate(id, "egress")?;
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

    fn group() -> SecurityGroup {
        SecurityGroup::new("allow-ssh", ResourceAddress::new("aws_vpc", "main").attr("id"))
            .description("Allow SSH from home IP")
    }

    #[test]
    fn test_security_group_body() {
        let sg = group().ingress(SecurityRule::tcp(22, "206.248.172.36/32".parse().unwrap()));
        assert_eq!(
            serde_json::to_value(&sg).unwrap(),
            json!({
                "name": "allow-ssh",
                "description": "Allow SSH from home IP",
                "vpc_id": "${aws_vpc.main.id}",
                "ingress": [{
                    "from_port": 22,
                    "to_port": 22,
                    "protocol": "tcp",
                    "cidr_blocks": ["206.248.172.36/32"]
                }]
            })
        );
        assert!(sg.validate("sg").is_ok());
    }

    #[test]
    fn test_rule_permits() {
        let ssh = SecurityRule::tcp(22, Ipv4Cidr::ANY);
        assert!(ssh.permits(Protocol::Tcp, 22));
        assert!(!ssh.permits(Protocol::Tcp, 80));
        assert!(!ssh.permits(Protocol::Udp, 22));
        assert!(SecurityRule::allow_all().permits(Protocol::Udp, 53));
    }

    #[test]
    fn test_rule_open_to_world() {
        assert!(SecurityRule::tcp(22, Ipv4Cidr::ANY).is_open_to_world());
        assert!(!SecurityRule::tcp(22, "206.248.172.36/32".parse().unwrap()).is_open_to_world());
    }

    #[test]
    fn test_invalid_rules_rejected() {
        let backwards = group().ingress(SecurityRule::new(
            443,
            80,
            Protocol::Tcp,
            vec![Ipv4Cidr::ANY],
        ));
        assert!(backwards.validate("sg").is_err());

        let ported_all = group().egress(SecurityRule::new(1, 2, Protocol::All, vec![Ipv4Cidr::ANY]));
        assert!(ported_all.validate("sg").is_err());

        let no_blocks = group().ingress(SecurityRule::new(22, 22, Protocol::Tcp, vec![]));
        assert!(no_blocks.validate("sg").is_err());

        assert!(group().egress(SecurityRule::allow_all()).validate("sg").is_ok());
    }

    #[test]
    fn test_reserved_name_prefix() {
        let sg = SecurityGroup::new("sg-web", ResourceAddress::new("aws_vpc", "main").attr("id"));
        assert!(sg.validate("sg").is_err());
    }
}
