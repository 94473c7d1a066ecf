//! Typed resource declarations.
//!
//! Each declaration is a plain record of literal values plus [`Reference`]s to
//! resources declared earlier in the same stack. The set of supported
//! resource types is closed: [`ResourceKind`] enumerates them together with
//! the attributes each one exports, and [`Declaration`] wraps the records so
//! a stack can hold them in one ordered collection.

pub mod instance;
pub mod provider;
pub mod security_group;
pub mod vpc;

pub use instance::Instance;
pub use provider::AwsProvider;
pub use security_group::{Protocol, SecurityGroup, SecurityRule};
pub use vpc::{InternetGateway, Route, RouteTable, RouteTableAssociation, Subnet, Vpc};

use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

use crate::error::{Error, Result};
use crate::reference::Reference;

/// Resource tags, kept in insertion order.
pub type Tags = IndexMap<String, String>;

/// The closed set of resource types a stack can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// `aws_vpc`
    Vpc,
    /// `aws_internet_gateway`
    InternetGateway,
    /// `aws_route_table`
    RouteTable,
    /// `aws_subnet`
    Subnet,
    /// `aws_route_table_association`
    RouteTableAssociation,
    /// `aws_security_group`
    SecurityGroup,
    /// `aws_instance`
    Instance,
}

impl ResourceKind {
    /// Every supported kind.
    pub const ALL: [ResourceKind; 7] = [
        ResourceKind::Vpc,
        ResourceKind::InternetGateway,
        ResourceKind::RouteTable,
        ResourceKind::Subnet,
        ResourceKind::RouteTableAssociation,
        ResourceKind::SecurityGroup,
        ResourceKind::Instance,
    ];

    /// Terraform resource type name.
    pub fn terraform_type(&self) -> &'static str {
        match self {
            ResourceKind::Vpc => "aws_vpc",
            ResourceKind::InternetGateway => "aws_internet_gateway",
            ResourceKind::RouteTable => "aws_route_table",
            ResourceKind::Subnet => "aws_subnet",
            ResourceKind::RouteTableAssociation => "aws_route_table_association",
            ResourceKind::SecurityGroup => "aws_security_group",
            ResourceKind::Instance => "aws_instance",
        }
    }

    /// Look up a kind by its Terraform type name.
    pub fn from_terraform_type(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.terraform_type() == name)
    }

    /// Attributes the provider exports after apply and that other
    /// declarations or outputs may reference.
    pub fn exported_attributes(&self) -> &'static [&'static str] {
        match self {
            ResourceKind::Vpc => &[
                "id",
                "arn",
                "cidr_block",
                "default_network_acl_id",
                "default_route_table_id",
                "default_security_group_id",
                "main_route_table_id",
                "owner_id",
                "tags_all",
            ],
            ResourceKind::InternetGateway => &["id", "arn", "owner_id", "tags_all"],
            ResourceKind::RouteTable => &["id", "arn", "owner_id", "tags_all"],
            ResourceKind::Subnet => &[
                "id",
                "arn",
                "cidr_block",
                "availability_zone",
                "availability_zone_id",
                "owner_id",
                "tags_all",
            ],
            ResourceKind::RouteTableAssociation => &["id"],
            ResourceKind::SecurityGroup => &["id", "arn", "name", "owner_id", "tags_all"],
            ResourceKind::Instance => &[
                "id",
                "arn",
                "public_dns",
                "public_ip",
                "private_dns",
                "private_ip",
                "primary_network_interface_id",
                "instance_state",
                "tags_all",
            ],
        }
    }

    /// Check whether the kind exports `attribute`.
    pub fn exports(&self, attribute: &str) -> bool {
        self.exported_attributes().contains(&attribute)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.terraform_type())
    }
}

/// One declared resource.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Declaration {
    Vpc(Vpc),
    InternetGateway(InternetGateway),
    RouteTable(RouteTable),
    Subnet(Subnet),
    RouteTableAssociation(RouteTableAssociation),
    SecurityGroup(SecurityGroup),
    Instance(Instance),
}

impl Declaration {
    /// The resource kind.
    pub fn kind(&self) -> ResourceKind {
        match self {
            Declaration::Vpc(_) => ResourceKind::Vpc,
            Declaration::InternetGateway(_) => ResourceKind::InternetGateway,
            Declaration::RouteTable(_) => ResourceKind::RouteTable,
            Declaration::Subnet(_) => ResourceKind::Subnet,
            Declaration::RouteTableAssociation(_) => ResourceKind::RouteTableAssociation,
            Declaration::SecurityGroup(_) => ResourceKind::SecurityGroup,
            Declaration::Instance(_) => ResourceKind::Instance,
        }
    }

    /// Every reference the declaration holds, paired with the field that
    /// holds it, in field order.
    pub fn references(&self) -> Vec<(&'static str, &Reference)> {
        match self {
            Declaration::Vpc(_) => Vec::new(),
            Declaration::InternetGateway(igw) => vec![("vpc_id", &igw.vpc_id)],
            Declaration::RouteTable(rt) => {
                let mut refs = vec![("vpc_id", &rt.vpc_id)];
                refs.extend(rt.routes.iter().map(|r| ("route.gateway_id", &r.gateway_id)));
                refs
            }
            Declaration::Subnet(subnet) => vec![("vpc_id", &subnet.vpc_id)],
            Declaration::RouteTableAssociation(rta) => vec![
                ("subnet_id", &rta.subnet_id),
                ("route_table_id", &rta.route_table_id),
            ],
            Declaration::SecurityGroup(sg) => vec![("vpc_id", &sg.vpc_id)],
            Declaration::Instance(instance) => {
                let mut refs = vec![("subnet_id", &instance.subnet_id)];
                refs.extend(
                    instance
                        .vpc_security_group_ids
                        .iter()
                        .map(|r| ("vpc_security_group_ids", r)),
                );
                refs
            }
        }
    }

    /// Validate the literal values of the declaration.
    pub fn validate(&self, id: &str) -> Result<()> {
        match self {
            Declaration::Vpc(vpc) => vpc.validate(id),
            Declaration::RouteTable(rt) => rt.validate(id),
            Declaration::Subnet(subnet) => subnet.validate(id),
            Declaration::SecurityGroup(sg) => sg.validate(id),
            Declaration::Instance(instance) => instance.validate(id),
            Declaration::InternetGateway(_) | Declaration::RouteTableAssociation(_) => Ok(()),
        }
    }

    /// Tags carried by the declaration, if the type supports tags.
    pub fn tags(&self) -> Option<&Tags> {
        match self {
            Declaration::Vpc(v) => Some(&v.tags),
            Declaration::InternetGateway(v) => Some(&v.tags),
            Declaration::RouteTable(v) => Some(&v.tags),
            Declaration::Subnet(v) => Some(&v.tags),
            Declaration::SecurityGroup(v) => Some(&v.tags),
            Declaration::Instance(v) => Some(&v.tags),
            Declaration::RouteTableAssociation(_) => None,
        }
    }

    /// The Terraform JSON body of the declaration.
    pub fn body(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

macro_rules! impl_into_declaration {
    ($($ty:ident),* $(,)?) => {
        $(
            impl From<$ty> for Declaration {
                fn from(value: $ty) -> Self {
                    Declaration::$ty(value)
                }
            }
        )*
    };
}

impl_into_declaration!(
    Vpc,
    InternetGateway,
    RouteTable,
    Subnet,
    RouteTableAssociation,
    SecurityGroup,
    Instance,
);

/// Reject an empty string literal.
pub(crate) fn require_non_empty(id: &str, field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::invalid_value(id, field, "must not be empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::ResourceAddress;

    #[test]
    fn test_kind_roundtrip_by_name() {
        for kind in ResourceKind::ALL {
            assert_eq!(ResourceKind::from_terraform_type(kind.terraform_type()), Some(kind));
            assert!(kind.exports("id"));
        }
        assert_eq!(ResourceKind::from_terraform_type("aws_s3_bucket"), None);
    }

    #[test]
    fn test_instance_exports_public_attributes() {
        assert!(ResourceKind::Instance.exports("public_dns"));
        assert!(ResourceKind::Instance.exports("public_ip"));
        assert!(!ResourceKind::Vpc.exports("public_ip"));
    }

    #[test]
    fn test_declaration_references() {
        let vpc = ResourceAddress::new("aws_vpc", "net");
        let igw = ResourceAddress::new("aws_internet_gateway", "gw");
        let rt = RouteTable::new(vpc.attr("id"))
            .route(Route::to_gateway(crate::network::Ipv4Cidr::ANY, igw.attr("id")));

        let decl = Declaration::from(rt);
        assert_eq!(decl.kind(), ResourceKind::RouteTable);
        let targets: Vec<(&str, String)> = decl
            .references()
            .into_iter()
            .map(|(field, r)| (field, r.token()))
            .collect();
        assert_eq!(
            targets,
            vec![
                ("vpc_id", "${aws_vpc.net.id}".to_string()),
                ("route.gateway_id", "${aws_internet_gateway.gw.id}".to_string()),
            ]
        );
    }

    #[test]
    fn test_association_has_no_tags() {
        let subnet = ResourceAddress::new("aws_subnet", "a");
        let rt = ResourceAddress::new("aws_route_table", "b");
        let decl = Declaration::from(RouteTableAssociation::new(subnet.attr("id"), rt.attr("id")));
        assert!(decl.tags().is_none());
        assert!(decl.validate("assoc").is_ok());
    }
}
