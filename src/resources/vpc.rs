//! VPC networking declarations: the VPC itself, its internet gateway, route
//! tables, subnets and route table associations.
//!
//! ## Example
//!
//! ```rust
//! use stackform::prelude::*;
//!
//! let mut stack = Stack::new("net");
//! let vpc = stack
//!     .declare("main", Vpc::new("10.0.0.0/16".parse()?).dns(true, true))
//!     .unwrap();
//! let gw = stack.declare("gw", InternetGateway::new(vpc.id())).unwrap();
//! stack
//!     .declare(
//!         "public",
//!         RouteTable::new(vpc.id()).route(Route::to_gateway(Ipv4Cidr::ANY, gw.id())),
//!     )
//!     .unwrap();
//! # Ok::<(), stackform::Error>(())
//! ```

use serde::Serialize;

use super::{require_non_empty, Tags};
use crate::error::{Error, Result};
use crate::network::Ipv4Cidr;
use crate::reference::Reference;

/// An `aws_vpc` declaration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Vpc {
    /// Address block of the VPC
    pub cidr_block: Ipv4Cidr,
    /// Assign public DNS hostnames to instances
    pub enable_dns_hostnames: bool,
    /// Enable the Amazon-provided DNS resolver
    pub enable_dns_support: bool,
    /// Resource tags
    #[serde(skip_serializing_if = "Tags::is_empty")]
    pub tags: Tags,
}

impl Vpc {
    /// Create a VPC with DNS hostnames off and DNS support on, the AWS defaults.
    pub fn new(cidr_block: Ipv4Cidr) -> Self {
        Self {
            cidr_block,
            enable_dns_hostnames: false,
            enable_dns_support: true,
            tags: Tags::new(),
        }
    }

    /// Set the DNS options.
    pub fn dns(mut self, hostnames: bool, support: bool) -> Self {
        self.enable_dns_hostnames = hostnames;
        self.enable_dns_support = support;
        self
    }

    /// Add a tag.
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub(crate) fn validate(&self, id: &str) -> Result<()> {
        // AWS accepts VPC blocks between /16 and /28.
        let prefix = self.cidr_block.prefix_len();
        if !(16..=28).contains(&prefix) {
            return Err(Error::invalid_value(
                id,
                "cidr_block",
                format!("VPC prefix length must be between /16 and /28, got /{}", prefix),
            ));
        }
        if self.enable_dns_hostnames && !self.enable_dns_support {
            return Err(Error::invalid_value(
                id,
                "enable_dns_hostnames",
                "DNS hostnames require DNS support",
            ));
        }
        Ok(())
    }
}

/// An `aws_internet_gateway` declaration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InternetGateway {
    /// VPC the gateway is attached to
    pub vpc_id: Reference,
    /// Resource tags
    #[serde(skip_serializing_if = "Tags::is_empty")]
    pub tags: Tags,
}

impl InternetGateway {
    /// Create a gateway attached to `vpc_id`.
    pub fn new(vpc_id: Reference) -> Self {
        Self {
            vpc_id,
            tags: Tags::new(),
        }
    }

    /// Add a tag.
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }
}

/// One route of a route table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    /// Destination block
    pub cidr_block: Ipv4Cidr,
    /// Target gateway
    pub gateway_id: Reference,
}

impl Route {
    /// Route `destination` through an internet gateway.
    pub fn to_gateway(destination: Ipv4Cidr, gateway_id: Reference) -> Self {
        Self {
            cidr_block: destination,
            gateway_id,
        }
    }
}

/// An `aws_route_table` declaration with inline routes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteTable {
    /// VPC the table belongs to
    pub vpc_id: Reference,
    /// Inline routes
    #[serde(rename = "route", skip_serializing_if = "Vec::is_empty")]
    pub routes: Vec<Route>,
    /// Resource tags
    #[serde(skip_serializing_if = "Tags::is_empty")]
    pub tags: Tags,
}

impl RouteTable {
    /// Create an empty route table in `vpc_id`.
    pub fn new(vpc_id: Reference) -> Self {
        Self {
            vpc_id,
            routes: Vec::new(),
            tags: Tags::new(),
        }
    }

    /// Add a route.
    pub fn route(mut self, route: Route) -> Self {
        self.routes.push(route);
        self
    }

    /// Add a tag.
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// The `0.0.0.0/0` route, if any.
    pub fn default_route(&self) -> Option<&Route> {
        self.routes.iter().find(|r| r.cidr_block.is_default_route())
    }

    pub(crate) fn validate(&self, id: &str) -> Result<()> {
        for (i, route) in self.routes.iter().enumerate() {
            let duplicate = self.routes[..i]
                .iter()
                .any(|other| other.cidr_block == route.cidr_block);
            if duplicate {
                return Err(Error::invalid_value(
                    id,
                    "route",
                    format!("duplicate destination {}", route.cidr_block),
                ));
            }
        }
        Ok(())
    }
}

/// An `aws_subnet` declaration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Subnet {
    /// VPC the subnet belongs to
    pub vpc_id: Reference,
    /// Address block, a sub-range of the VPC block
    pub cidr_block: Ipv4Cidr,
    /// Availability zone, e.g. `ca-central-1a`
    pub availability_zone: String,
    /// Auto-assign public addresses to instances launched in the subnet
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map_public_ip_on_launch: Option<bool>,
    /// Resource tags
    #[serde(skip_serializing_if = "Tags::is_empty")]
    pub tags: Tags,
}

impl Subnet {
    /// Create a subnet.
    pub fn new(
        vpc_id: Reference,
        cidr_block: Ipv4Cidr,
        availability_zone: impl Into<String>,
    ) -> Self {
        Self {
            vpc_id,
            cidr_block,
            availability_zone: availability_zone.into(),
            map_public_ip_on_launch: None,
            tags: Tags::new(),
        }
    }

    /// Set public address auto-assignment.
    pub fn map_public_ip_on_launch(mut self, enabled: bool) -> Self {
        self.map_public_ip_on_launch = Some(enabled);
        self
    }

    /// Add a tag.
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub(crate) fn validate(&self, id: &str) -> Result<()> {
        require_non_empty(id, "availability_zone", &self.availability_zone)?;
        let prefix = self.cidr_block.prefix_len();
        if !(16..=28).contains(&prefix) {
            return Err(Error::invalid_value(
                id,
                "cidr_block",
                format!("subnet prefix length must be between /16 and /28, got /{}", prefix),
            ));
        }
        Ok(())
    }
}

/// An `aws_route_table_association` declaration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteTableAssociation {
    /// Associated subnet
    pub subnet_id: Reference,
    /// Associated route table
    pub route_table_id: Reference,
}

impl RouteTableAssociation {
    /// Associate `subnet_id` with `route_table_id`.
    pub fn new(subnet_id: Reference, route_table_id: Reference) -> Self {
        Self {
            subnet_id,
            route_table_id,
        }
    }
}
