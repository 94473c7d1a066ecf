//! The single-instance public subnet topology.
//!
//! [`build_stack`] declares, in this order: the AWS provider, a VPC, an
//! internet gateway, a route table with a default route through the gateway,
//! one public subnet, the association between that subnet and the route
//! table, a security group admitting one TCP port from one address, and one
//! instance in the subnet behind that group. The instance's public DNS name
//! and public IP are exported as outputs.
//!
//! Every literal lives in [`StackSettings`]; the defaults reproduce the
//! original lab setup in `ca-central-1`.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::network::Ipv4Cidr;
use crate::resources::{
    AwsProvider, Instance, InternetGateway, Route, RouteTable, RouteTableAssociation,
    SecurityGroup, SecurityRule, Subnet, Vpc,
};
use crate::stack::{Stack, TerraformOutput};

/// Default stack name.
pub const DEFAULT_STACK_NAME: &str = "AWS-Experiment3";

/// Construct ids used by the topology.
pub mod ids {
    pub const VPC: &str = "cdktf-vpc";
    pub const INTERNET_GATEWAY: &str = "cdktf-ig";
    pub const ROUTE_TABLE: &str = "cdktf-rt";
    pub const SUBNET: &str = "cdktf-public-subnet-1a";
    pub const ROUTE_TABLE_ASSOCIATION: &str = "cdktf-public-subnet-1a-rta";
    pub const SECURITY_GROUP: &str = "cdktf-allow-ssh-from-home";
    pub const INSTANCE: &str = "cdktf-instance";
    pub const OUTPUT_PUBLIC_DNS: &str = "public_dns";
    pub const OUTPUT_PUBLIC_IP: &str = "public_ip";
}

/// Literal inputs of the topology.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StackSettings {
    /// AWS region
    pub region: String,
    /// VPC address block
    pub vpc_cidr: Ipv4Cidr,
    /// Public subnet address block
    pub subnet_cidr: Ipv4Cidr,
    /// Availability zone of the subnet
    pub availability_zone: String,
    /// Port admitted by the security group
    pub ingress_port: u16,
    /// The one address block admitted
    pub allowed_cidr: Ipv4Cidr,
    /// Machine image id
    pub ami: String,
    /// Instance size class
    pub instance_type: String,
    /// Key pair name
    pub key_name: String,
}

impl Default for StackSettings {
    fn default() -> Self {
        Self {
            region: "ca-central-1".to_string(),
            vpc_cidr: Ipv4Cidr::truncated([10, 0, 0, 0].into(), 16),
            subnet_cidr: Ipv4Cidr::truncated([10, 0, 3, 0].into(), 24),
            availability_zone: "ca-central-1a".to_string(),
            ingress_port: 22,
            allowed_cidr: Ipv4Cidr::host([206, 248, 172, 36].into()),
            ami: "ami-0801628222e2e96d6".to_string(),
            instance_type: "t2.nano".to_string(),
            key_name: "MyKeyPair".to_string(),
        }
    }
}

/// Declare the topology into a new stack named `name`.
pub fn build_stack(name: &str, settings: &StackSettings) -> Result<Stack> {
    let mut stack = Stack::new(name);
    stack.set_provider(AwsProvider::new(&settings.region))?;

    let vpc = stack.declare(
        ids::VPC,
        Vpc::new(settings.vpc_cidr)
            .dns(true, true)
            .tag("Name", "CDKTF_VPC"),
    )?;

    let internet_gateway = stack.declare(
        ids::INTERNET_GATEWAY,
        InternetGateway::new(vpc.id()).tag("Name", "CDKTF_IG"),
    )?;

    let route_table = stack.declare(
        ids::ROUTE_TABLE,
        RouteTable::new(vpc.id()).route(Route::to_gateway(Ipv4Cidr::ANY, internet_gateway.id())),
    )?;

    let subnet = stack.declare(
        ids::SUBNET,
        Subnet::new(vpc.id(), settings.subnet_cidr, &settings.availability_zone)
            .tag("Name", "CDKTF_Public1a"),
    )?;

    stack.declare(
        ids::ROUTE_TABLE_ASSOCIATION,
        RouteTableAssociation::new(subnet.id(), route_table.id()),
    )?;

    let security_group = stack.declare(
        ids::SECURITY_GROUP,
        SecurityGroup::new(ids::SECURITY_GROUP, vpc.id())
            .description("Allow SSH from home IP")
            .ingress(SecurityRule::tcp(settings.ingress_port, settings.allowed_cidr))
            .tag("Name", "CDKTF-allow-ssh-from-home"),
    )?;

    let instance = stack.declare(
        ids::INSTANCE,
        Instance::new(&settings.ami, &settings.instance_type, subnet.id())
            .associate_public_ip_address(true)
            .key_name(&settings.key_name)
            .security_group(security_group.id())
            .tag("Name", "CDKTF_Instance"),
    )?;

    stack.output(
        ids::OUTPUT_PUBLIC_DNS,
        TerraformOutput::new(instance.attr("public_dns")),
    )?;
    stack.output(
        ids::OUTPUT_PUBLIC_IP,
        TerraformOutput::new(instance.attr("public_ip")),
    )?;

    Ok(stack)
}
