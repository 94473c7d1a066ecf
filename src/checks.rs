//! Declaration-shape checks.
//!
//! The stack already guarantees that references resolve. These checks look
//! at the values behind the references: address blocks that must nest,
//! resources that must live in the same VPC, rules that expose more than
//! intended. None of them talk to a cloud API; they only read the
//! declaration.

use serde::Serialize;
use std::fmt;
use tracing::debug;

use crate::network::Ipv4Cidr;
use crate::reference::Reference;
use crate::resources::{Declaration, Subnet, Vpc};
use crate::stack::Stack;

/// How serious a finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

/// One problem found in a stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    /// Severity
    pub severity: Severity,
    /// Short machine-readable check name
    pub check: &'static str,
    /// Construct id, output name, or `provider`
    pub subject: String,
    /// Human-readable explanation
    pub message: String,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] {}: {}", self.severity, self.check, self.subject, self.message)
    }
}

/// Every finding for one stack.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CheckReport {
    /// Stack name
    pub stack: String,
    /// Findings in discovery order
    pub findings: Vec<Finding>,
}

impl CheckReport {
    fn push(
        &mut self,
        severity: Severity,
        check: &'static str,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.findings.push(Finding {
            severity,
            check,
            subject: subject.into(),
            message: message.into(),
        });
    }

    /// True when no finding is an error.
    pub fn is_ok(&self) -> bool {
        self.errors().next().is_none()
    }

    /// True when at least one finding is a warning.
    pub fn has_warnings(&self) -> bool {
        self.warnings().next().is_some()
    }

    /// Error findings.
    pub fn errors(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.severity == Severity::Error)
    }

    /// Warning findings.
    pub fn warnings(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.severity == Severity::Warning)
    }

    /// Number of error findings.
    pub fn error_count(&self) -> usize {
        self.errors().count()
    }
}

/// Run every check against `stack`.
pub fn run(stack: &Stack) -> CheckReport {
    let mut report = CheckReport {
        stack: stack.name().to_string(),
        findings: Vec::new(),
    };

    check_provider(stack, &mut report);
    check_subnets(stack, &mut report);
    check_routes(stack, &mut report);
    check_associations(stack, &mut report);
    check_security_groups(stack, &mut report);
    check_instances(stack, &mut report);
    check_outputs(stack, &mut report);

    debug!(
        stack = stack.name(),
        findings = report.findings.len(),
        errors = report.error_count(),
        "ran declaration checks"
    );
    report
}

fn check_provider(stack: &Stack, report: &mut CheckReport) {
    let Some(provider) = stack.provider() else {
        report.push(
            Severity::Error,
            "provider",
            "provider",
            "no AWS provider configured",
        );
        return;
    };

    for (id, decl) in stack.declarations() {
        if let Declaration::Subnet(subnet) = decl {
            if !zone_in_region(&subnet.availability_zone, &provider.region) {
                report.push(
                    Severity::Error,
                    "availability-zone",
                    id,
                    format!(
                        "availability zone '{}' is not in region '{}'",
                        subnet.availability_zone, provider.region
                    ),
                );
            }
        }
    }
}

/// A zone name is its region followed by a single letter (`ca-central-1a`).
fn zone_in_region(zone: &str, region: &str) -> bool {
    zone.strip_prefix(region).is_some_and(|suffix| {
        let mut letters = suffix.chars();
        matches!((letters.next(), letters.next()), (Some(c), None) if c.is_ascii_lowercase())
    })
}

fn check_subnets(stack: &Stack, report: &mut CheckReport) {
    let subnets: Vec<(&str, &Subnet)> = stack
        .declarations()
        .filter_map(|(id, d)| match d {
            Declaration::Subnet(s) => Some((id, s)),
            _ => None,
        })
        .collect();

    for (i, (id, subnet)) in subnets.iter().enumerate() {
        if let Some(vpc) = vpc_of(stack, &subnet.vpc_id) {
            if !vpc.cidr_block.contains(&subnet.cidr_block) {
                report.push(
                    Severity::Error,
                    "subnet-range",
                    *id,
                    format!(
                        "subnet block {} is not inside VPC block {}",
                        subnet.cidr_block, vpc.cidr_block
                    ),
                );
            }
        }

        for (other_id, other) in &subnets[..i] {
            let same_vpc = other.vpc_id.address() == subnet.vpc_id.address();
            if same_vpc && other.cidr_block.overlaps(&subnet.cidr_block) {
                report.push(
                    Severity::Error,
                    "subnet-overlap",
                    *id,
                    format!(
                        "subnet block {} overlaps {} of '{}'",
                        subnet.cidr_block, other.cidr_block, other_id
                    ),
                );
            }
        }
    }
}

fn check_routes(stack: &Stack, report: &mut CheckReport) {
    for (id, decl) in stack.declarations() {
        let Declaration::RouteTable(rt) = decl else {
            continue;
        };
        for route in &rt.routes {
            if let Some(Declaration::InternetGateway(igw)) = stack.resolve(&route.gateway_id) {
                if igw.vpc_id.address() != rt.vpc_id.address() {
                    report.push(
                        Severity::Error,
                        "route-gateway",
                        id,
                        format!(
                            "route to {} uses gateway '{}' attached to '{}', not '{}'",
                            route.cidr_block,
                            route.gateway_id.address().id(),
                            igw.vpc_id.address().id(),
                            rt.vpc_id.address().id()
                        ),
                    );
                }
            }
        }
    }
}

fn check_associations(stack: &Stack, report: &mut CheckReport) {
    for (id, decl) in stack.declarations() {
        let Declaration::RouteTableAssociation(rta) = decl else {
            continue;
        };
        let subnet_vpc = vpc_id_of(stack, &rta.subnet_id);
        let table_vpc = vpc_id_of(stack, &rta.route_table_id);
        if let (Some(subnet_vpc), Some(table_vpc)) = (subnet_vpc, table_vpc) {
            if subnet_vpc != table_vpc {
                report.push(
                    Severity::Error,
                    "association-vpc",
                    id,
                    format!(
                        "subnet is in '{}' but route table is in '{}'",
                        subnet_vpc, table_vpc
                    ),
                );
            }
        }
    }
}

fn check_security_groups(stack: &Stack, report: &mut CheckReport) {
    for (id, decl) in stack.declarations() {
        let Declaration::SecurityGroup(sg) = decl else {
            continue;
        };
        for rule in sg.ingress.iter().filter(|r| r.is_open_to_world()) {
            report.push(
                Severity::Warning,
                "open-ingress",
                id,
                format!(
                    "ingress {} {}-{} is open to {}",
                    rule.protocol,
                    rule.from_port,
                    rule.to_port,
                    Ipv4Cidr::ANY
                ),
            );
        }
    }
}

fn check_instances(stack: &Stack, report: &mut CheckReport) {
    for (id, decl) in stack.declarations() {
        let Declaration::Instance(instance) = decl else {
            continue;
        };
        let Some(subnet_vpc) = vpc_id_of(stack, &instance.subnet_id) else {
            continue;
        };
        for group in &instance.vpc_security_group_ids {
            if let Some(group_vpc) = vpc_id_of(stack, group) {
                if group_vpc != subnet_vpc {
                    report.push(
                        Severity::Error,
                        "instance-vpc",
                        id,
                        format!(
                            "security group '{}' is in '{}' but subnet is in '{}'",
                            group.address().id(),
                            group_vpc,
                            subnet_vpc
                        ),
                    );
                }
            }
        }
    }
}

fn check_outputs(stack: &Stack, report: &mut CheckReport) {
    if stack.outputs().next().is_none() {
        report.push(
            Severity::Warning,
            "outputs",
            stack.name(),
            "stack declares no outputs",
        );
    }
}

fn vpc_of<'a>(stack: &'a Stack, reference: &Reference) -> Option<&'a Vpc> {
    match stack.resolve(reference) {
        Some(Declaration::Vpc(vpc)) => Some(vpc),
        _ => None,
    }
}

/// Construct id of the VPC a VPC-scoped declaration lives in.
fn vpc_id_of<'a>(stack: &'a Stack, reference: &'a Reference) -> Option<&'a str> {
    let vpc_ref = match stack.resolve(reference)? {
        Declaration::Vpc(_) => return Some(reference.address().id()),
        Declaration::Subnet(s) => &s.vpc_id,
        Declaration::RouteTable(rt) => &rt.vpc_id,
        Declaration::SecurityGroup(sg) => &sg.vpc_id,
        Declaration::InternetGateway(igw) => &igw.vpc_id,
        Declaration::Instance(_) | Declaration::RouteTableAssociation(_) => return None,
    };
    Some(vpc_ref.address().id())
}
