//! # Stackform - Typed Infrastructure Stacks for Terraform
//!
//! Stackform declares cloud infrastructure as a typed resource graph and
//! synthesizes it into the JSON configuration Terraform consumes. Nothing here
//! talks to a cloud API: provisioning, planning and state stay with the
//! external engine.
//!
//! ## Core Concepts
//!
//! - **Stack**: a named, ordered set of declarations plus one provider
//! - **Declarations**: typed resource records (VPC, subnet, instance, ...)
//! - **References**: lazy `${type.id.attribute}` tokens linking declarations
//! - **Outputs**: named values exported from a stack
//! - **Checks**: structural rules run before synthesis
//! - **Synthesis**: rendering a stack to `cdk.tf.json` plus a manifest
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                           CLI Interface                              │
//! │                    (clap-based command parsing)                      │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                    │
//!                                    ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                Blueprint (settings -> declarations)                  │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                    │
//!          ┌─────────────────────────┼─────────────────────────┐
//!          ▼                         ▼                         ▼
//! ┌─────────────────┐   ┌─────────────────────┐   ┌─────────────────────┐
//! │      Stack      │   │     Declaration     │   │       Checks        │
//! │  (declarations  │   │       Graph         │   │  (region, ranges,   │
//! │   + outputs)    │   │     (petgraph)      │   │   routing, ingress) │
//! └─────────────────┘   └─────────────────────┘   └─────────────────────┘
//!          │                         │                         │
//!          └─────────────────────────┼─────────────────────────┘
//!                                    ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                  Synthesis (cdk.tf.json + manifest)                  │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Example
//!
//! ```rust,no_run
//! use stackform::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let stack = build_stack("AWS-Experiment3", &StackSettings::default())?;
//!
//!     let mut app = App::new("cdktf.out");
//!     app.add_stack(stack)?;
//!     let manifest = app.synth().await?;
//!
//!     println!("synthesized {} stack(s)", manifest.stacks.len());
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]

// Re-export commonly used items in prelude
pub mod prelude {
    //! Convenient re-exports of commonly used types.
    //!
    //! # Example
    //!
    //! ```rust
    //! use stackform::prelude::*;
    //!
    //! let mut stack = Stack::new("demo");
    //! stack.set_provider(AwsProvider::new("ca-central-1")).unwrap();
    //! let vpc = stack
    //!     .declare("main", Vpc::new("10.0.0.0/16".parse().unwrap()))
    //!     .unwrap();
    //! assert_eq!(vpc.id().token(), "${aws_vpc.main.id}");
    //! ```

    // Error handling
    pub use crate::error::{Error, ErrorContext, Result};

    // Addressing
    pub use crate::network::Ipv4Cidr;
    pub use crate::reference::{Reference, ResourceAddress};

    // Resource declarations
    pub use crate::resources::{
        AwsProvider, Declaration, Instance, InternetGateway, Protocol, ResourceKind, Route,
        RouteTable, RouteTableAssociation, SecurityGroup, SecurityRule, Subnet, Tags, Vpc,
    };

    // Stacks
    pub use crate::stack::{ResourceHandle, Stack, TerraformOutput};

    // Checks
    pub use crate::checks::{CheckReport, Finding, Severity};

    // Synthesis
    pub use crate::synth::{App, Manifest, ProviderRequirement, TerraformDocument};

    // The topology
    pub use crate::blueprint::{build_stack, StackSettings};

    // Configuration
    pub use crate::config::Config;
}

// ============================================================================
// Core Modules
// ============================================================================

/// Error types and result aliases.
///
/// Every fallible operation returns [`Result`](error::Result). Each error
/// variant maps to a process exit code through
/// [`Error::exit_code`](error::Error::exit_code).
pub mod error;

pub use error::{Error, Result};

/// IPv4 CIDR blocks.
pub mod network;

/// Construct ids, resource addresses and cross-resource references.
pub mod reference;

// ============================================================================
// Declarations
// ============================================================================

/// Typed resource declarations and the AWS provider.
///
/// Each declaration validates its own fields; references to other
/// declarations are validated when the declaration joins a [`stack::Stack`].
pub mod resources;

/// Stacks, outputs and the declaration dependency graph.
pub mod stack;

/// Structural checks over a complete stack.
pub mod checks;

// ============================================================================
// Synthesis
// ============================================================================

/// Rendering stacks to Terraform JSON and writing the output directory.
pub mod synth;

/// The single public-subnet instance topology and its settings.
pub mod blueprint;

// ============================================================================
// Configuration
// ============================================================================

/// Configuration loading from files and the environment.
///
/// Sources are layered: built-in defaults, then the user config file, then
/// project files, then an explicit path, then `STACKFORM_*` variables.
pub mod config;

// ============================================================================
// Version Information
// ============================================================================

/// Returns the current version of Stackform.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Returns detailed version information including build metadata.
pub fn version_info() -> VersionInfo {
    VersionInfo {
        version: env!("CARGO_PKG_VERSION"),
        rust_version: option_env!("CARGO_PKG_RUST_VERSION").unwrap_or("unknown"),
        target: std::env::consts::ARCH,
        profile: if cfg!(debug_assertions) {
            "debug"
        } else {
            "release"
        },
    }
}

/// Detailed version information for the Stackform build.
#[derive(Debug, Clone)]
pub struct VersionInfo {
    /// Semantic version string
    pub version: &'static str,
    /// Minimum Rust version required
    pub rust_version: &'static str,
    /// Target architecture
    pub target: &'static str,
    /// Build profile (debug or release)
    pub profile: &'static str,
}

impl std::fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "stackform {} ({}, {})",
            self.version, self.target, self.profile
        )
    }
}
