//! The AWS provider block.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::error::{Error, Result};

static REGION_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z]{2}(-gov|-iso[a-z]*)?-[a-z]+-\d+$").expect("Invalid region regex"));

/// Provider configuration for `registry.terraform.io/hashicorp/aws`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AwsProvider {
    /// AWS region every resource of the stack lives in
    pub region: String,
    /// Provider alias
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Named profile from the shared credentials file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
}

impl AwsProvider {
    /// Create a provider for `region`.
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            alias: None,
            profile: None,
        }
    }

    /// Set the alias.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Set the named profile.
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    /// Validate the region name.
    pub fn validate(&self) -> Result<()> {
        if REGION_REGEX.is_match(&self.region) {
            Ok(())
        } else {
            Err(Error::invalid_value(
                "provider.aws",
                "region",
                format!("'{}' is not an AWS region name", self.region),
            ))
        }
    }
}
