//! Error types for Stackform.
//!
//! This module defines the error types used throughout Stackform, providing
//! rich error information for declaration problems, synthesis failures and
//! configuration issues.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Stackform operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for Stackform.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Declaration Errors
    // ========================================================================
    /// Construct id is not a valid Terraform block label.
    #[error("Invalid construct id '{0}': must start with a letter or underscore and contain only letters, digits, '_' or '-'")]
    InvalidId(String),

    /// Stack name is unusable as a directory and state file name.
    #[error("Invalid stack name '{0}': must start with a letter or underscore and contain only letters, digits, '_' or '-'")]
    InvalidStackName(String),

    /// A construct with this id was already declared in the stack.
    #[error("Construct '{id}' is already declared in stack '{stack}'")]
    DuplicateId {
        /// Stack name
        stack: String,
        /// Construct id
        id: String,
    },

    /// An output with this name was already declared in the stack.
    #[error("Output '{0}' is already declared")]
    DuplicateOutput(String),

    /// Invalid literal value on a declaration.
    #[error("Invalid value for '{field}' on '{resource}': {message}")]
    InvalidValue {
        /// Resource address or id
        resource: String,
        /// Field name
        field: String,
        /// Error message
        message: String,
    },

    // ========================================================================
    // Reference Errors
    // ========================================================================
    /// Reference to a construct that has not been declared (yet).
    #[error("'{from}' references '{target}', which is not declared earlier in the stack")]
    UnresolvedReference {
        /// Declaring construct or output
        from: String,
        /// Referenced address
        target: String,
    },

    /// Reference to an address whose type does not match the declared resource.
    #[error("'{from}' references '{target}', but '{id}' is declared as '{actual}'")]
    ReferenceTypeMismatch {
        /// Declaring construct or output
        from: String,
        /// Referenced address
        target: String,
        /// Referenced construct id
        id: String,
        /// Actual resource type of the construct
        actual: String,
    },

    /// Reference to an attribute the resource type does not export.
    #[error("Resource type '{resource_type}' does not export attribute '{attribute}'")]
    UnknownAttribute {
        /// Resource type
        resource_type: String,
        /// Attribute name
        attribute: String,
    },

    /// Dependency cycle in the declaration graph.
    #[error("Dependency cycle detected involving '{0}'")]
    DependencyCycle(String),

    // ========================================================================
    // Network Errors
    // ========================================================================
    /// Malformed CIDR block.
    #[error("Invalid CIDR block '{value}': {message}")]
    InvalidCidr {
        /// Raw value
        value: String,
        /// Error message
        message: String,
    },

    // ========================================================================
    // Check and Synthesis Errors
    // ========================================================================
    /// Declaration-shape checks reported errors.
    #[error("Stack '{stack}' failed {count} check(s)")]
    ChecksFailed {
        /// Stack name
        stack: String,
        /// Number of failing checks
        count: usize,
    },

    /// Synthesis failed.
    #[error("Failed to synthesize stack '{stack}': {message}")]
    Synth {
        /// Stack name
        stack: String,
        /// Error message
        message: String,
    },

    /// Stack not found in the app.
    #[error("Stack '{0}' not found")]
    StackNotFound(String),

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid configuration value.
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidConfig {
        /// Configuration key
        key: String,
        /// Error message
        message: String,
    },

    // ========================================================================
    // IO Errors
    // ========================================================================
    /// File not found.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ========================================================================
    // Serialization Errors
    // ========================================================================
    /// YAML parsing error.
    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    // ========================================================================
    // Other Errors
    // ========================================================================
    /// Generic error with source.
    #[error("{message}")]
    Other {
        /// Error message
        message: String,
        /// Source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl Error {
    /// Creates a new invalid value error.
    pub fn invalid_value(
        resource: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            resource: resource.into(),
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a new invalid CIDR error.
    pub fn invalid_cidr(value: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidCidr {
            value: value.into(),
            message: message.into(),
        }
    }

    /// Creates a new unresolved reference error.
    pub fn unresolved_reference(from: impl Into<String>, target: impl Into<String>) -> Self {
        Self::UnresolvedReference {
            from: from.into(),
            target: target.into(),
        }
    }

    /// Creates a new synthesis error.
    pub fn synth(stack: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Synth {
            stack: stack.into(),
            message: message.into(),
        }
    }

    /// Returns true if the error comes from the declaration itself rather
    /// than from the environment (files, config, serialization).
    pub fn is_declaration_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidId(_)
                | Error::InvalidStackName(_)
                | Error::DuplicateId { .. }
                | Error::DuplicateOutput(_)
                | Error::InvalidValue { .. }
                | Error::UnresolvedReference { .. }
                | Error::ReferenceTypeMismatch { .. }
                | Error::UnknownAttribute { .. }
                | Error::DependencyCycle(_)
                | Error::InvalidCidr { .. }
        )
    }

    /// Returns the error code for CLI exit status.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::ChecksFailed { .. } => 4,
            Error::Config(_)
            | Error::InvalidConfig { .. }
            | Error::YamlParse(_)
            | Error::TomlParse(_) => 5,
            Error::Synth { .. } | Error::Io(_) | Error::FileNotFound(_) => 6,
            e if e.is_declaration_error() => 3,
            _ => 1,
        }
    }
}

/// Extension trait for adding context to errors.
pub trait ErrorContext<T> {
    /// Adds context to an error.
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Adds context with a closure that is only evaluated on error.
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Other {
            message: message.into(),
            source: Some(Box::new(e)),
        })
    }

    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| Error::Other {
            message: f().into(),
            source: Some(Box::new(e)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(Error::InvalidId("9bad".into()).exit_code(), 3);
        assert_eq!(Error::InvalidStackName("../x".into()).exit_code(), 3);
        assert_eq!(
            Error::ChecksFailed {
                stack: "s".into(),
                count: 2
            }
            .exit_code(),
            4
        );
        assert_eq!(Error::Config("broken".into()).exit_code(), 5);
        assert_eq!(Error::synth("s", "boom").exit_code(), 6);
        assert_eq!(Error::StackNotFound("x".into()).exit_code(), 1);
    }

    #[test]
    fn test_unresolved_reference_message() {
        let err = Error::unresolved_reference("cdktf-ig", "aws_vpc.cdktf-vpc");
        assert_eq!(
            err.to_string(),
            "'cdktf-ig' references 'aws_vpc.cdktf-vpc', which is not declared earlier in the stack"
        );
    }

    #[test]
    fn test_context_wraps_source() {
        let io: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "missing",
        ));
        let err = io.context("reading manifest").unwrap_err();
        assert_eq!(err.to_string(), "reading manifest");
        assert!(std::error::Error::source(&err).is_some());
    }
}
