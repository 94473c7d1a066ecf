//! Configuration module for Stackform
//!
//! Handles loading and merging configuration from multiple sources:
//! - Default values (the literals of the original topology)
//! - User configuration (~/.stackform/config.toml)
//! - Project configuration (./stackform.toml, ./.stackform.toml)
//! - An explicit path (`--config` or `STACKFORM_CONFIG`)
//! - Environment variables
//!
//! Command-line flags are applied on top by the binary.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::blueprint::{StackSettings, DEFAULT_STACK_NAME};
use crate::error::{Error, Result};
use crate::synth::ProviderRequirement;

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Stack name and topology settings
    pub stack: StackConfig,

    /// Provider requirement written to `terraform.required_providers`
    pub provider: ProviderRequirement,

    /// Synthesis settings
    pub synth: SynthConfig,

    /// Logging settings
    pub logging: LoggingConfig,

    /// Colors and output settings
    pub colors: ColorsConfig,
}

/// Stack settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StackConfig {
    /// Stack name
    pub name: String,

    /// Topology literals
    #[serde(flatten)]
    pub settings: StackSettings,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_STACK_NAME.to_string(),
            settings: StackSettings::default(),
        }
    }
}

/// Synthesis settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthConfig {
    /// Output directory
    pub outdir: PathBuf,

    /// Pretty-print the JSON documents
    pub pretty: bool,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            outdir: PathBuf::from("cdktf.out"),
            pretty: true,
        }
    }
}

/// Log line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level used when no `-v` flag or `RUST_LOG` is given
    pub level: String,

    /// Log format
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Text,
        }
    }
}

/// Color settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorsConfig {
    /// Enable colors
    pub enabled: bool,
}

impl Default for ColorsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Config {
    /// Load configuration from all sources
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        let mut config = Config::default();

        for path in Self::get_config_paths(config_path) {
            if path.exists() {
                config = config.merge_from_file(&path)?;
            } else if config_path == Some(&path) {
                return Err(Error::FileNotFound(path));
            }
        }

        config.apply_env_overrides()?;

        Ok(config)
    }

    /// Load from a specific file, without the environment
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Config::default().merge_from_file(path.as_ref())
    }

    /// Get the list of configuration file paths to check, lowest priority first
    fn get_config_paths(explicit_path: Option<&PathBuf>) -> Vec<PathBuf> {
        let mut paths = Vec::new();

        // User config
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".stackform").join("config.toml"));
        }

        // Project config (current directory)
        paths.push(PathBuf::from("stackform.toml"));
        paths.push(PathBuf::from(".stackform.toml"));

        // Explicit path takes priority
        if let Some(path) = explicit_path {
            paths.push(path.clone());
        }

        paths
    }

    /// Merge configuration from a file
    fn merge_from_file(&self, path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound(path.to_path_buf())
            } else {
                Error::Io(e)
            }
        })?;

        // Determine format based on extension
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        // The typed parse validates the file; the raw tree records which keys it sets.
        parse_layer::<Config>(&content, extension)?;
        let layer: Value = parse_layer(&content, extension)?;

        self.merge(layer)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Overlay the keys present in `layer` onto this config
    fn merge(&self, layer: Value) -> Result<Config> {
        let mut tree = serde_json::to_value(self)?;
        overlay(&mut tree, layer);
        Ok(serde_json::from_value(tree)?)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        // STACKFORM_REGION
        if let Ok(region) = std::env::var("STACKFORM_REGION") {
            self.stack.settings.region = region;
        }

        // STACKFORM_ALLOWED_CIDR
        if let Ok(cidr) = std::env::var("STACKFORM_ALLOWED_CIDR") {
            self.stack.settings.allowed_cidr = cidr.parse().map_err(|e: Error| Error::InvalidConfig {
                key: "STACKFORM_ALLOWED_CIDR".to_string(),
                message: e.to_string(),
            })?;
        }

        // STACKFORM_INSTANCE_TYPE
        if let Ok(instance_type) = std::env::var("STACKFORM_INSTANCE_TYPE") {
            self.stack.settings.instance_type = instance_type;
        }

        // STACKFORM_KEY_NAME
        if let Ok(key_name) = std::env::var("STACKFORM_KEY_NAME") {
            self.stack.settings.key_name = key_name;
        }

        // STACKFORM_OUTDIR
        if let Ok(outdir) = std::env::var("STACKFORM_OUTDIR") {
            self.synth.outdir = PathBuf::from(outdir);
        }

        // STACKFORM_LOG_LEVEL
        if let Ok(level) = std::env::var("STACKFORM_LOG_LEVEL") {
            self.logging.level = level;
        }

        // NO_COLOR
        if std::env::var("NO_COLOR").is_ok() {
            self.colors.enabled = false;
        }

        Ok(())
    }
}

fn parse_layer<T: DeserializeOwned>(content: &str, extension: &str) -> Result<T> {
    let parsed = match extension {
        "yml" | "yaml" => serde_yaml::from_str(content)?,
        "json" => serde_json::from_str(content)?,
        "toml" => toml::from_str(content)?,
        // Try TOML first (for .cfg files), then YAML
        _ => toml::from_str(content).or_else(|toml_err| {
            serde_yaml::from_str(content).map_err(|_| Error::TomlParse(toml_err))
        })?,
    };
    Ok(parsed)
}

/// Recursively copy the keys of `layer` into `base`. Tables merge key by
/// key; any other value replaces what was there. Empty entries are skipped.
fn overlay(base: &mut Value, layer: Value) {
    match (base, layer) {
        (_, Value::Null) => {}
        (Value::Object(base), Value::Object(layer)) => {
            for (key, value) in layer {
                match base.get_mut(&key) {
                    Some(slot) => overlay(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serial_test::serial;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.stack.name, "AWS-Experiment3");
        assert_eq!(config.stack.settings.region, "ca-central-1");
        assert_eq!(config.synth.outdir, PathBuf::from("cdktf.out"));
        assert!(config.synth.pretty);
        assert_eq!(config.logging.format, LogFormat::Text);
        assert!(config.colors.enabled);
    }

    #[test]
    fn test_config_merge_keeps_unset_keys() {
        let mut base = Config::default();
        base.stack.name = "base".to_string();
        base.synth.pretty = false;
        base.colors.enabled = false;

        let merged = base
            .merge(serde_json::json!({ "stack": { "key_name": "OtherKey" } }))
            .unwrap();
        assert_eq!(merged.stack.name, "base");
        assert_eq!(merged.stack.settings.key_name, "OtherKey");
        assert_eq!(merged.stack.settings.ami, "ami-0801628222e2e96d6");
        assert!(!merged.synth.pretty);
        assert!(!merged.colors.enabled);
    }

    #[test]
    fn test_config_merge_can_restore_defaults() {
        let mut base = Config::default();
        base.stack.settings.instance_type = "t3.micro".to_string();
        base.synth.pretty = false;

        let merged = base
            .merge(serde_json::json!({
                "stack": { "instance_type": "t2.nano" },
                "synth": { "pretty": true }
            }))
            .unwrap();
        assert_eq!(merged.stack.settings.instance_type, "t2.nano");
        assert!(merged.synth.pretty);
    }

    #[test]
    fn test_overlay_skips_empty_entries() {
        let mut tree = serde_json::json!({ "synth": { "outdir": "out", "pretty": false } });
        overlay(
            &mut tree,
            serde_json::json!({ "synth": null, "extra": { "a": 1 } }),
        );
        assert_eq!(tree["synth"]["outdir"], "out");
        assert_eq!(tree["extra"]["a"], 1);
    }

    #[test]
    fn test_flattened_stack_section() {
        let config: Config = toml::from_str(
            r#"
            [stack]
            name = "lab"
            region = "us-west-2"
            availability_zone = "us-west-2a"
            "#,
        )
        .unwrap();
        assert_eq!(config.stack.name, "lab");
        assert_eq!(config.stack.settings.region, "us-west-2");
        assert_eq!(config.stack.settings.instance_type, "t2.nano");
    }

    #[test]
    #[serial]
    fn test_env_override() {
        std::env::set_var("STACKFORM_KEY_NAME", "EnvKey");
        std::env::set_var("STACKFORM_ALLOWED_CIDR", "198.51.100.0/24");
        let mut config = Config::default();
        config.apply_env_overrides().unwrap();
        std::env::remove_var("STACKFORM_KEY_NAME");
        std::env::remove_var("STACKFORM_ALLOWED_CIDR");

        assert_eq!(config.stack.settings.key_name, "EnvKey");
        assert_eq!(config.stack.settings.allowed_cidr.to_string(), "198.51.100.0/24");
    }

    #[test]
    #[serial]
    fn test_env_override_rejects_bad_cidr() {
        std::env::set_var("STACKFORM_ALLOWED_CIDR", "206.248.172.36");
        let mut config = Config::default();
        let result = config.apply_env_overrides();
        std::env::remove_var("STACKFORM_ALLOWED_CIDR");

        assert!(matches!(result, Err(Error::InvalidConfig { .. })));
    }
}
