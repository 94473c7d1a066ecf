//! Integration tests for the Stackform configuration system
//!
//! These tests verify:
//! - Loading configuration from TOML, YAML, and JSON files
//! - Default values for every section
//! - Environment variable overrides
//! - Error handling for missing and malformed files

use pretty_assertions::assert_eq;
use serial_test::serial;
use stackform::config::{Config, LogFormat};
use stackform::Error;
use std::path::PathBuf;
use tempfile::tempdir;

const ENV_VARS: &[&str] = &[
    "STACKFORM_REGION",
    "STACKFORM_ALLOWED_CIDR",
    "STACKFORM_INSTANCE_TYPE",
    "STACKFORM_KEY_NAME",
    "STACKFORM_OUTDIR",
    "STACKFORM_LOG_LEVEL",
    "NO_COLOR",
];

fn clear_env() {
    for var in ENV_VARS {
        std::env::remove_var(var);
    }
}

// ============================================================================
// File Formats
// ============================================================================

#[test]
#[serial]
fn test_load_toml() {
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("stackform.toml");
    std::fs::write(
        &path,
        r#"
[stack]
name = "lab"
region = "us-east-1"
availability_zone = "us-east-1a"
allowed_cidr = "203.0.113.9/32"

[provider]
version = "~> 5.40"

[synth]
outdir = "out"
pretty = false

[logging]
level = "info"
format = "json"
"#,
    )
    .unwrap();

    let config = Config::load(Some(&path)).unwrap();
    assert_eq!(config.stack.name, "lab");
    assert_eq!(config.stack.settings.region, "us-east-1");
    assert_eq!(config.stack.settings.allowed_cidr.to_string(), "203.0.113.9/32");
    assert_eq!(config.stack.settings.ami, "ami-0801628222e2e96d6");
    assert_eq!(config.provider.source, "hashicorp/aws");
    assert_eq!(config.provider.version, "~> 5.40");
    assert_eq!(config.synth.outdir, PathBuf::from("out"));
    assert!(!config.synth.pretty);
    assert_eq!(config.logging.format, LogFormat::Json);
}

#[test]
#[serial]
fn test_load_yaml() {
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("stackform.yml");
    std::fs::write(
        &path,
        r#"
stack:
  key_name: YamlKey
  ingress_port: 2222
colors:
  enabled: false
"#,
    )
    .unwrap();

    let config = Config::load(Some(&path)).unwrap();
    assert_eq!(config.stack.settings.key_name, "YamlKey");
    assert_eq!(config.stack.settings.ingress_port, 2222);
    assert!(!config.colors.enabled);
}

#[test]
#[serial]
fn test_load_json() {
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("stackform.json");
    std::fs::write(
        &path,
        r#"{ "stack": { "instance_type": "t3.micro" }, "synth": { "outdir": "build" } }"#,
    )
    .unwrap();

    let config = Config::from_file(&path).unwrap();
    assert_eq!(config.stack.settings.instance_type, "t3.micro");
    assert_eq!(config.synth.outdir, PathBuf::from("build"));
    assert_eq!(config.stack.name, "AWS-Experiment3");
}

#[test]
#[serial]
fn test_unknown_extension_falls_back_to_yaml() {
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("stackform.cfg");
    std::fs::write(&path, "stack:\n  name: from-cfg\n").unwrap();

    let config = Config::load(Some(&path)).unwrap();
    assert_eq!(config.stack.name, "from-cfg");
}

// ============================================================================
// Layering
// ============================================================================

/// Run `f` with HOME pointing at `home`, restoring it afterwards.
fn with_home<T>(home: &std::path::Path, f: impl FnOnce() -> T) -> T {
    let saved = std::env::var_os("HOME");
    std::env::set_var("HOME", home);
    let result = f();
    match saved {
        Some(value) => std::env::set_var("HOME", value),
        None => std::env::remove_var("HOME"),
    }
    result
}

#[test]
#[serial]
fn test_user_layer_survives_explicit_file() {
    clear_env();
    let home = tempdir().unwrap();
    let user_dir = home.path().join(".stackform");
    std::fs::create_dir_all(&user_dir).unwrap();
    std::fs::write(
        user_dir.join("config.toml"),
        "[synth]\npretty = false\n\n[colors]\nenabled = false\n\n[stack]\nkey_name = \"UserKey\"\n",
    )
    .unwrap();

    let project = tempdir().unwrap();
    let explicit = project.path().join("explicit.toml");
    std::fs::write(&explicit, "[stack]\nname = \"layered\"\n").unwrap();

    let config = with_home(home.path(), || Config::load(Some(&explicit))).unwrap();
    assert_eq!(config.stack.name, "layered");
    assert_eq!(config.stack.settings.key_name, "UserKey");
    assert!(!config.synth.pretty);
    assert!(!config.colors.enabled);
}

#[test]
#[serial]
fn test_higher_layer_restores_default_value() {
    clear_env();
    let home = tempdir().unwrap();
    let user_dir = home.path().join(".stackform");
    std::fs::create_dir_all(&user_dir).unwrap();
    std::fs::write(
        user_dir.join("config.toml"),
        "[synth]\npretty = false\n\n[stack]\ninstance_type = \"t3.micro\"\n",
    )
    .unwrap();

    let project = tempdir().unwrap();
    let explicit = project.path().join("explicit.yml");
    std::fs::write(
        &explicit,
        "synth:\n  pretty: true\nstack:\n  instance_type: t2.nano\n",
    )
    .unwrap();

    let config = with_home(home.path(), || Config::load(Some(&explicit))).unwrap();
    assert!(config.synth.pretty);
    assert_eq!(config.stack.settings.instance_type, "t2.nano");
}

// ============================================================================
// Errors
// ============================================================================

#[test]
#[serial]
fn test_missing_explicit_file() {
    clear_env();
    let path = PathBuf::from("/nonexistent/stackform.toml");
    let err = Config::load(Some(&path)).unwrap_err();
    assert!(matches!(err, Error::FileNotFound(_)));
}

#[test]
#[serial]
fn test_invalid_cidr_in_file() {
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "[stack]\nvpc_cidr = \"10.0.0.1/16\"\n").unwrap();

    let err = Config::load(Some(&path)).unwrap_err();
    assert!(matches!(err, Error::TomlParse(_)));
    assert_eq!(err.exit_code(), 5);
}

// ============================================================================
// Environment Overrides
// ============================================================================

#[test]
#[serial]
fn test_env_overrides_file() {
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("stackform.toml");
    std::fs::write(&path, "[stack]\nkey_name = \"FileKey\"\n").unwrap();

    std::env::set_var("STACKFORM_KEY_NAME", "EnvKey");
    std::env::set_var("STACKFORM_REGION", "us-west-2");
    std::env::set_var("STACKFORM_INSTANCE_TYPE", "t3.small");
    std::env::set_var("STACKFORM_OUTDIR", "env-out");
    std::env::set_var("STACKFORM_LOG_LEVEL", "debug");
    std::env::set_var("NO_COLOR", "1");
    let config = Config::load(Some(&path));
    clear_env();

    let config = config.unwrap();
    assert_eq!(config.stack.settings.key_name, "EnvKey");
    assert_eq!(config.stack.settings.region, "us-west-2");
    assert_eq!(config.stack.settings.instance_type, "t3.small");
    assert_eq!(config.synth.outdir, PathBuf::from("env-out"));
    assert_eq!(config.logging.level, "debug");
    assert!(!config.colors.enabled);
}

#[test]
#[serial]
fn test_env_bad_cidr_is_config_error() {
    clear_env();
    std::env::set_var("STACKFORM_ALLOWED_CIDR", "not-a-cidr");
    let result = Config::load(None);
    clear_env();

    let err = result.unwrap_err();
    assert!(matches!(err, Error::InvalidConfig { .. }));
    assert_eq!(err.exit_code(), 5);
}
