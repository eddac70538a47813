use std::env;
use std::time::Duration;

use clap::Parser;
use serial_test::serial;
use swift_upload::cli::Cli;
use swift_upload::config::FailurePolicy;
use swift_upload::load_config::load_config;

const PLUGIN_VARS: &[&str] = &[
    "PLUGIN_ENDPOINT",
    "PLUGIN_ACCESS_KEY",
    "PLUGIN_SECRET_KEY",
    "PLUGIN_CONTAINER",
    "PLUGIN_AUTH_VERSION",
    "PLUGIN_REGION",
    "PLUGIN_TENANT",
    "PLUGIN_TIMEOUT",
    "PLUGIN_SOURCE",
    "PLUGIN_EXCLUDE",
    "PLUGIN_TARGET",
    "PLUGIN_STRIP_PREFIX",
    "PLUGIN_RECURSIVE",
    "PLUGIN_DRY_RUN",
    "PLUGIN_CONTINUE_ON_ERROR",
    "PLUGIN_ALLOW_EMPTY",
];

fn clear_plugin_env() {
    for var in PLUGIN_VARS {
        env::remove_var(var);
    }
}

fn base_args() -> Vec<&'static str> {
    vec![
        "swift-upload",
        "--endpoint",
        "https://auth.example.com/v1.0",
        "--access-key",
        "ci",
        "--secret-key",
        "secret",
        "--container",
        "artifacts",
        "--source",
        "dist/*.tar.gz",
    ]
}

#[test]
#[serial]
fn flags_build_a_strict_v1_request_by_default() {
    clear_plugin_env();
    let cli = Cli::try_parse_from(base_args()).expect("flags should parse");
    let request = load_config(cli);

    assert_eq!(request.connection.auth_version, 1);
    assert_eq!(request.connection.region, None);
    assert_eq!(request.connection.tenant, None);
    assert_eq!(request.connection.timeout, None);
    assert_eq!(request.container, "artifacts");
    assert_eq!(request.source, "dist/*.tar.gz");
    assert!(request.exclude.is_empty());
    assert_eq!(request.target, "");
    assert!(!request.dry_run);
    assert_eq!(request.on_error, FailurePolicy::Abort);
    assert!(!request.allow_empty);
}

#[test]
#[serial]
fn plugin_environment_variables_are_read() {
    clear_plugin_env();
    env::set_var("PLUGIN_ENDPOINT", "https://keystone.example.com/v3");
    env::set_var("PLUGIN_ACCESS_KEY", "ci");
    env::set_var("PLUGIN_SECRET_KEY", "secret");
    env::set_var("PLUGIN_CONTAINER", "artifacts");
    env::set_var("PLUGIN_AUTH_VERSION", "3");
    env::set_var("PLUGIN_REGION", "RegionOne");
    env::set_var("PLUGIN_TENANT", "builds");
    env::set_var("PLUGIN_TIMEOUT", "45s");
    env::set_var("PLUGIN_SOURCE", "out/**");
    env::set_var("PLUGIN_EXCLUDE", "out/*.map,out/tmp/**");
    env::set_var("PLUGIN_TARGET", "/nightly");
    env::set_var("PLUGIN_STRIP_PREFIX", "out/");
    env::set_var("PLUGIN_DRY_RUN", "true");
    env::set_var("PLUGIN_CONTINUE_ON_ERROR", "true");

    let cli = Cli::try_parse_from(["swift-upload"]).expect("env should satisfy required flags");
    let request = load_config(cli);
    clear_plugin_env();

    assert_eq!(request.connection.endpoint, "https://keystone.example.com/v3");
    assert_eq!(request.connection.auth_version, 3);
    assert_eq!(request.connection.region.as_deref(), Some("RegionOne"));
    assert_eq!(request.connection.tenant.as_deref(), Some("builds"));
    assert_eq!(request.connection.timeout, Some(Duration::from_secs(45)));
    assert_eq!(request.exclude, vec!["out/*.map".to_string(), "out/tmp/**".to_string()]);
    assert_eq!(request.target, "nightly");
    assert_eq!(request.strip_prefix, "out/");
    assert!(request.dry_run);
    assert_eq!(request.on_error, FailurePolicy::Continue);
}

#[test]
#[serial]
fn region_and_tenant_are_dropped_for_v1() {
    clear_plugin_env();
    let mut args = base_args();
    args.extend(["--region", "RegionOne", "--tenant", "builds"]);

    let request = load_config(Cli::try_parse_from(args).unwrap());
    assert_eq!(request.connection.region, None);
    assert_eq!(request.connection.tenant, None);
}

#[test]
#[serial]
fn scoped_versions_always_forward_region_and_tenant() {
    clear_plugin_env();
    let mut args = base_args();
    args.extend(["--auth-version", "2"]);

    let request = load_config(Cli::try_parse_from(args).unwrap());
    assert_eq!(request.connection.region.as_deref(), Some(""));
    assert_eq!(request.connection.tenant.as_deref(), Some(""));
}

#[test]
#[serial]
fn malformed_timeout_falls_back_to_none() {
    clear_plugin_env();
    let mut args = base_args();
    args.extend(["--timeout", "eventually"]);

    let request = load_config(Cli::try_parse_from(args).unwrap());
    assert_eq!(request.connection.timeout, None);
}

#[test]
#[serial]
fn repeated_exclude_flags_accumulate() {
    clear_plugin_env();
    let mut args = base_args();
    args.extend(["--exclude", "a/*", "--exclude", "b/*,c/*", "--allow-empty", "--recursive"]);

    let request = load_config(Cli::try_parse_from(args).unwrap());
    assert_eq!(request.exclude, vec!["a/*", "b/*", "c/*"]);
    assert!(request.allow_empty);
}

#[test]
#[serial]
fn missing_required_settings_are_rejected() {
    clear_plugin_env();
    let err = Cli::try_parse_from(["swift-upload", "--endpoint", "https://auth.example.com"])
        .unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("--container") || msg.contains("--access-key"), "got: {msg}");
}
