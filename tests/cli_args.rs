//! Integration tests for CLI argument handling
//!
//! Runs the regcache binary with persistence disabled so no test touches
//! the user's cache directory or the network.

use std::process::Command;

/// Helper to run the CLI with given args and capture output
fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_regcache"))
        .args(args)
        .env_remove("REGCACHE_BASE_URL")
        .env_remove("REGCACHE_TTL_HOURS")
        .env_remove("REGCACHE_CACHE_DIR")
        .output()
        .expect("Failed to execute regcache")
}

#[test]
fn test_help_flag_exits_successfully() {
    let output = run_cli(&["--help"]);
    assert!(
        output.status.success(),
        "Expected --help to exit successfully"
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("regcache"), "Help should mention regcache");
    assert!(stdout.contains("lookup"), "Help should mention the lookup command");
}

#[test]
fn test_lookup_test_identifier_prints_mock_company() {
    let output = run_cli(&["lookup", "556655", "--no-persist"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("Test Company Alpha Ltd"),
        "Should print the mock company: {}",
        stdout
    );
    assert!(stdout.contains("(mock)"));
}

#[test]
fn test_lookup_skips_malformed_registry_number() {
    let output = run_cli(&["lookup", "1234567", "--no-persist"]);
    assert!(output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Skipping '1234567'"),
        "Should report the skipped number: {}",
        stderr
    );
    assert!(String::from_utf8_lossy(&output.stdout).trim().is_empty());
}

#[test]
fn test_invalid_ttl_prints_error_and_exits() {
    let output = run_cli(&["stats", "--ttl-hours", "soon"]);
    assert!(!output.status.success(), "Expected invalid TTL to fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Invalid TTL") || stderr.contains("invalid"),
        "Should print error message about the TTL: {}",
        stderr
    );
}

#[test]
fn test_stats_with_empty_cache_dir() {
    let temp_dir = tempfile::TempDir::new().expect("Failed to create temp directory");
    let dir = temp_dir.path().to_string_lossy().to_string();

    let output = run_cli(&["stats", "--cache-dir", &dir]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("entries: 0"), "Unexpected stats: {}", stdout);
}

#[test]
fn test_lookup_persists_into_cache_dir() {
    let temp_dir = tempfile::TempDir::new().expect("Failed to create temp directory");
    let dir = temp_dir.path().to_string_lossy().to_string();

    let lookup = run_cli(&["lookup", "989898", "--cache-dir", &dir]);
    assert!(lookup.status.success());

    let stats = run_cli(&["stats", "--cache-dir", &dir]);
    let stdout = String::from_utf8_lossy(&stats.stdout);
    assert!(stdout.contains("entries: 1"), "Unexpected stats: {}", stdout);
}

#[cfg(test)]
mod unit_tests {
    //! Unit tests for CLI parsing that don't require running the binary

    use clap::Parser;
    use regcache::cli::{Cli, Command};
    use regcache::CacheConfig;

    #[test]
    fn test_cli_lookup_collects_all_numbers() {
        let cli = Cli::parse_from(["regcache", "lookup", "556655", "12345678"]);
        assert_eq!(
            cli.command,
            Command::Lookup {
                registry_numbers: vec!["556655".to_string(), "12345678".to_string()]
            }
        );
    }

    #[test]
    fn test_cli_clear_command() {
        let cli = Cli::parse_from(["regcache", "clear"]);
        assert_eq!(cli.command, Command::Clear);
    }

    #[test]
    fn test_cli_requires_command() {
        assert!(Cli::try_parse_from(["regcache"]).is_err());
    }

    #[test]
    fn test_resolve_config_base_url_flag() {
        let cli = Cli::parse_from(["regcache", "--base-url", "http://registry.test", "stats"]);
        let config = cli.resolve_config(CacheConfig::default()).unwrap();
        assert_eq!(config.base_url, "http://registry.test");
    }
}
