//! Command-line interface parsing for the regcache binary
//!
//! This module handles parsing of CLI arguments using clap, merging the
//! global flags into a `CacheConfig`, and formatting lookup results.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::cache::{CacheEntry, CacheStats};
use crate::config::{parse_ttl_hours, CacheConfig, ConfigError};
use crate::data::CompanyRecord;

/// Registry cache - look up Estonian companies through the local registry cache
#[derive(Parser, Debug)]
#[command(name = "regcache")]
#[command(about = "Cached Estonian Business Registry lookups")]
#[command(version)]
pub struct Cli {
    /// Base URL of the registry lookup endpoint
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// Directory for the persisted cache
    #[arg(long, global = true, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Hours before a cached entry is refetched
    #[arg(long, global = true, value_name = "HOURS", value_parser = parse_ttl_arg)]
    pub ttl_hours: Option<i64>,

    /// Keep the cache in memory only for this run
    #[arg(long, global = true)]
    pub no_persist: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Operations on the registry cache
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Look up one or more registry numbers
    ///
    /// Examples:
    ///   regcache lookup 556655            # Test identifier, never hits the network
    ///   regcache lookup 12345678 10000000 # Real registry numbers, fetched concurrently
    Lookup {
        /// Registry numbers to look up
        #[arg(required = true, value_name = "REGISTRY_NUMBER")]
        registry_numbers: Vec<String>,
    },
    /// Show entry counts for the persisted cache
    Stats,
    /// Remove every cached entry
    Clear,
}

fn parse_ttl_arg(s: &str) -> Result<i64, String> {
    parse_ttl_hours(s).map_err(|e| e.to_string())
}

impl Cli {
    /// Applies the command-line flags on top of `base`
    ///
    /// # Returns
    /// * `Ok(CacheConfig)` with flag values taking precedence
    /// * `Err(ConfigError)` if a flag value is invalid
    pub fn resolve_config(&self, base: CacheConfig) -> Result<CacheConfig, ConfigError> {
        let mut config = base;
        if let Some(base_url) = &self.base_url {
            config = config.with_base_url(base_url.clone())?;
        }
        if let Some(hours) = self.ttl_hours {
            config = config.with_ttl_hours(hours)?;
        }
        if let Some(cache_dir) = &self.cache_dir {
            config.cache_dir = Some(cache_dir.clone());
        }
        if self.no_persist {
            config.persist = false;
        }
        Ok(config)
    }
}

/// Formats the outcome of a single lookup for the terminal
///
/// Failed lookups show the error recorded in the cache entry.
pub fn format_lookup(
    registry_number: &str,
    record: Option<&CompanyRecord>,
    entry: Option<&CacheEntry>,
) -> String {
    match record {
        Some(record) => {
            let mut line = format!("{}  {}  [{}]", registry_number, record.name, record.status);
            if let Some(address) = &record.address {
                line.push_str(&format!("  {}", address));
            }
            if record.is_mock {
                line.push_str("  (mock)");
            }
            line
        }
        None => {
            let reason = entry
                .and_then(|entry| entry.error.as_deref())
                .unwrap_or("no data");
            format!("{}  lookup failed: {}", registry_number, reason)
        }
    }
}

/// Formats cache statistics for the terminal
pub fn format_stats(stats: &CacheStats) -> String {
    format!(
        "entries: {}  expired: {}  loading: {}  errors: {}",
        stats.total, stats.expired, stats.loading, stats.errors
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::test_company_record;
    use chrono::{Duration, Utc};

    #[test]
    fn test_cli_parse_lookup_single() {
        let cli = Cli::parse_from(["regcache", "lookup", "556655"]);
        assert_eq!(
            cli.command,
            Command::Lookup {
                registry_numbers: vec!["556655".to_string()]
            }
        );
        assert!(!cli.no_persist);
    }

    #[test]
    fn test_cli_parse_lookup_requires_number() {
        assert!(Cli::try_parse_from(["regcache", "lookup"]).is_err());
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "regcache",
            "stats",
            "--ttl-hours",
            "6",
            "--no-persist",
            "--base-url",
            "http://registry.test",
        ]);
        assert_eq!(cli.command, Command::Stats);
        assert_eq!(cli.ttl_hours, Some(6));
        assert!(cli.no_persist);
        assert_eq!(cli.base_url.as_deref(), Some("http://registry.test"));
    }

    #[test]
    fn test_cli_rejects_negative_ttl() {
        assert!(Cli::try_parse_from(["regcache", "stats", "--ttl-hours", "-2"]).is_err());
    }

    #[test]
    fn test_cli_rejects_out_of_range_ttl() {
        assert!(
            Cli::try_parse_from(["regcache", "stats", "--ttl-hours", "9223372036854775807"])
                .is_err()
        );
    }

    #[test]
    fn test_resolve_config_rejects_out_of_range_ttl() {
        let mut cli = Cli::parse_from(["regcache", "stats"]);
        cli.ttl_hours = Some(i64::MAX);

        assert!(matches!(
            cli.resolve_config(CacheConfig::default()),
            Err(ConfigError::InvalidTtl(_))
        ));
    }

    #[test]
    fn test_resolve_config_without_flags_keeps_base() {
        let cli = Cli::parse_from(["regcache", "clear"]);
        let config = cli.resolve_config(CacheConfig::default()).unwrap();
        assert_eq!(config, CacheConfig::default());
    }

    #[test]
    fn test_resolve_config_flags_take_precedence() {
        let cli = Cli::parse_from([
            "regcache",
            "clear",
            "--cache-dir",
            "/tmp/regcache",
            "--ttl-hours",
            "1",
            "--no-persist",
        ]);
        let config = cli.resolve_config(CacheConfig::default()).unwrap();

        assert_eq!(config.cache_dir, Some(PathBuf::from("/tmp/regcache")));
        assert_eq!(config.ttl, Duration::hours(1));
        assert!(!config.persist);
    }

    #[test]
    fn test_format_lookup_mock_record() {
        let record = test_company_record("556655").expect("test record");
        let line = format_lookup("556655", Some(&record), None);

        assert!(line.contains("Test Company Alpha Ltd"));
        assert!(line.contains("[Active]"));
        assert!(line.contains("Tallinn"));
        assert!(line.ends_with("(mock)"));
    }

    #[test]
    fn test_format_lookup_failure_shows_cached_error() {
        let entry = CacheEntry::failed("HTTP error! status: 500", Utc::now());
        let line = format_lookup("12345678", None, Some(&entry));

        assert_eq!(line, "12345678  lookup failed: HTTP error! status: 500");
    }

    #[test]
    fn test_format_lookup_failure_without_entry() {
        let line = format_lookup("12345678", None, None);
        assert_eq!(line, "12345678  lookup failed: no data");
    }

    #[test]
    fn test_format_stats() {
        let stats = CacheStats {
            total: 3,
            expired: 1,
            loading: 0,
            errors: 2,
        };
        assert_eq!(
            format_stats(&stats),
            "entries: 3  expired: 1  loading: 0  errors: 2"
        );
    }
}
