//! Registry cache CLI - look up Estonian companies through the shared cache
//!
//! A thin consumer of the `regcache` library: it builds a cache from the
//! environment and flags, runs one command and flushes the cache to disk.

use clap::Parser;
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

use regcache::cache::should_fetch_company_name;
use regcache::cli::{format_lookup, format_stats, Cli, Command};
use regcache::{CacheConfig, RegistryCache};

/// Sets up stderr logging, `warn` unless `RUST_LOG` says otherwise
fn init_logging() {
    let filter = EnvFilter::builder()
        .with_default_directive(Level::WARN.into())
        .from_env_lossy();

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let cli = Cli::parse();
    let config = cli.resolve_config(CacheConfig::from_env()?)?;
    let cache = RegistryCache::from_config(&config);

    match &cli.command {
        Command::Lookup { registry_numbers } => {
            let (wanted, skipped): (Vec<&String>, Vec<&String>) = registry_numbers
                .iter()
                .partition(|registry_number| should_fetch_company_name(registry_number));

            for registry_number in skipped {
                eprintln!(
                    "Skipping '{}': not a test identifier and not 8 characters",
                    registry_number
                );
            }

            // Lookups run concurrently; repeated numbers share one request.
            let lookups = wanted
                .iter()
                .map(|registry_number| cache.get_company_data(registry_number));
            let records = futures::future::join_all(lookups).await;

            for (registry_number, record) in wanted.iter().zip(records) {
                let entry = cache.get_cache_entry(registry_number);
                println!(
                    "{}",
                    format_lookup(registry_number, record.as_ref(), entry.as_ref())
                );
            }
        }
        Command::Stats => {
            println!("{}", format_stats(&cache.get_cache_stats()));
        }
        Command::Clear => {
            cache.clear_cache();
            println!("Cleared registry cache");
        }
    }

    cache.dispose();

    Ok(())
}
