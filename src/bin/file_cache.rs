//! File cache command-line tool.
//!
//! Reads and maintains a cache directory shared with applications that embed
//! the library.

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use simple_file_cache::cli::{parse_value, Cli, ClientCommand};
use simple_file_cache::{CacheConfig, CacheStore, Ttl, Value};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "simple_file_cache=info,file_cache=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();
    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = CacheConfig::from_env();
    if let Some(dir) = args.dir {
        config = config.root(dir);
    }
    let cache = CacheStore::new(config)?;

    match args.command {
        ClientCommand::Get { key, ttl } => match cache.get::<Value>(&key, Ttl::minutes(ttl)) {
            Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
            None => {
                eprintln!("Key '{}' not found", key);
                std::process::exit(2);
            }
        },

        ClientCommand::Set { key, value } => {
            cache.set(&key, &parse_value(&value))?;
            info!(key = %key, "Stored value");
        }

        ClientCommand::Delete { key } => {
            if cache.delete(&key)? {
                println!("Deleted key '{}'", key);
            } else {
                println!("Key '{}' not found", key);
            }
        }

        ClientCommand::Clear { pattern } => {
            let removed = cache.clear(&pattern)?;
            println!("Removed {} entries matching '{}'", removed, pattern);
        }

        ClientCommand::ClearAll => {
            let removed = cache.clear_all()?;
            println!("Removed {} entries", removed);
        }

        ClientCommand::Prune { ttl } => {
            let removed = cache.prune_expired(Ttl::minutes(ttl))?;
            println!("Pruned {} expired entries", removed);
        }

        ClientCommand::Keys => {
            for key in cache.keys()? {
                println!("{}", key);
            }
        }
    }

    Ok(())
}
