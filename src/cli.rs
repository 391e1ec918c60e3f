//! Command-line interface definitions.
//!
//! This module defines the CLI structure for the `file-cache` tool using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Inspect and maintain a file cache directory.
#[derive(Parser, Debug)]
#[command(name = "file-cache")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Cache root directory. Defaults to $SIMPLE_FILE_CACHE_DIR or ./cache.
    #[arg(short, long, global = true)]
    pub dir: Option<PathBuf>,

    /// The command to execute.
    #[clap(subcommand)]
    pub command: ClientCommand,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum ClientCommand {
    /// Print the value stored under a key as JSON.
    Get {
        /// The key to look up.
        key: String,
        /// Maximum age in minutes; 0 means no limit.
        #[arg(long, default_value_t = 0.0)]
        ttl: f64,
    },

    /// Store a value.
    ///
    /// The value is parsed as JSON when possible and stored as a plain
    /// string otherwise.
    Set {
        /// The key to store the value under.
        key: String,
        /// The value to store.
        value: String,
    },

    /// Delete a single key.
    Delete {
        /// The key to delete.
        key: String,
    },

    /// Delete every key matching a glob pattern.
    Clear {
        /// `*` matches within one `/`-separated segment.
        #[arg(default_value = crate::cache::DEFAULT_PATTERN)]
        pattern: String,
    },

    /// Delete every entry in every subdirectory.
    ClearAll,

    /// Delete entries older than the given age.
    Prune {
        /// Maximum age in minutes.
        #[arg(long)]
        ttl: f64,
    },

    /// List stored keys.
    Keys,
}

/// Interpret a command-line value: JSON if it parses, else a string.
pub fn parse_value(raw: &str) -> crate::Value {
    serde_json::from_str(raw).unwrap_or_else(|_| crate::Value::String(raw.to_string()))
}
