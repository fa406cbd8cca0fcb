use crate::search::ObjectKind;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "docindex")]
#[command(about = "Build and query lexical search indexes for documentation sites", long_about = None)]
pub struct Cli {
    /// Configuration file (default: <config dir>/docindex/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build an index from a directory of documentation pages
    Build {
        /// Directory containing .rst, .md and .txt pages
        source: PathBuf,

        /// Write the index here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Wrap the JSON in Search.setIndex(...)
        #[arg(long)]
        js: bool,

        /// Rebuild even if a cached index matches the sources
        #[arg(long)]
        no_cache: bool,
    },
    /// Search a built index
    Search {
        /// Index file (JSON or Search.setIndex wrapper)
        index: PathBuf,

        query: String,

        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Look up documented objects by name
    Objects {
        /// Index file (JSON or Search.setIndex wrapper)
        index: PathBuf,

        /// Bare or qualified object name
        name: String,

        #[arg(short, long)]
        kind: Option<ObjectKind>,

        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Serve an index to MCP clients over stdio
    Serve {
        /// Index file (JSON or Search.setIndex wrapper)
        index: PathBuf,
    },
}
