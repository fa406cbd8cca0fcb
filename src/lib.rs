pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod format;
pub mod pages;
pub mod search;
pub mod server;
pub mod tools;
pub mod tracing;

pub use config::Config;
pub use error::{BuildError, InvalidQuery, LoadError, Result};
pub use search::{IndexBuilder, ObjectKind, SearchIndex, TokenizerSettings};
pub use server::DocIndexServer;
