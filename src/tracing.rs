//! Tracing initialization.

use std::sync::Once;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

static INIT: Once = Once::new();

/// Initialize tracing. Safe to call multiple times.
///
/// Output always goes to stderr: stdout carries search results for the CLI and
/// the MCP protocol stream for `serve`. `verbose` lowers the default level to DEBUG.
pub fn init(verbose: bool) {
    INIT.call_once(|| {
        let is_test =
            std::env::var("NEXTEST").is_ok() || std::env::var("CARGO_TARGET_TMPDIR").is_ok();
        let filter = EnvFilter::from_default_env().add_directive(
            if is_test || verbose {
                tracing::Level::DEBUG
            } else {
                tracing::Level::INFO
            }
            .into(),
        );

        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_target(true)
            .with_span_events(FmtSpan::NONE)
            .compact();

        let result = if is_test {
            builder.with_test_writer().try_init()
        } else {
            builder.with_writer(std::io::stderr).try_init()
        };

        // Another subscriber may already be installed by an embedding application
        if let Err(e) = result {
            eprintln!("Failed to initialize tracing: {}", e);
        }
    });
}
