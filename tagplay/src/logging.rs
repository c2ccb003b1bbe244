//! Logging setup
//!
//! Structured logs go to stderr so they never mix with the command loop's
//! stdout. Filtering follows `TAGPLAY_LOG`, then `RUST_LOG`, then `info`.

use tracing_subscriber::EnvFilter;

pub fn init() {
    let filter = std::env::var("TAGPLAY_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
