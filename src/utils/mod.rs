//! Utilities: logging setup (stderr only, level from -v/-q) and unique
//! artifact name suffixes.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Logging helpers.
pub mod logging {
    use super::*;

    /// -q wins; otherwise each -v steps info -> debug -> trace.
    pub fn derive_level(verbose: u8, quiet: bool) -> LevelFilter {
        if quiet {
            return LevelFilter::ERROR;
        }
        match verbose {
            0 => LevelFilter::INFO,
            1 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }

    /// Install the global subscriber. Stdout carries the MCP stream, so
    /// everything goes to stderr. `RUST_LOG` overrides the derived level.
    pub fn init_logging(level: LevelFilter) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(level.to_string().to_lowercase()));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_ansi(std::env::var_os("NO_COLOR").is_none())
            .with_target(false)
            .try_init();
    }
}

pub use logging::{derive_level, init_logging};

/// Time-based suffix with a random tail: `<millis>-<8 hex>`.
pub fn unique_suffix() -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let random = uuid::Uuid::new_v4().simple().to_string();
    format!("{millis}-{}", &random[..8])
}
