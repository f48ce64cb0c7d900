//! Server configuration
//!
//! Bind address and optional banner file, taken from the command line
//! with sensible defaults. A missing banner file is non-fatal.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// Default bind address
pub const DEFAULT_ADDR: &str = "127.0.0.1:7676";

/// Default banner file path
pub const DEFAULT_BANNER_PATH: &str = "banner.txt";

/// Runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Listener bind address (host:port)
    pub addr: String,
    /// Banner file embedded as `header` in every greeting handshake
    pub banner_path: PathBuf,
}

impl Config {
    /// Build from command-line arguments: `[addr] [banner-path]`.
    pub fn from_args<I>(mut args: I) -> Self
    where
        I: Iterator<Item = String>,
    {
        let addr = args.next().unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let banner_path = args
            .next()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BANNER_PATH));
        Self { addr, banner_path }
    }
}

/// Read the banner file once at startup.
///
/// Absence falls back to an empty banner; only the fallback is logged.
pub fn load_banner(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(banner) => {
            debug!("loaded banner from {}", path.display());
            banner.trim_end().to_string()
        }
        Err(e) => {
            warn!("no banner at {} ({}), using empty banner", path.display(), e);
            String::new()
        }
    }
}
