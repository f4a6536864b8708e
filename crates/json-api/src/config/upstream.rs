//! Upstream Services Config

use std::{path::PathBuf, time::Duration};

use clap::Args;

/// Catalog and order service settings.
#[derive(Debug, Args)]
pub struct UpstreamConfig {
    /// Catalog service base URL
    #[arg(long, env = "CATALOG_URL", conflicts_with = "catalog_path")]
    pub catalog_url: Option<String>,

    /// Catalog fixture file (YAML), used instead of a catalog service
    #[arg(long, env = "CATALOG_PATH")]
    pub catalog_path: Option<PathBuf>,

    /// Order service base URL
    #[arg(long, env = "ORDERS_URL")]
    pub orders_url: String,

    /// Timeout for catalog and order requests, in milliseconds
    #[arg(long, env = "UPSTREAM_TIMEOUT_MS", default_value_t = 10_000_u64)]
    pub timeout_ms: u64,
}

impl UpstreamConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
