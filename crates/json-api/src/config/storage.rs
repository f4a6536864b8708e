//! Storage Config

use clap::{Args, ValueEnum};

/// Where carts are kept.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum StorageKind {
    /// Process memory; carts are lost on restart.
    Memory,

    /// `PostgreSQL`, migrated on startup.
    Postgres,
}

/// Storage settings.
#[derive(Debug, Args)]
pub struct StorageConfig {
    /// Cart storage backend (memory, postgres)
    #[arg(long, env = "CART_STORAGE", value_enum, default_value_t = StorageKind::Memory)]
    pub storage: StorageKind,

    /// `PostgreSQL` connection string, required for postgres storage
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,
}
