use clap::{Parser, ValueEnum};

/// Telegram guild economy bot with a transactional coin ledger
#[derive(Parser, Debug)]
#[command(name = "coinkeeper")]
#[command(about = "Telegram guild economy bot with a transactional coin ledger", long_about = None)]
pub struct CliArgs {
    /// Storage backend for accounts and settings
    #[arg(
        long = "storage",
        value_name = "BACKEND",
        default_value = "postgres",
        help = "Storage backend: 'postgres' for durable storage or 'memory' for a throwaway local run"
    )]
    pub storage: StorageBackend,

    /// PostgreSQL connection string
    #[arg(
        long = "database-url",
        value_name = "URL",
        help = "PostgreSQL connection string (falls back to the DATABASE_URL environment variable)"
    )]
    pub database_url: Option<String>,

    /// Default display prefix
    #[arg(
        long = "prefix",
        value_name = "PREFIX",
        default_value = "m!",
        help = "Display prefix used when a guild has not configured its own"
    )]
    pub default_prefix: String,
}

/// Available storage backends
#[derive(Clone, Debug, ValueEnum, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Postgres,
}

impl CliArgs {
    /// Resolve the database URL from the flag or the environment
    ///
    /// The flag takes priority; `DATABASE_URL` is the conventional
    /// fallback so the bot runs unchanged under most process managers.
    pub fn resolve_database_url(&self) -> Option<String> {
        self.database_url
            .clone()
            .or_else(|| std::env::var("DATABASE_URL").ok())
    }
}
