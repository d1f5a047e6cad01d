//! Store configuration.
//!
//! The pipeline consumes a resolved configuration struct passed in at
//! construction time; there is no global configuration state. `from_env` is
//! a convenience for services that configure through the environment.

/// Configuration for the document-store connection.
///
/// All settings can be configured via environment variables:
/// - `DATABASE_URL`: store connection string (required)
/// - `DATABASE_NAME`: database to select on the server (default: `intake`)
/// - `DB_MAX_CONNECTIONS`: maximum pool size (default: 10)
/// - `DB_CONNECT_TIMEOUT_SECS`: connection timeout (default: 10)
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Store connection URL.
    pub url: String,
    /// Database name, applied on top of the URL.
    pub db_name: String,
    /// Maximum connections in the backend pool (default: 10).
    pub max_connections: u32,
    /// Connection acquire timeout in seconds (default: 10).
    pub connect_timeout_secs: u64,
}

impl StoreConfig {
    /// Build a configuration from explicit connection values.
    pub fn new(url: impl Into<String>, db_name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            db_name: db_name.into(),
            max_connections: 10,
            connect_timeout_secs: 10,
        }
    }

    /// Load configuration from environment variables with production defaults.
    pub fn from_env() -> Self {
        Self {
            url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgresql://localhost/intake".to_string()),
            db_name: std::env::var("DATABASE_NAME").unwrap_or_else(|_| "intake".to_string()),
            max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            connect_timeout_secs: std::env::var("DB_CONNECT_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
        }
    }
}
