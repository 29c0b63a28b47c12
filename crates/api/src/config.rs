use pixsynth_core::config::{env_list, env_parse, env_string};

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds. Generation runs inside the request,
    /// so this is long by default (`900`).
    pub request_timeout_secs: u64,
    /// Postgres connection string. Unset means in-memory persistence.
    pub database_url: Option<String>,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                 |
    /// |------------------------|-------------------------|
    /// | `HOST`                 | `0.0.0.0`               |
    /// | `PORT`                 | `8000`                  |
    /// | `CORS_ORIGINS`         | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS` | `900`                   |
    /// | `DATABASE_URL`         | unset                   |
    pub fn from_env() -> Self {
        Self {
            host: env_string("HOST", "0.0.0.0"),
            port: env_parse("PORT", 8000),
            cors_origins: env_list("CORS_ORIGINS", "http://localhost:5173"),
            request_timeout_secs: env_parse("REQUEST_TIMEOUT_SECS", 900),
            database_url: std::env::var("DATABASE_URL").ok().filter(|u| !u.is_empty()),
        }
    }
}
