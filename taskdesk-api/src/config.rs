/// Configuration management for the API server
///
/// This module loads configuration from environment variables and provides
/// a type-safe configuration struct.
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 5000)
/// - `APP_ENV`: `development` or `production` (default: development)
/// - `CORS_ORIGINS`: Comma-separated allowed origins, `*` for any (default: http://localhost:3000)
/// - `STORAGE_BACKEND`: `postgres` or `memory` (default: postgres)
/// - `DATABASE_URL`: PostgreSQL connection string (required for postgres)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `JWT_SECRET`: Secret key for JWT signing (required, at least 32 characters)
/// - `JWT_EXPIRE`: Token lifetime such as `7d`, `12h`, `30m` or `3600` (default: 7d)
/// - `ADMIN_SECRET`: Secret for admin registration (unset disables it)
/// - `RATE_LIMIT_WINDOW_MS`: Rate limit window (default: 900000)
/// - `RATE_LIMIT_MAX_REQUESTS`: Requests per window per client (default: 100)
/// - `ADMIN_RATE_LIMIT_MAX_REQUESTS`: Admin registrations per window per client (default: 5)
/// - `TRUST_PROXY`: Key rate limits on the proxy-appended `X-Forwarded-For` entry (default: false)
/// - `RUST_LOG`: Log filter (default: debug for taskdesk crates)
///
/// # Example
///
/// ```no_run
/// use taskdesk_api::config::Config;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}:{}", config.api.host, config.api.port);
/// # Ok(())
/// # }
/// ```

use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Storage backend selection
    pub storage: StorageBackend,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT configuration
    pub jwt: JwtConfig,

    /// Account configuration
    pub auth: AuthConfig,

    /// Rate limiting configuration
    pub rate_limit: RateLimitConfig,
}

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

impl FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => anyhow::bail!("APP_ENV must be development or production, got {:?}", other),
        }
    }
}

/// Which store serves requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => anyhow::bail!("STORAGE_BACKEND must be postgres or memory, got {:?}", other),
        }
    }
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    pub environment: Environment,

    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: Option<String>,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret key for JWT signing
    ///
    /// IMPORTANT: This must be kept secret and should be at least 32 bytes.
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,

    /// Token lifetime
    pub expires_in: Duration,
}

#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    /// Secret required by admin registration
    pub admin_secret: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Window over which `max_requests` applies
    pub window: Duration,

    /// Requests per client per window on the API
    pub max_requests: u32,

    /// Admin registrations per client per window
    pub admin_max_requests: u32,

    /// Identify clients by the last `X-Forwarded-For` hop instead of the
    /// socket peer. Only safe behind a proxy that appends to the header.
    pub trust_proxy: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_millis(900_000),
            max_requests: 100,
            admin_max_requests: 5,
            trust_proxy: false,
        }
    }
}

/// Longest accepted lifetime (ten years)
pub const MAX_DURATION: Duration = Duration::from_secs(10 * 365 * 24 * 60 * 60);

/// Parses a lifetime such as `7d`, `12h`, `30m`, `45s` or plain seconds
///
/// Values above [`MAX_DURATION`] are rejected.
pub fn parse_duration(value: &str) -> anyhow::Result<Duration> {
    let value = value.trim();
    let split = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    let (digits, unit) = value.split_at(split);

    let amount: u64 = digits
        .parse()
        .with_context(|| format!("invalid duration {:?}", value))?;
    let multiplier = match unit {
        "" | "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 24 * 60 * 60,
        other => anyhow::bail!("unknown duration unit {:?} in {:?}", other, value),
    };

    if amount == 0 {
        anyhow::bail!("duration must be positive: {:?}", value);
    }

    match amount.checked_mul(multiplier).map(Duration::from_secs) {
        Some(duration) if duration <= MAX_DURATION => Ok(duration),
        _ => anyhow::bail!("duration {:?} exceeds the ten year maximum", value),
    }
}

fn parse_bool(key: &str, value: &str) -> anyhow::Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => anyhow::bail!("{} must be true or false, got {:?}", key, other),
    }
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing
    /// - Environment variables have invalid values
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let get_or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let api_port = get_or("API_PORT", "5000")
            .parse::<u16>()
            .context("API_PORT must be a port number")?;
        let environment: Environment = get_or("APP_ENV", "development").parse()?;
        let cors_origins = get_or("CORS_ORIGINS", "http://localhost:3000")
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let storage: StorageBackend = get_or("STORAGE_BACKEND", "postgres").parse()?;
        let database_url = get("DATABASE_URL");
        if storage == StorageBackend::Postgres && database_url.is_none() {
            anyhow::bail!("DATABASE_URL environment variable is required");
        }

        let max_connections = get_or("DATABASE_MAX_CONNECTIONS", "10")
            .parse::<u32>()
            .context("DATABASE_MAX_CONNECTIONS must be a number")?;

        let jwt_secret = get("JWT_SECRET")
            .ok_or_else(|| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let expires_in = parse_duration(&get_or("JWT_EXPIRE", "7d")).context("JWT_EXPIRE")?;

        let window_ms = get_or("RATE_LIMIT_WINDOW_MS", "900000")
            .parse::<u64>()
            .context("RATE_LIMIT_WINDOW_MS must be a number")?;
        let max_requests = get_or("RATE_LIMIT_MAX_REQUESTS", "100")
            .parse::<u32>()
            .context("RATE_LIMIT_MAX_REQUESTS must be a number")?;
        let admin_max_requests = get_or("ADMIN_RATE_LIMIT_MAX_REQUESTS", "5")
            .parse::<u32>()
            .context("ADMIN_RATE_LIMIT_MAX_REQUESTS must be a number")?;
        if window_ms == 0 || max_requests == 0 || admin_max_requests == 0 {
            anyhow::bail!("rate limit window and request limits must be positive");
        }
        let trust_proxy = parse_bool("TRUST_PROXY", &get_or("TRUST_PROXY", "false"))?;

        Ok(Self {
            api: ApiConfig {
                host: get_or("API_HOST", "0.0.0.0"),
                port: api_port,
                environment,
                cors_origins,
            },
            storage,
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            jwt: JwtConfig {
                secret: jwt_secret,
                expires_in,
            },
            auth: AuthConfig {
                admin_secret: get("ADMIN_SECRET"),
            },
            rate_limit: RateLimitConfig {
                window: Duration::from_millis(window_ms),
                max_requests,
                admin_max_requests,
                trust_proxy,
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    pub fn is_production(&self) -> bool {
        self.api.environment.is_production()
    }
}
