//! Server configuration
//!
//! Configuration is layered from several sources, later ones overriding
//! earlier ones:
//! - `config/default.toml`
//! - `config/{environment}.toml`
//! - `STUDIO_BRIDGE__*` environment variables
//! - command-line arguments (applied in `main`)

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use studio_bridge_api::{CorsConfig as ApiCorsConfig, JwtConfig, MiddlewareConfig};
use studio_bridge_db::PoolConfig;

/// Server configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: HttpServerConfig,

    /// Content store settings
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub cors: CorsConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Enable graceful shutdown
    #[serde(default = "default_true")]
    pub graceful_shutdown: bool,

    #[serde(default = "default_true")]
    pub enable_compression: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_true() -> bool {
    true
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            graceful_shutdown: true,
            enable_compression: true,
        }
    }
}

/// Which content store backs the services
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Process-local store, lost on restart
    #[default]
    Memory,
    Postgres,
}

/// Content store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    /// Seed the demo course and library at startup
    #[serde(default = "default_true")]
    pub seed_demo_content: bool,

    /// Used when `backend = "postgres"`
    #[serde(default)]
    pub database: DatabaseConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            seed_demo_content: true,
            database: DatabaseConfig::default(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connection_timeout")]
    pub connect_timeout_seconds: u64,

    /// Run migrations on startup
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

fn default_database_url() -> String {
    "postgres://localhost/studio_bridge".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_connection_timeout() -> u64 {
    10
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_seconds: default_connection_timeout(),
            run_migrations: true,
        }
    }
}

impl DatabaseConfig {
    pub fn to_pool_config(&self, enable_logging: bool) -> PoolConfig {
        PoolConfig::new(&self.url)
            .min_connections(self.min_connections)
            .max_connections(self.max_connections)
            .connect_timeout(Duration::from_secs(self.connect_timeout_seconds))
            .run_migrations(self.run_migrations)
            .enable_logging(enable_logging)
    }
}

/// Bearer token settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,

    #[serde(default = "default_issuer")]
    pub issuer: String,

    #[serde(default = "default_audience")]
    pub audience: String,

    /// Token lifetime in seconds
    #[serde(default = "default_expiration")]
    pub expiration_seconds: i64,
}

fn default_jwt_secret() -> String {
    JwtConfig::default().secret
}

fn default_issuer() -> String {
    JwtConfig::default().issuer
}

fn default_audience() -> String {
    JwtConfig::default().audience
}

fn default_expiration() -> i64 {
    JwtConfig::default().expiration_seconds
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            issuer: default_issuer(),
            audience: default_audience(),
            expiration_seconds: default_expiration(),
        }
    }
}

impl AuthConfig {
    pub fn to_jwt_config(&self) -> JwtConfig {
        JwtConfig::new(&self.jwt_secret)
            .with_issuer(&self.issuer)
            .with_audience(&self.audience)
            .with_expiration(self.expiration_seconds)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or filter directive (e.g. `info,studio_bridge_db=debug`)
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json_format: bool,

    #[serde(default = "default_true")]
    pub include_timestamps: bool,

    #[serde(default)]
    pub include_thread_ids: bool,

    /// Include target module
    #[serde(default = "default_true")]
    pub include_target: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
            include_timestamps: true,
            include_thread_ids: false,
            include_target: true,
        }
    }
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Allowed origins (empty means all)
    #[serde(default)]
    pub allowed_origins: Vec<String>,

    #[serde(default)]
    pub allow_credentials: bool,

    /// Max age for preflight requests in seconds
    #[serde(default = "default_cors_max_age")]
    pub max_age_seconds: u64,
}

fn default_cors_max_age() -> u64 {
    3600
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![],
            allow_credentials: false,
            max_age_seconds: default_cors_max_age(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from files and environment
    ///
    /// Environment variables use the `STUDIO_BRIDGE` prefix and `__` as the
    /// nesting separator, e.g. `STUDIO_BRIDGE__SERVER__PORT=9000`.
    pub fn load(config_dir: impl Into<PathBuf>, environment: &str) -> Result<Self, ConfigError> {
        let config_dir = config_dir.into();

        Config::builder()
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            .add_source(File::from(config_dir.join(format!("{}.toml", environment))).required(false))
            .add_source(
                Environment::with_prefix("STUDIO_BRIDGE")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("cors.allowed_origins")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Load configuration, falling back to defaults on error
    pub fn load_or_default(config_dir: impl Into<PathBuf>, environment: &str) -> Self {
        Self::load(config_dir, environment).unwrap_or_else(|e| {
            eprintln!("Warning: Failed to load configuration: {}", e);
            eprintln!("Using default configuration");
            Self::default()
        })
    }

    /// Get server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn middleware_config(&self) -> MiddlewareConfig {
        MiddlewareConfig::new()
            .with_compression(self.server.enable_compression)
            .with_cors(ApiCorsConfig {
                allowed_origins: self.cors.allowed_origins.clone(),
                allow_credentials: self.cors.allow_credentials,
                max_age_seconds: Some(self.cors.max_age_seconds),
            })
    }
}
