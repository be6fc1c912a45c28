//! Studio Bridge Server
//!
//! Main entry point for the Studio Bridge HTTP server. Sets up the content
//! store, services and HTTP server with graceful shutdown.

mod config;
mod telemetry;

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use studio_bridge_api::{build_api_server_with_config, AuthState, JwtManager};
use studio_bridge_core::BlockRuntime;
use studio_bridge_db::{
    close_pool, create_pool, mask_password, seed_demo_content, ContentStore,
    InMemoryContentStore, PgPool, PostgresContentStore,
};
use studio_bridge_service::ServiceRegistry;
use tokio::signal;
use tracing::{error, info};

use config::{ServerConfig, StoreBackend};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration directory
    #[arg(short, long, env = "CONFIG_DIR", default_value = "config")]
    config_dir: String,

    /// Environment (development, production, etc.)
    #[arg(short, long, env = "ENVIRONMENT", default_value = "development")]
    environment: String,

    #[arg(long, env = "SERVER_HOST")]
    host: Option<String>,

    #[arg(short, long, env = "SERVER_PORT")]
    port: Option<u16>,

    /// Content store backend
    #[arg(long, value_enum)]
    store: Option<StoreArg>,

    /// Database URL; implies the postgres store
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Skip seeding the demo course and library
    #[arg(long)]
    no_seed: bool,

    /// Log level
    #[arg(long, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum StoreArg {
    Memory,
    Postgres,
}

impl From<StoreArg> for StoreBackend {
    fn from(arg: StoreArg) -> Self {
        match arg {
            StoreArg::Memory => StoreBackend::Memory,
            StoreArg::Postgres => StoreBackend::Postgres,
        }
    }
}

impl Args {
    /// Apply command-line overrides on top of the loaded configuration
    fn apply(self, config: &mut ServerConfig) {
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(database_url) = self.database_url {
            config.store.database.url = database_url;
            config.store.backend = StoreBackend::Postgres;
        }
        if let Some(store) = self.store {
            config.store.backend = store.into();
        }
        if self.no_seed {
            config.store.seed_demo_content = false;
        }
        if let Some(log_level) = self.log_level {
            config.logging.level = log_level;
        }
        if self.json_logs {
            config.logging.json_format = true;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let environment = args.environment.clone();
    let mut config = ServerConfig::load_or_default(&args.config_dir, &args.environment);
    args.apply(&mut config);

    telemetry::init_with_config(&telemetry::TelemetryConfig::from(&config.logging))?;

    info!("Starting Studio Bridge Server");
    info!("Environment: {}", environment);
    info!("Server: {}", config.bind_address());

    let (store, pool) = setup_store(&config).await?;

    if config.store.seed_demo_content {
        let seeded = seed_demo_content(store.as_ref())
            .await
            .context("Failed to seed demo content")?;
        info!(blocks = seeded.len(), "Demo content seeded");
    }

    let services = ServiceRegistry::new(store, Arc::new(BlockRuntime::with_defaults()));

    let jwt_manager = JwtManager::new(config.auth.to_jwt_config()).context("Invalid auth configuration")?;
    let app = build_api_server_with_config(
        services,
        AuthState::new(jwt_manager),
        config.middleware_config(),
    );

    let http_addr: SocketAddr = config
        .bind_address()
        .parse()
        .context("Invalid HTTP bind address")?;

    let listener = tokio::net::TcpListener::bind(http_addr)
        .await
        .context("Failed to bind HTTP server")?;

    info!("HTTP Server listening on http://{}", http_addr);

    let serve = axum::serve(listener, app.into_make_service());
    if config.server.graceful_shutdown {
        serve
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("HTTP Server error")?;
    } else {
        serve.await.context("HTTP Server error")?;
    }

    if let Some(pool) = pool {
        close_pool(pool).await;
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Build the configured content store; the pool is returned for shutdown
async fn setup_store(config: &ServerConfig) -> Result<(Arc<dyn ContentStore>, Option<PgPool>)> {
    match config.store.backend {
        StoreBackend::Memory => {
            info!("Using in-memory content store");
            Ok((Arc::new(InMemoryContentStore::new()), None))
        }
        StoreBackend::Postgres => {
            let database = &config.store.database;
            info!("Database: {}", mask_password(&database.url));

            let pool_config = database.to_pool_config(config.logging.level != "error");
            let pool = create_pool(&pool_config)
                .await
                .context("Failed to create database connection pool")?;

            info!("Database connection established");
            Ok((Arc::new(PostgresContentStore::new(pool.clone())), Some(pool)))
        }
    }
}

/// Resolves on SIGTERM or Ctrl+C
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
