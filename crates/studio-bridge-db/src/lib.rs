//! Content storage for Studio Bridge
//!
//! This crate persists course and library content blocks, including:
//! - The `ContentStore` trait the services depend on
//! - An in-memory store for development and tests
//! - A PostgreSQL store using SQLx with JSONB block documents
//! - Connection pool management and migrations
//! - Demo content seeding
//!
//! # Example
//!
//! ```rust,no_run
//! use studio_bridge_db::{create_pool, PoolConfig, PostgresContentStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PoolConfig::new("postgres://localhost/studio_bridge").max_connections(10);
//! let pool = create_pool(&config).await?;
//! let store = PostgresContentStore::new(pool);
//! # Ok(())
//! # }
//! ```

pub use studio_bridge_core;

pub mod error;
pub mod memory;
pub mod pool;
pub mod postgres;
pub mod seed;
pub mod store;

// Re-exports for convenience
pub use error::{DbError, DbResult};
pub use memory::InMemoryContentStore;
pub use pool::{
    close_pool, create_pool, mask_password, run_migrations, verify_pool_health, PoolConfig,
};
pub use postgres::PostgresContentStore;
pub use seed::{
    seed_demo_content, DEMO_COURSE_HTML, DEMO_COURSE_PROBLEM, DEMO_COURSE_ROOT,
    DEMO_COURSE_SEQUENTIAL, DEMO_COURSE_UNIT, DEMO_LIBRARY_ROOT, DEMO_LIBRARY_VERTICAL,
};
pub use store::ContentStore;

pub use sqlx::postgres::PgPool;

/// Storage layer version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
