//! MongoDB connector and utilities
//!
//! Connection management, health checks and idempotent index setup.

mod config;
mod connector;
mod health;
mod indexes;

pub use config::MongoConfig;
pub use connector::{connect, connect_from_config, open_database};
pub use health::{check_health, check_health_detailed, HealthStatus};
pub use indexes::{ensure_indexes, is_already_satisfied, IndexReport};

// Re-export MongoDB types for convenience
pub use mongodb::{Client, Collection, Database};
