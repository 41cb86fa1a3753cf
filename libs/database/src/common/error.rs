/// Error type shared by the database connectors
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    /// Driver-level MongoDB errors
    #[cfg(feature = "mongodb")]
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    /// The server could not be reached or refused the initial ping
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// An index could not be created for a reason other than it already existing
    #[error("Index '{index}' could not be created: {reason}")]
    IndexCreation { index: String, reason: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type alias for database operations
pub type DatabaseResult<T> = Result<T, DatabaseError>;
