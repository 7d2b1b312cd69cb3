//! Error types for service wiring.

/// Errors raised while starting or stopping the service.
///
/// Runtime operations never return these: once the service is up, every
/// failure is either a result tag or a logged best-effort miss.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration could not be loaded or parsed.
    #[error("configuration error: {0}")]
    Config(#[from] quarry_core::ConfigError),

    /// The database could not be reached, migrated, or queried.
    #[error("database error: {0}")]
    Db(#[from] quarry_db::DbError),
}
