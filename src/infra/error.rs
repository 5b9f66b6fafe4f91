use thiserror::Error;

/// Adapter-level failures: sockets, the Postgres pool, tracing bootstrap,
/// and wiring that has to be present before the first request.
#[derive(Debug, Error)]
pub enum InfraError {
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("database failure: {0}")]
    Database(#[from] sqlx::Error),
    #[error("telemetry setup failed: {0}")]
    Telemetry(String),
    #[error("bad configuration: {0}")]
    Configuration(String),
}

impl InfraError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn telemetry(message: impl Into<String>) -> Self {
        Self::Telemetry(message.into())
    }
}
