use thiserror::Error;

#[derive(Error, Debug)]
pub enum TracerError {
    #[error("Tracing interrupted: {0}")]
    Interrupted(String),
    #[error("Failed to encode call trace: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum TraceDecodeError {
    #[error("Malformed trace data: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum DbConfigError {
    #[error("Invalid db params: expected '<dialect> <connection string>'")]
    MissingConnectionString,
    #[error("Unsupported database dialect: {0}")]
    UnsupportedDialect(String),
}
