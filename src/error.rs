use thiserror::Error;

#[derive(Debug, Error)]
pub enum MssqlMiddlewareError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Query execution error: {0}")]
    QueryExecutionError(String),

    #[error("Transaction error: {0}")]
    TransactionError(String),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Invalid limit specification: {0}")]
    InvalidLimit(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<serde_json::Error> for MssqlMiddlewareError {
    fn from(err: serde_json::Error) -> Self {
        MssqlMiddlewareError::ConfigError(format!("invalid connection parameters: {err}"))
    }
}
