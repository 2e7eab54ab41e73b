//! Observability error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ObservabilityError {
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("Metrics output is not UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    #[error("Tracing initialization failed: {0}")]
    Tracing(String),
}

pub type Result<T> = std::result::Result<T, ObservabilityError>;
