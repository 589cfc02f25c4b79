use thiserror::Error;

/// Errors surfaced by games, the search engines and table persistence.
#[derive(Error, Debug)]
pub enum PlayoutError {
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Outcome {0} is outside [0, 1]")]
    InvalidOutcome(f64),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed state-value table: {0}")]
    Format(String),
}

/// Convenience Result type for playout operations
pub type Result<T> = std::result::Result<T, PlayoutError>;
