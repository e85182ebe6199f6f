use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Json Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed dump line: {0}")]
    Dump(String),

    #[error("Timestamp went backwards: {current} after {previous}")]
    NonMonotonicTimestamp { previous: f64, current: f64 },

    #[error("Timestamp is not a finite number: {0}")]
    NonFiniteTimestamp(f64),
}
