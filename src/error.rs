use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// One of the input series is empty, or the two share no dates.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// Not enough aligned rows to fill the longest lookback window.
    #[error("Insufficient history: need at least {required} aligned rows, have {available}")]
    InsufficientHistory { required: usize, available: usize },

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;
