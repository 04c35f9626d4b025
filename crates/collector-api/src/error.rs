use thiserror::Error;

#[derive(Error, Debug)]
pub enum CollectorError {
    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type Result<T> = std::result::Result<T, CollectorError>;
