use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("invalid date (expected YYYY-MM-DD): {0}")]
    InvalidDate(String),
    #[error("invalid file pattern: {0}")]
    InvalidPattern(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("maintenance lock held: {0}")]
    Locked(String),
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::Config(value.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
