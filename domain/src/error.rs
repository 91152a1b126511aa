use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Unknown image provider: {0}")]
    UnknownProvider(String),

    #[error("Invalid credit amount: {0}")]
    InvalidAmount(i64),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },
}

pub type DomainResult<T> = Result<T, DomainError>;
