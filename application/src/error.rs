use thiserror::Error;

use domain::error::DomainError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Database error: {message}")]
    DatabaseError { message: String },

    #[error("Insufficient credits: {message}")]
    InsufficientCredits { message: String },

    #[error("Provider unavailable: {message}")]
    ProviderUnavailable { message: String },

    #[error("Provider rejected request: {message}")]
    ProviderRejected { message: String },

    #[error("Poll error: {message}")]
    PollError { message: String },

    #[error("External service error: {message}")]
    ExternalServiceError { message: String },

    #[error("Forbidden")]
    Forbidden,

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Internal server error")]
    InternalServerError,
}

pub type AppResult<T> = Result<T, AppError>;
