use std::time::Duration;

use recipegen_application::error::{AppError, AppResult};

pub mod content_generator_http;
pub mod dashscope_provider;
pub mod replicate_provider;

pub(crate) fn build_http_client(timeout_secs: u64) -> AppResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| AppError::ConfigError {
            message: format!("Failed to build HTTP client: {}", e),
        })
}
