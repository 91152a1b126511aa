use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::{debug, error};

use recipegen_application::error::AppError;

#[derive(Debug)]
pub struct HttpError(pub AppError);

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let app_error = &self.0;

        match app_error {
            AppError::Domain(_)
            | AppError::ValidationError { .. }
            | AppError::InsufficientCredits { .. }
            | AppError::NotFound { .. } => {
                debug!("Client error response generated: {}", app_error);
            }
            _ => {
                error!("Server error response generated: {}", app_error);
            }
        }

        let (status_code, message) = match app_error {
            AppError::Domain(_) => (StatusCode::BAD_REQUEST, app_error.to_string()),

            AppError::ValidationError { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, app_error.to_string())
            }

            AppError::ConfigError { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Configuration error".to_string(),
            ),

            AppError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),

            AppError::DatabaseError { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error".to_string(),
            ),

            AppError::InsufficientCredits { message } => (StatusCode::FORBIDDEN, message.clone()),

            AppError::ProviderRejected { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, app_error.to_string())
            }

            AppError::ProviderUnavailable { .. } => {
                (StatusCode::SERVICE_UNAVAILABLE, app_error.to_string())
            }

            AppError::PollError { .. } => (StatusCode::BAD_GATEWAY, app_error.to_string()),

            AppError::ExternalServiceError { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "External service error".to_string(),
            ),

            AppError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden".to_string()),

            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message.clone()),
        };

        let error_response = json!({
            "ok": false,
            "error": message,
            "status": status_code.as_u16()
        });

        (status_code, Json(error_response)).into_response()
    }
}

impl From<AppError> for HttpError {
    fn from(app_error: AppError) -> Self {
        HttpError(app_error)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_credits_maps_to_forbidden() {
        let response = HttpError(AppError::InsufficientCredits {
            message: "Required 1 credits, but only 0 available".to_string(),
        })
        .into_response();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn provider_errors_split_between_unavailable_and_rejected() {
        let unavailable = HttpError(AppError::ProviderUnavailable {
            message: "no api key".to_string(),
        })
        .into_response();
        let rejected = HttpError(AppError::ProviderRejected {
            message: "prompt refused".to_string(),
        })
        .into_response();

        assert_eq!(unavailable.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(rejected.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn poll_error_maps_to_bad_gateway() {
        let response = HttpError(AppError::PollError {
            message: "connection reset".to_string(),
        })
        .into_response();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
