use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use domain::user::UserId;
use recipegen_application::error::AppError;

use super::error_mapper::HttpError;

const USER_ID_HEADER: &str = "x-user-id";
const USER_ROLE_HEADER: &str = "x-user-role";

/// Caller identity forwarded by the authenticating gateway. The
/// service trusts these headers; it does not authenticate itself.
#[derive(Debug, Clone)]
pub struct UserContext {
    pub user_id: UserId,
    pub is_admin: bool,
}

impl<S> FromRequestParts<S> for UserContext
where
    S: Send + Sync,
{
    type Rejection = HttpError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw_user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                HttpError(AppError::ValidationError {
                    message: format!("Missing {} header", USER_ID_HEADER),
                })
            })?;

        let user_id = Uuid::parse_str(raw_user_id).map_err(|_| {
            HttpError(AppError::ValidationError {
                message: format!("Invalid {} header: not a UUID", USER_ID_HEADER),
            })
        })?;

        let is_admin = parts
            .headers
            .get(USER_ROLE_HEADER)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|role| role.eq_ignore_ascii_case("admin"));

        Ok(Self {
            user_id: UserId::from_uuid(user_id),
            is_admin,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> Result<UserContext, HttpError> {
        let (mut parts, ()) = request.into_parts();
        UserContext::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn parses_user_and_admin_role() {
        let id = Uuid::new_v4();
        let request = Request::builder()
            .header(USER_ID_HEADER, id.to_string())
            .header(USER_ROLE_HEADER, "Admin")
            .body(())
            .unwrap();

        let context = extract(request).await.unwrap();

        assert_eq!(context.user_id, UserId::from_uuid(id));
        assert!(context.is_admin);
    }

    #[tokio::test]
    async fn missing_user_header_is_rejected() {
        let request = Request::builder().body(()).unwrap();
        assert!(extract(request).await.is_err());
    }

    #[tokio::test]
    async fn malformed_uuid_is_rejected() {
        let request = Request::builder()
            .header(USER_ID_HEADER, "not-a-uuid")
            .body(())
            .unwrap();
        assert!(extract(request).await.is_err());
    }
}
