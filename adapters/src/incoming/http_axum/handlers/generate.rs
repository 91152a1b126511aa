use axum::{Json, extract::State};
use axum_valid::Valid;

use domain::generation::ImageProvider;
use recipegen_application::generation::service::GenerationRequest;

use crate::incoming::http_axum::{
    dto::{
        requests::GenerateRequest,
        responses::{ApiResponse, GenerateResponse},
    },
    error_mapper::HttpError,
    extract::UserContext,
};
use crate::shared::app_state::AppState;

#[cfg_attr(feature = "docs", utoipa::path(
    post,
    path = "/api/generate",
    request_body = GenerateRequest,
    responses(
        (status = 200, description = "Generated recipe with updated account and optional image task handle", body = GenerateResponse),
        (status = 400, description = "Unknown image provider"),
        (status = 403, description = "Insufficient credits"),
        (status = 422, description = "Validation failed"),
        (status = 503, description = "Requested provider has no credentials configured")
    ),
    tag = "generation",
    summary = "Generate a recipe",
    description = "Spends one credit, generates the recipe text, and optionally submits an asynchronous image job. Poll /api/task-status for the image result.",
    operation_id = "generate"
))]
pub async fn generate(
    State(state): State<AppState>,
    user: UserContext,
    Valid(Json(request)): Valid<Json<GenerateRequest>>,
) -> Result<Json<ApiResponse<GenerateResponse>>, HttpError> {
    let image_provider = request
        .image_provider
        .as_deref()
        .map(str::parse::<ImageProvider>)
        .transpose()
        .map_err(|err| HttpError(err.into()))?;

    let outcome = state
        .generate_service
        .generate(GenerationRequest {
            user_id: user.user_id,
            is_admin: user.is_admin,
            ingredients: request.ingredients,
            prompt: request.prompt,
            image_provider,
        })
        .await
        .map_err(HttpError)?;

    Ok(Json(ApiResponse::success_with_data(Some(
        GenerateResponse::from(&outcome),
    ))))
}
