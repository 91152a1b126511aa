use axum::{
    Json,
    extract::{Query, State},
};
use axum_valid::Valid;

use domain::generation::{ImageProvider, TaskId};

use crate::incoming::http_axum::{
    dto::{
        requests::TaskStatusQuery,
        responses::{ApiResponse, TaskStatusResponse},
    },
    error_mapper::HttpError,
};
use crate::shared::app_state::AppState;

#[cfg_attr(feature = "docs", utoipa::path(
    get,
    path = "/api/task-status",
    params(
        ("provider" = String, Query, description = "Provider that owns the task (dashscope or replicate)"),
        ("task_id" = String, Query, description = "Provider task id returned by /api/generate")
    ),
    responses(
        (status = 200, description = "Current task state after one provider poll", body = TaskStatusResponse),
        (status = 400, description = "Unknown provider"),
        (status = 502, description = "Provider could not be reached; retryable"),
        (status = 503, description = "Provider has no credentials configured")
    ),
    tag = "generation",
    summary = "Poll an image task",
    description = "Performs one provider poll on behalf of the caller. Terminal tasks are answered from the registry without contacting the provider.",
    operation_id = "task_status"
))]
pub async fn task_status(
    State(state): State<AppState>,
    Valid(Query(query)): Valid<Query<TaskStatusQuery>>,
) -> Result<Json<ApiResponse<TaskStatusResponse>>, HttpError> {
    let provider = query
        .provider
        .parse::<ImageProvider>()
        .map_err(|err| HttpError(err.into()))?;

    let task = state
        .task_status_service
        .task_status(provider, &TaskId::new(query.task_id))
        .await
        .map_err(HttpError)?;

    Ok(Json(ApiResponse::success_with_data(Some(
        TaskStatusResponse::from(&task),
    ))))
}
