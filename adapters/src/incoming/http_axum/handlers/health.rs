use axum::{Json, extract::State};

#[cfg(feature = "docs")]
use crate::incoming::http_axum::dto::responses::ApiResponseValue;
use crate::incoming::http_axum::dto::responses::ApiResponse;
use crate::shared::app_state::AppState;

#[cfg_attr(feature = "docs", utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check successful with effective configuration", body = ApiResponseValue,
         example = json!({
             "ok": true,
             "data": {
                 "providers": { "dashscope": true, "replicate": false },
                 "credits": { "initial_grant": 3, "generation_cost": 1 }
             }
         })
        )
    ),
    tag = "system",
    summary = "System health check",
    operation_id = "health_check"
))]
pub async fn health_check(State(state): State<AppState>) -> Json<ApiResponse<serde_json::Value>> {
    Json(ApiResponse::success_with_data(Some(serde_json::json!({
        "providers": {
            "dashscope": state.config.providers.dashscope.is_configured(),
            "replicate": state.config.providers.replicate.is_configured(),
        },
        "credits": {
            "initial_grant": state.config.credits.initial_grant,
            "generation_cost": state.config.credits.generation_cost,
        },
        "environment": state.config.environment.env,
    }))))
}
