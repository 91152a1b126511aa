use axum::{
    Router,
    routing::{get, post},
};
#[cfg(feature = "docs")]
use utoipa::OpenApi;
#[cfg(feature = "docs")]
use utoipa_swagger_ui::SwaggerUi;

use crate::incoming::http_axum::handlers::{
    credits::{get_credits, get_transactions, mutate_credits},
    generate::generate,
    health::health_check,
    task_status::task_status,
};
use crate::shared::app_state::AppState;

#[cfg(feature = "docs")]
use crate::incoming::http_axum::docs::ApiDoc;

pub fn build_application_router() -> Router<AppState> {
    let api_routes = Router::new()
        .route("/credits", get(get_credits).post(mutate_credits))
        .route("/credits/transactions", get(get_transactions))
        .route("/generate", post(generate))
        .route("/task-status", get(task_status));

    let router = Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes);

    #[cfg(feature = "docs")]
    {
        router.merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
    }

    #[cfg(not(feature = "docs"))]
    {
        router
    }
}
