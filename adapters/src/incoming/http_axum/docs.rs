use crate::incoming::http_axum::{dto, handlers};
use dto::requests::{CreditAction, CreditMutationRequest, GenerateRequest, TaskStatusQuery};
use dto::responses::{
    ApiResponseValue, CreditAccountResponse, CreditSnapshotResponse, GenerateResponse,
    ImageTaskResponse, TaskStatusResponse, TransactionResponse,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health_check,
        handlers::credits::get_credits,
        handlers::credits::mutate_credits,
        handlers::credits::get_transactions,
        handlers::generate::generate,
        handlers::task_status::task_status,
    ),
    components(schemas(
        GenerateRequest,
        CreditMutationRequest,
        CreditAction,
        TaskStatusQuery,
        ApiResponseValue,
        CreditSnapshotResponse,
        CreditAccountResponse,
        TransactionResponse,
        GenerateResponse,
        ImageTaskResponse,
        TaskStatusResponse,
    )),
    tags(
        (name = "credits", description = "Credit ledger operations"),
        (name = "generation", description = "Recipe and image generation"),
        (name = "system", description = "Health and diagnostics")
    ),
    info(
        title = "RecipeGen Backend API",
        description = "Credit-gated AI recipe and image generation service"
    )
)]
pub struct ApiDoc;
