use axum::{Json, extract::State};
use axum_valid::Valid;

use domain::credits::TransactionReason;
use recipegen_application::error::AppError;

use crate::incoming::http_axum::{
    dto::{
        requests::{CreditAction, CreditMutationRequest},
        responses::{
            ApiResponse, CreditAccountResponse, CreditSnapshotResponse, TransactionResponse,
        },
    },
    error_mapper::HttpError,
    extract::UserContext,
};
use crate::shared::app_state::AppState;

#[cfg_attr(feature = "docs", utoipa::path(
    get,
    path = "/api/credits",
    responses(
        (status = 200, description = "Current credit snapshot", body = CreditSnapshotResponse),
        (status = 422, description = "Missing or malformed identity headers")
    ),
    tag = "credits",
    summary = "Get credit balance",
    description = "Authoritative balance read. Lazily creates the account with the configured initial grant on first contact.",
    operation_id = "get_credits"
))]
pub async fn get_credits(
    State(state): State<AppState>,
    user: UserContext,
) -> Result<Json<ApiResponse<CreditSnapshotResponse>>, HttpError> {
    let snapshot = state
        .credits_query_service
        .get_snapshot(&user.user_id, user.is_admin)
        .await
        .map_err(HttpError)?;

    Ok(Json(ApiResponse::success_with_data(Some(
        CreditSnapshotResponse::from(&snapshot),
    ))))
}

#[cfg_attr(feature = "docs", utoipa::path(
    post,
    path = "/api/credits",
    request_body = CreditMutationRequest,
    responses(
        (status = 200, description = "Updated account after the mutation", body = CreditAccountResponse),
        (status = 403, description = "Insufficient credits, or earn attempted without the admin role"),
        (status = 422, description = "Validation failed")
    ),
    tag = "credits",
    summary = "Mutate credits",
    description = "Spends or grants credits. Grants are restricted to admin callers.",
    operation_id = "mutate_credits"
))]
pub async fn mutate_credits(
    State(state): State<AppState>,
    user: UserContext,
    Valid(Json(request)): Valid<Json<CreditMutationRequest>>,
) -> Result<Json<ApiResponse<CreditAccountResponse>>, HttpError> {
    let account = match request.action {
        CreditAction::Spend => {
            state
                .credits_mutation_service
                .spend(&user.user_id, request.amount, user.is_admin)
                .await
        }
        CreditAction::Earn => {
            if !user.is_admin {
                return Err(HttpError(AppError::Forbidden));
            }
            state
                .credits_mutation_service
                .earn(&user.user_id, request.amount, TransactionReason::AdminGrant)
                .await
        }
    }
    .map_err(HttpError)?;

    Ok(Json(ApiResponse::success_with_data(Some(
        CreditAccountResponse::from(&account),
    ))))
}

#[cfg_attr(feature = "docs", utoipa::path(
    get,
    path = "/api/credits/transactions",
    responses(
        (status = 200, description = "Most recent credit transactions, newest first", body = [TransactionResponse])
    ),
    tag = "credits",
    summary = "List credit transactions",
    operation_id = "get_credit_transactions"
))]
pub async fn get_transactions(
    State(state): State<AppState>,
    user: UserContext,
) -> Result<Json<ApiResponse<Vec<TransactionResponse>>>, HttpError> {
    let transactions = state
        .credits_query_service
        .get_transactions(&user.user_id)
        .await
        .map_err(HttpError)?;

    Ok(Json(ApiResponse::success_with_data(Some(
        transactions.iter().map(TransactionResponse::from).collect(),
    ))))
}
