use serde::Serialize;
use time::format_description::well_known::Rfc3339;
#[cfg(feature = "docs")]
use utoipa::ToSchema;

use domain::credits::{ClientCreditSnapshot, CreditAccount, CreditTransaction};
use domain::generation::GenerationTask;
use recipegen_application::generation::service::GenerationOutcome;

#[cfg_attr(feature = "docs", derive(ToSchema))]
#[cfg_attr(feature = "docs", schema(
    description = "Standard API response wrapper with success indicator, optional error message, and optional data payload",
    example = json!({ "ok": true, "data": { "balance": 3, "can_generate": true } })
))]
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    #[must_use]
    pub fn success_with_data(data: Option<T>) -> Self {
        Self {
            ok: true,
            error: None,
            data,
        }
    }
}

#[cfg(feature = "docs")]
pub type ApiResponseValue = ApiResponse<serde_json::Value>;

fn format_timestamp(dt: time::OffsetDateTime) -> String {
    dt.format(&Rfc3339).unwrap_or_else(|_| dt.to_string())
}

#[cfg_attr(feature = "docs", derive(ToSchema))]
#[derive(Debug, Clone, Serialize)]
pub struct CreditSnapshotResponse {
    pub balance: i64,
    pub total_earned: i64,
    pub total_spent: i64,
    pub can_generate: bool,
}

impl From<&ClientCreditSnapshot> for CreditSnapshotResponse {
    fn from(snapshot: &ClientCreditSnapshot) -> Self {
        Self {
            balance: snapshot.balance,
            total_earned: snapshot.total_earned,
            total_spent: snapshot.total_spent,
            can_generate: snapshot.can_generate,
        }
    }
}

#[cfg_attr(feature = "docs", derive(ToSchema))]
#[derive(Debug, Clone, Serialize)]
pub struct CreditAccountResponse {
    pub user_id: String,
    pub balance: i64,
    pub total_earned: i64,
    pub total_spent: i64,
    pub updated_at: String,
}

impl From<&CreditAccount> for CreditAccountResponse {
    fn from(account: &CreditAccount) -> Self {
        Self {
            user_id: account.user_id.to_string(),
            balance: account.balance,
            total_earned: account.total_earned,
            total_spent: account.total_spent,
            updated_at: format_timestamp(account.updated_at),
        }
    }
}

#[cfg_attr(feature = "docs", derive(ToSchema))]
#[derive(Debug, Clone, Serialize)]
pub struct TransactionResponse {
    pub id: String,
    pub kind: String,
    pub amount: i64,
    pub reason: String,
    pub created_at: String,
}

impl From<&CreditTransaction> for TransactionResponse {
    fn from(tx: &CreditTransaction) -> Self {
        Self {
            id: tx.id.to_string(),
            kind: tx.kind.as_str().to_string(),
            amount: tx.amount,
            reason: tx.reason.as_str().to_string(),
            created_at: format_timestamp(tx.created_at),
        }
    }
}

#[cfg_attr(feature = "docs", derive(ToSchema))]
#[derive(Debug, Clone, Serialize)]
pub struct ImageTaskResponse {
    pub task_id: String,
    pub provider: String,
}

#[cfg_attr(feature = "docs", derive(ToSchema))]
#[cfg_attr(feature = "docs", schema(
    description = "Generation result: recipe text, updated account, and the image task handle when an image was requested",
    example = json!({
        "title": "Caprese salad",
        "body": "1. Slice the tomatoes...",
        "image_task": { "task_id": "abc-123", "provider": "dashscope" },
        "account": { "user_id": "550e8400-e29b-41d4-a716-446655440000", "balance": 2 }
    })
))]
#[derive(Debug, Clone, Serialize)]
pub struct GenerateResponse {
    pub title: String,
    pub body: String,
    pub account: CreditAccountResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_task: Option<ImageTaskResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_error: Option<String>,
}

impl From<&GenerationOutcome> for GenerateResponse {
    fn from(outcome: &GenerationOutcome) -> Self {
        Self {
            title: outcome.content.title.clone(),
            body: outcome.content.body.clone(),
            account: CreditAccountResponse::from(&outcome.account),
            image_task: outcome.image_task.as_ref().map(|task| ImageTaskResponse {
                task_id: task.task_id.to_string(),
                provider: task.provider.to_string(),
            }),
            image_error: outcome.image_error.clone(),
        }
    }
}

#[cfg_attr(feature = "docs", derive(ToSchema))]
#[cfg_attr(feature = "docs", schema(
    description = "Current state of an image generation task",
    example = json!({
        "task_id": "abc-123",
        "provider": "dashscope",
        "status": "SUCCEEDED",
        "image_url": "https://cdn.example/result.png",
        "images": ["https://cdn.example/result.png"]
    })
))]
#[derive(Debug, Clone, Serialize)]
pub struct TaskStatusResponse {
    pub task_id: String,
    pub provider: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub images: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&GenerationTask> for TaskStatusResponse {
    fn from(task: &GenerationTask) -> Self {
        Self {
            task_id: task.task_id.to_string(),
            provider: task.provider.to_string(),
            status: task.status.to_string(),
            image_url: task.primary_url().map(ToString::to_string),
            images: task.result_urls.clone(),
            error: task.error_message.clone(),
        }
    }
}
