use std::sync::Arc;

use crate::error::AppResult;
use domain::generation::{ImageProvider, TaskId, TaskStatus};

#[derive(Debug, Clone)]
pub struct ImageRequest {
    pub prompt: String,
    pub size: Option<String>,
}

/// One normalized provider poll. `result_urls` is ordered; the first
/// element is the primary artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderPoll {
    pub status: TaskStatus,
    pub result_urls: Vec<String>,
    pub error_message: Option<String>,
}

#[async_trait::async_trait]
pub trait ImageProviderPort: Send + Sync {
    fn provider(&self) -> ImageProvider;

    async fn submit(&self, request: &ImageRequest) -> AppResult<TaskId>;

    async fn poll_status(&self, task_id: &TaskId) -> AppResult<ProviderPoll>;
}

pub type DynImageProviderPort = Arc<dyn ImageProviderPort>;
