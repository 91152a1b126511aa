use std::sync::Arc;

use crate::error::AppResult;
use crate::generation::service::{GenerationOutcome, GenerationRequest};
use domain::generation::{GenerationTask, ImageProvider, TaskId};

#[async_trait::async_trait]
pub trait GenerateUseCase: Send + Sync {
    async fn generate(&self, request: GenerationRequest) -> AppResult<GenerationOutcome>;
}

#[async_trait::async_trait]
pub trait TaskStatusUseCase: Send + Sync {
    /// Performs exactly one provider poll on behalf of the caller and
    /// returns the task in its (possibly terminal) current state.
    async fn task_status(
        &self,
        provider: ImageProvider,
        task_id: &TaskId,
    ) -> AppResult<GenerationTask>;
}

pub type DynGenerateUseCase = Arc<dyn GenerateUseCase>;
pub type DynTaskStatusUseCase = Arc<dyn TaskStatusUseCase>;
