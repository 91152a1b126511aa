use std::sync::Arc;

use recipegen_application::infrastructure_config::Config;
use recipegen_application::ports::incoming::{
    credits::{DynCreditsMutationUseCase, DynCreditsQueryUseCase},
    generation::{DynGenerateUseCase, DynTaskStatusUseCase},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub credits_query_service: DynCreditsQueryUseCase,
    pub credits_mutation_service: DynCreditsMutationUseCase,
    pub generate_service: DynGenerateUseCase,
    pub task_status_service: DynTaskStatusUseCase,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        credits_query_service: DynCreditsQueryUseCase,
        credits_mutation_service: DynCreditsMutationUseCase,
        generate_service: DynGenerateUseCase,
        task_status_service: DynTaskStatusUseCase,
    ) -> Self {
        Self {
            config,
            credits_query_service,
            credits_mutation_service,
            generate_service,
            task_status_service,
        }
    }
}
