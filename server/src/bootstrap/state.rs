use sqlx::{PgPool, postgres::PgPoolOptions};
use std::sync::Arc;
use tracing::info;

use recipegen_adapters::outgoing::{
    http_reqwest::{
        content_generator_http::HttpContentGeneratorAdapter,
        dashscope_provider::DashscopeProviderAdapter, replicate_provider::ReplicateProviderAdapter,
    },
    memory::credit_store_memory::MemoryCreditStoreAdapter,
    postgres_sqlx::credit_store_postgres::PostgresCreditStoreAdapter,
};
use recipegen_adapters::shared::app_state::AppState as AdaptersAppState;
use recipegen_application::{
    config::{CreditSettings, PollSettings},
    credits::{projection::ProjectionRegistry, service::CreditLedgerService},
    error::AppError,
    generation::{polling::TaskPoller, registry::ProviderRegistry, service::GenerationService},
    infrastructure_config::{Config, CreditStoreBackend},
    ports::{
        incoming::{
            credits::{DynCreditsMutationUseCase, DynCreditsQueryUseCase},
            generation::{DynGenerateUseCase, DynTaskStatusUseCase},
        },
        outgoing::{
            content_generator::DynContentGeneratorPort, credit_store::DynCreditStorePort,
            image_provider::DynImageProviderPort,
        },
    },
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    db_pool: Option<PgPool>,
    pub ledger_service: Arc<CreditLedgerService>,
    pub generation_service: Arc<GenerationService>,
}

impl AppState {
    pub async fn new(config: Config) -> Result<Self, AppError> {
        let config = Arc::new(config);

        let (credit_store, db_pool) = Self::create_credit_store(&config).await?;
        let ledger_service = Self::create_ledger_service(&config, credit_store);
        let generation_service = Self::create_generation_service(&config, &ledger_service)?;

        Ok(Self {
            config,
            db_pool,
            ledger_service,
            generation_service,
        })
    }

    async fn create_credit_store(
        config: &Config,
    ) -> Result<(DynCreditStorePort, Option<PgPool>), AppError> {
        match config.credits.store_backend {
            CreditStoreBackend::Memory => {
                info!("Using in-memory credit store (non-durable)");
                Ok((Arc::new(MemoryCreditStoreAdapter::new()), None))
            }
            CreditStoreBackend::Postgres => {
                let pool = PgPoolOptions::new()
                    .max_connections(config.db.pool_size)
                    .connect(config.db.database_url())
                    .await
                    .map_err(|e| AppError::DatabaseError {
                        message: format!("Failed to connect to database: {}", e),
                    })?;

                sqlx::migrate!("../migrations").run(&pool).await.map_err(|e| {
                    AppError::DatabaseError {
                        message: format!("Failed to run migrations: {}", e),
                    }
                })?;

                let store = Arc::new(PostgresCreditStoreAdapter::new(
                    pool.clone(),
                    config.db.query_timeout_secs,
                ));
                Ok((store, Some(pool)))
            }
        }
    }

    fn create_ledger_service(
        config: &Config,
        credit_store: DynCreditStorePort,
    ) -> Arc<CreditLedgerService> {
        let projections = Arc::new(ProjectionRegistry::new(config.credits.generation_cost));
        CreditLedgerService::new(
            credit_store,
            projections,
            CreditSettings {
                initial_grant: config.credits.initial_grant,
                generation_cost: config.credits.generation_cost,
                transaction_page_size: config.credits.transaction_page_size,
            },
        )
    }

    fn create_generation_service(
        config: &Config,
        ledger_service: &Arc<CreditLedgerService>,
    ) -> Result<Arc<GenerationService>, AppError> {
        let providers = Self::create_provider_registry(config)?;
        let poller = TaskPoller::new(
            Arc::clone(&providers),
            PollSettings {
                poll_timeout_secs: config.providers.poll_timeout_secs,
            },
        );
        let content_generator: DynContentGeneratorPort =
            Arc::new(HttpContentGeneratorAdapter::new(&config.content)?);

        Ok(GenerationService::new(
            Arc::clone(ledger_service),
            content_generator,
            providers,
            poller,
        ))
    }

    // Only providers with credentials are registered; requests naming
    // an unregistered provider fail with 503 instead of at submit.
    fn create_provider_registry(config: &Config) -> Result<Arc<ProviderRegistry>, AppError> {
        let mut providers: Vec<DynImageProviderPort> = Vec::new();

        if config.providers.dashscope.is_configured() {
            providers.push(Arc::new(DashscopeProviderAdapter::new(
                &config.providers.dashscope,
                config.providers.request_timeout_secs,
            )?));
        }

        if config.providers.replicate.is_configured() {
            providers.push(Arc::new(ReplicateProviderAdapter::new(
                &config.providers.replicate,
                config.providers.request_timeout_secs,
            )?));
        }

        let registry = ProviderRegistry::new(providers);
        info!("Registered image providers: {:?}", registry.registered());
        Ok(Arc::new(registry))
    }

    pub fn db_pool(&self) -> Option<&PgPool> {
        self.db_pool.as_ref()
    }

    pub fn to_adapters_state(self) -> AdaptersAppState {
        AdaptersAppState::new(
            self.config,
            Arc::clone(&self.ledger_service) as DynCreditsQueryUseCase,
            Arc::clone(&self.ledger_service) as DynCreditsMutationUseCase,
            Arc::clone(&self.generation_service) as DynGenerateUseCase,
            self.generation_service as DynTaskStatusUseCase,
        )
    }
}
