use std::sync::Arc;
use time::OffsetDateTime;
use tracing::{debug, instrument, warn};

use domain::credits::{CreditAccount, TransactionReason};
use domain::generation::{GenerationTask, ImageProvider, TaskId};
use domain::user::UserId;

use crate::{
    error::{AppError, AppResult},
    ports::{
        incoming::generation::{GenerateUseCase, TaskStatusUseCase},
        outgoing::{
            content_generator::{ContentRequest, DynContentGeneratorPort, GeneratedContent},
            image_provider::ImageRequest,
        },
    },
};

use super::{polling::TaskPoller, registry::ProviderRegistry};
use crate::credits::service::CreditLedgerService;

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub user_id: UserId,
    pub is_admin: bool,
    pub ingredients: Vec<String>,
    pub prompt: Option<String>,
    pub image_provider: Option<ImageProvider>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedImageTask {
    pub task_id: TaskId,
    pub provider: ImageProvider,
}

#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub content: GeneratedContent,
    pub account: CreditAccount,
    pub image_task: Option<SubmittedImageTask>,
    pub image_error: Option<String>,
}

/// Sequences ledger debit, content generation, and the optional image
/// submission as one logical unit, with compensation when a paid-for
/// stage fails synchronously.
pub struct GenerationService {
    ledger: Arc<CreditLedgerService>,
    content_generator: DynContentGeneratorPort,
    providers: Arc<ProviderRegistry>,
    poller: Arc<TaskPoller>,
}

impl GenerationService {
    pub fn new(
        ledger: Arc<CreditLedgerService>,
        content_generator: DynContentGeneratorPort,
        providers: Arc<ProviderRegistry>,
        poller: Arc<TaskPoller>,
    ) -> Arc<Self> {
        Arc::new(Self {
            ledger,
            content_generator,
            providers,
            poller,
        })
    }

    #[instrument(skip(self, request), fields(user_id = %request.user_id))]
    pub async fn generate(&self, request: GenerationRequest) -> AppResult<GenerationOutcome> {
        let cost = self.ledger.settings().generation_cost;

        if !self
            .ledger
            .can_consume(&request.user_id, cost, request.is_admin)
            .await?
        {
            return Err(AppError::InsufficientCredits {
                message: format!("Generation requires {} credit(s)", cost),
            });
        }

        // Content first: a failed upstream generation must not charge.
        let content = self
            .content_generator
            .generate_content(&ContentRequest {
                ingredients: request.ingredients.clone(),
                prompt: request.prompt.clone(),
            })
            .await?;

        // Optimistic decrement for session responsiveness; the spend
        // below reconciles with the authoritative row.
        self.ledger
            .projections()
            .apply_optimistic_spend(&request.user_id, cost);

        // Re-checked atomically: losing the race here fails the whole
        // request and the generated content is discarded.
        let account = self
            .ledger
            .spend(&request.user_id, cost, request.is_admin)
            .await?;

        let (image_task, image_error, account) = match request.image_provider {
            Some(provider) => {
                self.submit_image(&request, provider, &content, account, cost)
                    .await?
            }
            None => (None, None, account),
        };

        debug!(
            "Generation complete for user {} (image task: {:?})",
            request.user_id,
            image_task.as_ref().map(|task| task.task_id.as_str())
        );

        Ok(GenerationOutcome {
            content,
            account,
            image_task,
            image_error,
        })
    }

    /// Best-effort image stage. A synchronous submission failure
    /// refunds the spent credit and still delivers the text result;
    /// an asynchronous FAILED discovered while polling does not.
    async fn submit_image(
        &self,
        request: &GenerationRequest,
        provider: ImageProvider,
        content: &GeneratedContent,
        account: CreditAccount,
        cost: i64,
    ) -> AppResult<(Option<SubmittedImageTask>, Option<String>, CreditAccount)> {
        let adapter = Arc::clone(self.providers.get(provider)?);

        let image_request = ImageRequest {
            prompt: content.image_prompt.clone(),
            size: None,
        };

        match adapter.submit(&image_request).await {
            Ok(task_id) => {
                self.poller.track(GenerationTask::new(
                    task_id.clone(),
                    provider,
                    OffsetDateTime::now_utc(),
                ));
                Ok((
                    Some(SubmittedImageTask { task_id, provider }),
                    None,
                    account,
                ))
            }
            Err(err) => {
                warn!(
                    "Image submission to {} failed for user {}: {}",
                    provider, request.user_id, err
                );

                // Admin spends are net-zero grant+spend pairs; there
                // is nothing to give back.
                let account = if request.is_admin {
                    account
                } else {
                    self.ledger
                        .earn(&request.user_id, cost, TransactionReason::Refund)
                        .await?
                };

                Ok((None, Some(err.to_string()), account))
            }
        }
    }

    pub async fn task_status(
        &self,
        provider: ImageProvider,
        task_id: &TaskId,
    ) -> AppResult<GenerationTask> {
        self.poller.poll(provider, task_id).await
    }
}

#[async_trait::async_trait]
impl GenerateUseCase for GenerationService {
    async fn generate(&self, request: GenerationRequest) -> AppResult<GenerationOutcome> {
        self.generate(request).await
    }
}

#[async_trait::async_trait]
impl TaskStatusUseCase for GenerationService {
    async fn task_status(
        &self,
        provider: ImageProvider,
        task_id: &TaskId,
    ) -> AppResult<GenerationTask> {
        self.task_status(provider, task_id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::config::{CreditSettings, PollSettings};
    use crate::credits::projection::ProjectionRegistry;
    use crate::ports::outgoing::content_generator::ContentGeneratorPort;
    use crate::ports::outgoing::image_provider::{
        DynImageProviderPort, ImageProviderPort, ProviderPoll,
    };
    use crate::test_support::InProcessStore;
    use domain::credits::TransactionKind;
    use domain::generation::TaskStatus;

    struct StubContentGenerator {
        calls: AtomicUsize,
        fail: bool,
    }

    impl StubContentGenerator {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail,
            })
        }
    }

    #[async_trait::async_trait]
    impl ContentGeneratorPort for StubContentGenerator {
        async fn generate_content(
            &self,
            _request: &ContentRequest,
        ) -> AppResult<GeneratedContent> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(AppError::ExternalServiceError {
                    message: "content generator down".to_string(),
                });
            }
            Ok(GeneratedContent {
                title: "Tomato soup".to_string(),
                body: "1. Chop tomatoes".to_string(),
                image_prompt: "rustic tomato soup, overhead shot".to_string(),
            })
        }
    }

    struct StubProvider {
        provider: ImageProvider,
        fail_submit: bool,
    }

    #[async_trait::async_trait]
    impl ImageProviderPort for StubProvider {
        fn provider(&self) -> ImageProvider {
            self.provider
        }

        async fn submit(&self, _request: &ImageRequest) -> AppResult<TaskId> {
            if self.fail_submit {
                return Err(AppError::ProviderUnavailable {
                    message: "credential missing".to_string(),
                });
            }
            Ok(TaskId::new("submitted-1"))
        }

        async fn poll_status(&self, _task_id: &TaskId) -> AppResult<ProviderPoll> {
            Ok(ProviderPoll {
                status: TaskStatus::Running,
                result_urls: Vec::new(),
                error_message: None,
            })
        }
    }

    struct Fixture {
        ledger: Arc<CreditLedgerService>,
        service: Arc<GenerationService>,
        content: Arc<StubContentGenerator>,
    }

    fn fixture(initial_grant: i64, content_fails: bool, submit_fails: bool) -> Fixture {
        let ledger = CreditLedgerService::new(
            Arc::new(InProcessStore::default()),
            Arc::new(ProjectionRegistry::new(1)),
            CreditSettings {
                initial_grant,
                generation_cost: 1,
                transaction_page_size: 50,
            },
        );
        let content = StubContentGenerator::new(content_fails);
        let providers = Arc::new(ProviderRegistry::new(vec![
            Arc::new(StubProvider {
                provider: ImageProvider::Dashscope,
                fail_submit: submit_fails,
            }) as DynImageProviderPort,
        ]));
        let poller = TaskPoller::new(
            Arc::clone(&providers),
            PollSettings {
                poll_timeout_secs: 300,
            },
        );
        let service = GenerationService::new(
            Arc::clone(&ledger),
            Arc::clone(&content) as DynContentGeneratorPort,
            providers,
            poller,
        );
        Fixture {
            ledger,
            service,
            content,
        }
    }

    fn request(user_id: &UserId, provider: Option<ImageProvider>) -> GenerationRequest {
        GenerationRequest {
            user_id: user_id.clone(),
            is_admin: false,
            ingredients: vec!["tomato".to_string(), "basil".to_string()],
            prompt: None,
            image_provider: provider,
        }
    }

    #[tokio::test]
    async fn text_only_generation_spends_exactly_one_credit() {
        let fixture = fixture(2, false, false);
        let user = UserId::new();

        let outcome = fixture.service.generate(request(&user, None)).await.unwrap();

        assert_eq!(outcome.content.title, "Tomato soup");
        assert_eq!(outcome.account.balance, 1);
        assert!(outcome.image_task.is_none());

        let spends = fixture
            .ledger
            .get_transactions(&user)
            .await
            .unwrap()
            .into_iter()
            .filter(|tx| tx.kind == TransactionKind::Spend)
            .count();
        assert_eq!(spends, 1);
    }

    #[tokio::test]
    async fn broke_user_is_rejected_before_content_generation() {
        let fixture = fixture(0, false, false);
        let user = UserId::new();

        let err = fixture
            .service
            .generate(request(&user, None))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InsufficientCredits { .. }));
        assert_eq!(fixture.content.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn content_failure_does_not_charge() {
        let fixture = fixture(1, true, false);
        let user = UserId::new();

        let err = fixture
            .service
            .generate(request(&user, None))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::ExternalServiceError { .. }));
        let snapshot = fixture.ledger.get_snapshot(&user, false).await.unwrap();
        assert_eq!(snapshot.balance, 1);
        assert_eq!(snapshot.total_spent, 0);
    }

    #[tokio::test]
    async fn image_request_returns_task_handle() {
        let fixture = fixture(1, false, false);
        let user = UserId::new();

        let outcome = fixture
            .service
            .generate(request(&user, Some(ImageProvider::Dashscope)))
            .await
            .unwrap();

        let task = outcome.image_task.unwrap();
        assert_eq!(task.provider, ImageProvider::Dashscope);

        // The submitted task is immediately pollable.
        let polled = fixture
            .service
            .task_status(task.provider, &task.task_id)
            .await
            .unwrap();
        assert_eq!(polled.status, TaskStatus::Running);
    }

    #[tokio::test]
    async fn failed_image_submission_refunds_and_keeps_content() {
        let fixture = fixture(1, false, true);
        let user = UserId::new();

        let outcome = fixture
            .service
            .generate(request(&user, Some(ImageProvider::Dashscope)))
            .await
            .unwrap();

        assert!(outcome.image_task.is_none());
        assert!(outcome.image_error.is_some());
        assert_eq!(outcome.content.title, "Tomato soup");
        assert_eq!(outcome.account.balance, 1);
        assert_eq!(outcome.account.total_spent, 1);
        assert_eq!(outcome.account.total_earned, 2);

        let transactions = fixture.ledger.get_transactions(&user).await.unwrap();
        assert!(transactions
            .iter()
            .any(|tx| tx.reason == TransactionReason::Refund));
    }

    #[tokio::test]
    async fn admin_submission_failure_skips_refund() {
        let fixture = fixture(0, false, true);
        let user = UserId::new();

        let mut admin_request = request(&user, Some(ImageProvider::Dashscope));
        admin_request.is_admin = true;

        let outcome = fixture.service.generate(admin_request).await.unwrap();

        assert!(outcome.image_error.is_some());
        assert_eq!(outcome.account.balance, 0);

        let refunds = fixture
            .ledger
            .get_transactions(&user)
            .await
            .unwrap()
            .into_iter()
            .filter(|tx| tx.reason == TransactionReason::Refund)
            .count();
        assert_eq!(refunds, 0);
    }

    #[tokio::test]
    async fn unregistered_provider_is_reported_unavailable() {
        let fixture = fixture(1, false, false);
        let user = UserId::new();

        let err = fixture
            .service
            .generate(request(&user, Some(ImageProvider::Replicate)))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::ProviderUnavailable { .. }));
    }
}
