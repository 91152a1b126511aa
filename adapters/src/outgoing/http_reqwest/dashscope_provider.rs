use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use domain::generation::{ImageProvider, TaskId, TaskStatus};
use recipegen_application::{
    error::{AppError, AppResult},
    infrastructure_config::DashscopeConfig,
    ports::outgoing::image_provider::{ImageProviderPort, ImageRequest, ProviderPoll},
};

use super::build_http_client;

const ASYNC_HEADER: &str = "X-DashScope-Async";
const DEFAULT_SIZE: &str = "1024*1024";

pub struct DashscopeProviderAdapter {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: SecretString,
}

impl DashscopeProviderAdapter {
    pub fn new(config: &DashscopeConfig, request_timeout_secs: u64) -> AppResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| AppError::ProviderUnavailable {
                message: "Dashscope API key is not configured".to_string(),
            })?;

        Ok(Self {
            client: build_http_client(request_timeout_secs)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        })
    }
}

#[derive(Debug, Serialize)]
struct SynthesisRequest<'a> {
    model: &'a str,
    input: SynthesisInput<'a>,
    parameters: SynthesisParameters<'a>,
}

#[derive(Debug, Serialize)]
struct SynthesisInput<'a> {
    prompt: &'a str,
}

#[derive(Debug, Serialize)]
struct SynthesisParameters<'a> {
    size: &'a str,
    n: u32,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    output: SubmitOutput,
}

#[derive(Debug, Deserialize)]
struct SubmitOutput {
    task_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TaskResponse {
    pub(crate) output: TaskOutput,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TaskOutput {
    pub(crate) task_status: String,
    #[serde(default)]
    pub(crate) results: Vec<TaskResult>,
    #[serde(default)]
    pub(crate) message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TaskResult {
    #[serde(default)]
    pub(crate) url: Option<String>,
}

/// Unrecognized vocabulary maps to `Pending` so a provider-side status
/// addition degrades to extra polling instead of a hard failure.
pub(crate) fn map_status(raw: &str) -> TaskStatus {
    match raw {
        "PENDING" => TaskStatus::Pending,
        "RUNNING" => TaskStatus::Running,
        "SUCCEEDED" => TaskStatus::Succeeded,
        "FAILED" | "CANCELED" => TaskStatus::Failed,
        _ => TaskStatus::Pending,
    }
}

pub(crate) fn normalize_poll(response: TaskResponse) -> ProviderPoll {
    let status = map_status(&response.output.task_status);
    let result_urls = response
        .output
        .results
        .into_iter()
        .filter_map(|result| result.url)
        .collect();
    let error_message = if status == TaskStatus::Failed {
        Some(
            response
                .output
                .message
                .unwrap_or_else(|| "Image generation failed".to_string()),
        )
    } else {
        None
    };

    ProviderPoll {
        status,
        result_urls,
        error_message,
    }
}

#[async_trait::async_trait]
impl ImageProviderPort for DashscopeProviderAdapter {
    fn provider(&self) -> ImageProvider {
        ImageProvider::Dashscope
    }

    #[instrument(skip(self, request))]
    async fn submit(&self, request: &ImageRequest) -> AppResult<TaskId> {
        let url = format!(
            "{}/services/aigc/text2image/image-synthesis",
            self.base_url
        );
        let body = SynthesisRequest {
            model: &self.model,
            input: SynthesisInput {
                prompt: &request.prompt,
            },
            parameters: SynthesisParameters {
                size: request.size.as_deref().unwrap_or(DEFAULT_SIZE),
                n: 1,
            },
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .header(ASYNC_HEADER, "enable")
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::ProviderUnavailable {
                message: format!("Dashscope submit failed: {}", e),
            })?;

        let status = response.status();
        if status.is_client_error() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::ProviderRejected {
                message: format!("Dashscope rejected submission ({}): {}", status, detail),
            });
        }
        if !status.is_success() {
            return Err(AppError::ProviderUnavailable {
                message: format!("Dashscope returned {}", status),
            });
        }

        let parsed: SubmitResponse =
            response
                .json()
                .await
                .map_err(|e| AppError::ProviderUnavailable {
                    message: format!("Dashscope submit response unreadable: {}", e),
                })?;

        debug!("Dashscope accepted task {}", parsed.output.task_id);
        Ok(TaskId::new(parsed.output.task_id))
    }

    #[instrument(skip(self))]
    async fn poll_status(&self, task_id: &TaskId) -> AppResult<ProviderPoll> {
        let url = format!("{}/tasks/{}", self.base_url, task_id);

        let response = self
            .client
            .get(&url)
            .bearer_auth(self.api_key.expose_secret())
            .send()
            .await
            .map_err(|e| AppError::PollError {
                message: format!("Dashscope poll failed: {}", e),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::PollError {
                message: format!("Dashscope poll returned {}", status),
            });
        }

        let parsed: TaskResponse = response.json().await.map_err(|e| AppError::PollError {
            message: format!("Dashscope poll response unreadable: {}", e),
        })?;

        Ok(normalize_poll(parsed))
    }
}
