use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use domain::generation::{ImageProvider, TaskId, TaskStatus};
use recipegen_application::{
    error::{AppError, AppResult},
    infrastructure_config::ReplicateConfig,
    ports::outgoing::image_provider::{ImageProviderPort, ImageRequest, ProviderPoll},
};

use super::build_http_client;

pub struct ReplicateProviderAdapter {
    client: reqwest::Client,
    base_url: String,
    model_version: String,
    api_token: SecretString,
}

impl ReplicateProviderAdapter {
    pub fn new(config: &ReplicateConfig, request_timeout_secs: u64) -> AppResult<Self> {
        let api_token = config
            .api_token
            .clone()
            .ok_or_else(|| AppError::ProviderUnavailable {
                message: "Replicate API token is not configured".to_string(),
            })?;

        Ok(Self {
            client: build_http_client(request_timeout_secs)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model_version: config.model_version.clone(),
            api_token,
        })
    }
}

#[derive(Debug, Serialize)]
struct PredictionRequest<'a> {
    input: PredictionInput<'a>,
}

#[derive(Debug, Serialize)]
struct PredictionInput<'a> {
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PredictionResponse {
    pub(crate) id: String,
    pub(crate) status: String,
    #[serde(default)]
    pub(crate) output: Option<Value>,
    #[serde(default)]
    pub(crate) error: Option<String>,
}

/// Replicate's lifecycle vocabulary. `canceled` is terminal on their
/// side with no artifact, so it collapses into `Failed`. Anything
/// unrecognized fails open to `Pending`.
pub(crate) fn map_status(raw: &str) -> TaskStatus {
    match raw {
        "starting" => TaskStatus::Pending,
        "processing" => TaskStatus::Running,
        "succeeded" => TaskStatus::Succeeded,
        "failed" | "canceled" => TaskStatus::Failed,
        _ => TaskStatus::Pending,
    }
}

// `output` is a single URL string for single-image models and an array
// of URL strings otherwise.
fn collect_output_urls(output: Option<Value>) -> Vec<String> {
    match output {
        Some(Value::String(url)) => vec![url],
        Some(Value::Array(values)) => values
            .into_iter()
            .filter_map(|value| match value {
                Value::String(url) => Some(url),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

pub(crate) fn normalize_poll(response: PredictionResponse) -> ProviderPoll {
    let status = map_status(&response.status);
    let result_urls = collect_output_urls(response.output);
    let error_message = if status == TaskStatus::Failed {
        Some(
            response
                .error
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
impl ImageProviderPort for ReplicateProviderAdapter {
    fn provider(&self) -> ImageProvider {
        ImageProvider::Replicate
    }

    #[instrument(skip(self, request))]
    async fn submit(&self, request: &ImageRequest) -> AppResult<TaskId> {
        let url = format!(
            "{}/models/{}/predictions",
            self.base_url, self.model_version
        );
        let body = PredictionRequest {
            input: PredictionInput {
                prompt: &request.prompt,
            },
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_token.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::ProviderUnavailable {
                message: format!("Replicate submit failed: {}", e),
            })?;

        let status = response.status();
        if status.is_client_error() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::ProviderRejected {
                message: format!("Replicate rejected submission ({}): {}", status, detail),
            });
        }
        if !status.is_success() {
            return Err(AppError::ProviderUnavailable {
                message: format!("Replicate returned {}", status),
            });
        }

        let parsed: PredictionResponse =
            response
                .json()
                .await
                .map_err(|e| AppError::ProviderUnavailable {
                    message: format!("Replicate submit response unreadable: {}", e),
                })?;

        debug!("Replicate accepted prediction {}", parsed.id);
        Ok(TaskId::new(parsed.id))
    }

    #[instrument(skip(self))]
    async fn poll_status(&self, task_id: &TaskId) -> AppResult<ProviderPoll> {
        let url = format!("{}/predictions/{}", self.base_url, task_id);

        let response = self
            .client
            .get(&url)
            .bearer_auth(self.api_token.expose_secret())
            .send()
            .await
            .map_err(|e| AppError::PollError {
                message: format!("Replicate poll failed: {}", e),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::PollError {
                message: format!("Replicate poll returned {}", status),
            });
        }

        let parsed: PredictionResponse =
            response.json().await.map_err(|e| AppError::PollError {
                message: format!("Replicate poll response unreadable: {}", e),
            })?;

        Ok(normalize_poll(parsed))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_vocabulary_normalizes() {
        assert_eq!(map_status("starting"), TaskStatus::Pending);
        assert_eq!(map_status("processing"), TaskStatus::Running);
        assert_eq!(map_status("succeeded"), TaskStatus::Succeeded);
        assert_eq!(map_status("failed"), TaskStatus::Failed);
    }

    #[test]
    fn canceled_collapses_into_failed() {
        assert_eq!(map_status("canceled"), TaskStatus::Failed);
    }

    #[test]
    fn unknown_status_fails_open_to_pending() {
        assert_eq!(map_status("queued-v2"), TaskStatus::Pending);
    }

    #[test]
    fn string_output_becomes_single_url() {
        let response: PredictionResponse = serde_json::from_value(serde_json::json!({
            "id": "pred-1",
            "status": "succeeded",
            "output": "https://replicate.delivery/out.png"
        }))
        .unwrap();

        let poll = normalize_poll(response);

        assert_eq!(poll.status, TaskStatus::Succeeded);
        assert_eq!(
            poll.result_urls,
            vec!["https://replicate.delivery/out.png".to_string()]
        );
    }

    #[test]
    fn array_output_keeps_order() {
        let response: PredictionResponse = serde_json::from_value(serde_json::json!({
            "id": "pred-2",
            "status": "succeeded",
            "output": ["https://replicate.delivery/1.png", "https://replicate.delivery/2.png"]
        }))
        .unwrap();

        let poll = normalize_poll(response);

        assert_eq!(poll.result_urls.len(), 2);
        assert_eq!(
            poll.result_urls.first().map(String::as_str),
            Some("https://replicate.delivery/1.png")
        );
    }

    #[test]
    fn failed_poll_carries_provider_error() {
        let response: PredictionResponse = serde_json::from_value(serde_json::json!({
            "id": "pred-3",
            "status": "failed",
            "error": "NSFW content detected"
        }))
        .unwrap();

        let poll = normalize_poll(response);

        assert_eq!(poll.status, TaskStatus::Failed);
        assert_eq!(poll.error_message.as_deref(), Some("NSFW content detected"));
    }
}
