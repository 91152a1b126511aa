use serde::{Deserialize, Serialize};
use tracing::instrument;

use recipegen_application::{
    error::{AppError, AppResult},
    infrastructure_config::ContentGeneratorConfig,
    ports::outgoing::content_generator::{ContentGeneratorPort, ContentRequest, GeneratedContent},
};

use super::build_http_client;

/// Calls the recipe text model service over HTTP.
pub struct HttpContentGeneratorAdapter {
    client: reqwest::Client,
    base_url: String,
}

impl HttpContentGeneratorAdapter {
    pub fn new(config: &ContentGeneratorConfig) -> AppResult<Self> {
        Ok(Self {
            client: build_http_client(config.request_timeout_secs)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[derive(Debug, Serialize)]
struct GenerateBody<'a> {
    ingredients: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    prompt: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct GenerateReply {
    title: String,
    body: String,
    image_prompt: String,
}

#[async_trait::async_trait]
impl ContentGeneratorPort for HttpContentGeneratorAdapter {
    #[instrument(skip(self, request))]
    async fn generate_content(&self, request: &ContentRequest) -> AppResult<GeneratedContent> {
        let url = format!("{}/generate", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&GenerateBody {
                ingredients: &request.ingredients,
                prompt: request.prompt.as_deref(),
            })
            .send()
            .await
            .map_err(|e| AppError::ExternalServiceError {
                message: format!("Content generator unreachable: {}", e),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::ExternalServiceError {
                message: format!("Content generator returned {}", status),
            });
        }

        let reply: GenerateReply =
            response
                .json()
                .await
                .map_err(|e| AppError::ExternalServiceError {
                    message: format!("Content generator response unreadable: {}", e),
                })?;

        Ok(GeneratedContent {
            title: reply.title,
            body: reply.body,
            image_prompt: reply.image_prompt,
        })
    }
}
