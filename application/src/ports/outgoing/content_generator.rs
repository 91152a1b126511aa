use std::sync::Arc;

use crate::error::AppResult;

#[derive(Debug, Clone)]
pub struct ContentRequest {
    pub ingredients: Vec<String>,
    pub prompt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedContent {
    pub title: String,
    pub body: String,
    pub image_prompt: String,
}

/// External collaborator that produces the non-image generation
/// result (the recipe text) from the submitted ingredients.
#[async_trait::async_trait]
pub trait ContentGeneratorPort: Send + Sync {
    async fn generate_content(&self, request: &ContentRequest) -> AppResult<GeneratedContent>;
}

pub type DynContentGeneratorPort = Arc<dyn ContentGeneratorPort>;
