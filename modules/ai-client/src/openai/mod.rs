mod client;
pub(crate) mod types;

use crate::traits::EmbedAgent;
use anyhow::Result;
use async_trait::async_trait;

use client::OpenAiClient;

// =============================================================================
// OpenAi embeddings
// =============================================================================

/// Embedding client for OpenAI or any server exposing the same
/// `/embeddings` contract (text-embeddings-inference, Ollama, Voyage...).
#[derive(Clone)]
pub struct OpenAi {
    api_key: String,
    embedding_model: String,
    base_url: Option<String>,
}

impl OpenAi {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            embedding_model: "text-embedding-3-small".to_string(),
            base_url: None,
        }
    }

    pub fn with_embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = model.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Get the embedding model name.
    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    pub(crate) fn client(&self) -> OpenAiClient {
        let client = OpenAiClient::new(&self.api_key);
        if let Some(ref url) = self.base_url {
            client.with_base_url(url)
        } else {
            client
        }
    }
}

// =============================================================================
// EmbedAgent Implementation
// =============================================================================

#[async_trait]
impl EmbedAgent for OpenAi {
    async fn embed(&self, text: impl Into<String> + Send) -> Result<Vec<f32>> {
        self.client()
            .embed(&self.embedding_model, &text.into())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_new() {
        let ai = OpenAi::new("sk-test");
        assert_eq!(ai.api_key, "sk-test");
        assert_eq!(ai.embedding_model, "text-embedding-3-small");
        assert!(ai.base_url.is_none());
    }

    #[test]
    fn test_openai_with_embedding_model() {
        let ai = OpenAi::new("sk-test").with_embedding_model("all-mpnet-base-v2");
        assert_eq!(ai.embedding_model(), "all-mpnet-base-v2");
    }

    #[test]
    fn test_openai_with_base_url() {
        let ai = OpenAi::new("").with_base_url("http://localhost:8080/v1");
        assert_eq!(ai.base_url, Some("http://localhost:8080/v1".to_string()));
    }
}
