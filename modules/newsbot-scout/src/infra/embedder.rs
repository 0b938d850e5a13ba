use ai_client::traits::EmbedAgent;
use ai_client::OpenAi;
use anyhow::Result;

use newsbot_common::config::AppConfig;
use newsbot_common::TextEmbedder;

/// Embeddings from any OpenAI-compatible `/embeddings` endpoint.
pub struct Embedder {
    client: OpenAi,
}

impl Embedder {
    pub fn new(client: OpenAi) -> Self {
        Self { client }
    }

    /// Build from the embedding settings in the environment. Base URL and
    /// model fall back to the client defaults.
    pub fn from_config(config: &AppConfig) -> Self {
        let mut client = OpenAi::new(config.embedding_api_key.clone());
        if let Some(url) = &config.embedding_base_url {
            client = client.with_base_url(url.clone());
        }
        if let Some(model) = &config.embedding_model {
            client = client.with_embedding_model(model.clone());
        }
        Self { client }
    }

    pub fn model(&self) -> &str {
        self.client.embedding_model()
    }
}

#[async_trait::async_trait]
impl TextEmbedder for Embedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.client.embed(text.to_string()).await
    }
}
