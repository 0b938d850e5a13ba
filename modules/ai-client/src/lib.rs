//! Thin clients for the remote AI services the bot depends on:
//! Azure Translator, Azure Language extractive summarization, and any
//! OpenAI-compatible `/embeddings` endpoint.

pub mod azure;
pub mod openai;
pub mod traits;

pub use azure::{AzureError, AzureLanguage, AzureTranslator};
pub use openai::OpenAi;
pub use traits::EmbedAgent;
