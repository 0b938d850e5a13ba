use thiserror::Error;

/// Failure taxonomy of the news pipeline. Only `Config` is fatal, and only at startup.
#[derive(Error, Debug)]
pub enum NewsbotError {
    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Translation error: {0}")]
    Translation(String),

    #[error("Rate limited by {service} after retry")]
    RateLimited { service: String },

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Persistence error on {path}: {source}")]
    Persistence {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Delivery error to chat {chat_id}: {message}")]
    Delivery { chat_id: i64, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl NewsbotError {
    pub fn persistence(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        NewsbotError::Persistence {
            path: path.as_ref().display().to_string(),
            source,
        }
    }
}
