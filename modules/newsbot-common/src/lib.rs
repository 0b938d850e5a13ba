pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, FileConfig};
pub use error::NewsbotError;
pub use types::*;

use sha2::{Digest, Sha256};

/// SHA-256 hex digest of `parts`, fed to the hasher in order.
pub fn content_hash<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<[u8]>,
{
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_ref());
    }
    hex::encode(hasher.finalize())
}

/// Produces semantic vectors for article bodies.
#[async_trait::async_trait]
pub trait TextEmbedder: Send + Sync {
    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>>;
}

/// Drop the query string (and fragment) from a URL.
pub fn clean_url(url: &str) -> String {
    url.split(['?', '#']).next().unwrap_or(url).to_string()
}
