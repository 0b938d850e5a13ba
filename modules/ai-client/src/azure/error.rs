use thiserror::Error;

/// Azure error code reported when the per-second character quota is exhausted.
pub(crate) const RATE_LIMIT_CODE: i64 = 429001;

#[derive(Debug, Error)]
pub enum AzureError {
    #[error("Azure rate limit exceeded ({code}): {message}")]
    RateLimited { code: i64, message: String },

    #[error("Azure API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Azure returned an empty result")]
    Empty,

    #[error("Azure job failed: {0}")]
    Job(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl AzureError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, AzureError::RateLimited { .. })
    }

    /// Classify a non-success response body.
    pub(crate) fn from_response(status: u16, body: String) -> Self {
        let code = serde_json::from_str::<super::types::ErrorEnvelope>(&body)
            .ok()
            .map(|e| (e.error.code.as_i64(), e.error.message));

        match code {
            Some((Some(code), message)) if code == RATE_LIMIT_CODE || status == 429 => {
                AzureError::RateLimited { code, message }
            }
            _ if status == 429 => AzureError::RateLimited {
                code: RATE_LIMIT_CODE,
                message: body,
            },
            _ => AzureError::Api { status, body },
        }
    }
}
