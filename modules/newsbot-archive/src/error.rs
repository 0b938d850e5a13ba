/// Result type alias for archive operations.
pub type Result<T> = std::result::Result<T, ArchiveError>;

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("Fetch failed for {url}: {message}")]
    FetchFailed { url: String, message: String },

    #[error("Unexpected HTTP status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Failed to parse feed {url}: {message}")]
    FeedParse { url: String, message: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ArchiveError {
    pub(crate) fn fetch(url: &str, err: impl std::fmt::Display) -> Self {
        Self::FetchFailed {
            url: url.to_string(),
            message: err.to_string(),
        }
    }
}

impl From<ArchiveError> for newsbot_common::NewsbotError {
    fn from(err: ArchiveError) -> Self {
        match err {
            ArchiveError::FeedParse { .. }
            | ArchiveError::FetchFailed { .. }
            | ArchiveError::Status { .. } => Self::Fetch(err.to_string()),
            ArchiveError::InvalidUrl(_) => Self::Extraction(err.to_string()),
            ArchiveError::Other(e) => Self::Anyhow(e),
        }
    }
}
