use std::collections::VecDeque;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use newsbot_common::NewsbotError;

use crate::dedup::cosine_similarity_f32;

#[derive(Serialize, Deserialize, Default)]
struct IndexFile {
    vectors: VecDeque<Vec<f32>>,
}

/// Embeddings of every delivered article, oldest first.
///
/// Loaded once per process and rewritten atomically after each append.
pub struct EmbeddingIndex {
    path: PathBuf,
    vectors: VecDeque<Vec<f32>>,
    max_entries: Option<usize>,
}

impl EmbeddingIndex {
    /// Load the index. A missing file is empty; an unreadable one is logged
    /// and treated as empty so the bot keeps running.
    pub fn load(path: impl Into<PathBuf>, max_entries: Option<usize>) -> Self {
        let path = path.into();
        let vectors = match std::fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice::<IndexFile>(&bytes) {
                Ok(file) => file.vectors,
                Err(e) => {
                    error!(path = %path.display(), error = %e, "Embedding index is corrupted, starting empty");
                    VecDeque::new()
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => VecDeque::new(),
            Err(e) => {
                error!(path = %path.display(), error = %e, "Failed to read embedding index, starting empty");
                VecDeque::new()
            }
        };
        info!(path = %path.display(), vectors = vectors.len(), "Loaded embedding index");
        let mut index = Self {
            path,
            vectors,
            max_entries,
        };
        index.evict();
        index
    }

    /// Highest cosine similarity against any indexed vector, `None` when empty.
    /// Vectors of a different dimension are ignored.
    pub fn max_similarity(&self, embedding: &[f32]) -> Option<f64> {
        let mut skipped = 0usize;
        let best = self
            .vectors
            .iter()
            .filter(|v| {
                let same = v.len() == embedding.len();
                if !same {
                    skipped += 1;
                }
                same
            })
            .map(|v| cosine_similarity_f32(embedding, v))
            .fold(None, |best: Option<f64>, sim| Some(best.map_or(sim, |b| b.max(sim))));
        if skipped > 0 {
            warn!(skipped, dimension = embedding.len(), "Ignored indexed vectors of another dimension");
        }
        best
    }

    /// Append a vector and persist the whole index.
    pub fn push(&mut self, embedding: Vec<f32>) -> Result<(), NewsbotError> {
        self.vectors.push_back(embedding);
        self.evict();
        self.persist()
    }

    fn evict(&mut self) {
        if let Some(max) = self.max_entries {
            while self.vectors.len() > max {
                self.vectors.pop_front();
            }
        }
    }

    fn persist(&self) -> Result<(), NewsbotError> {
        #[derive(Serialize)]
        struct IndexFileRef<'a> {
            vectors: &'a VecDeque<Vec<f32>>,
        }
        let bytes = serde_json::to_vec(&IndexFileRef {
            vectors: &self.vectors,
        })
        .map_err(|e| NewsbotError::Anyhow(e.into()))?;
        super::write_atomic(&self.path, &bytes)
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
