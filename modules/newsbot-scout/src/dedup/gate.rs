use std::sync::Arc;

use tracing::{debug, error, info, warn};

use newsbot_common::config::{DedupConfig, StorageConfig};
use newsbot_common::{NewsbotError, TextEmbedder};

use super::fingerprint::content_fingerprint;
use crate::store::{EmbeddingIndex, SeenLog};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    New,
    DuplicateIdentifier,
    DuplicateHash,
    DuplicateSemantic,
}

impl Verdict {
    pub fn is_duplicate(self) -> bool {
        self != Verdict::New
    }
}

/// A verdict plus what must be committed if the article is delivered.
#[derive(Debug, Clone)]
pub struct Classification {
    pub verdict: Verdict,
    pub hash: Option<String>,
    /// Absent when embedding failed; such articles are not indexed.
    pub embedding: Option<Vec<f32>>,
    pub similarity: Option<f64>,
}

impl Classification {
    fn duplicate(verdict: Verdict) -> Self {
        Self {
            verdict,
            hash: None,
            embedding: None,
            similarity: None,
        }
    }
}

/// Owns the three dedup stores. Single writer: the scanner holds it by `&mut`.
pub struct DedupGate {
    identifiers: SeenLog,
    hashes: SeenLog,
    index: EmbeddingIndex,
    embedder: Arc<dyn TextEmbedder>,
    config: DedupConfig,
}

impl DedupGate {
    pub fn new(
        identifiers: SeenLog,
        hashes: SeenLog,
        index: EmbeddingIndex,
        embedder: Arc<dyn TextEmbedder>,
        config: DedupConfig,
    ) -> Self {
        Self {
            identifiers,
            hashes,
            index,
            embedder,
            config,
        }
    }

    /// Open the stores at the configured paths.
    pub fn open(
        storage: &StorageConfig,
        config: DedupConfig,
        embedder: Arc<dyn TextEmbedder>,
    ) -> Result<Self, NewsbotError> {
        Ok(Self::new(
            SeenLog::load(&storage.sent_identifiers)?,
            SeenLog::load(&storage.content_hashes)?,
            EmbeddingIndex::load(&storage.embeddings, config.max_embeddings),
            embedder,
            config,
        ))
    }

    /// Re-read the identifier and hash logs. Called at the start of every cycle.
    pub fn reload(&mut self) -> Result<(), NewsbotError> {
        self.identifiers.reload()?;
        self.hashes.reload()?;
        Ok(())
    }

    pub fn is_seen(&self, identifier: &str) -> bool {
        self.identifiers.contains(identifier)
    }

    /// Identifier check, done before any extraction.
    pub fn pre_check(&self, identifier: &str) -> Verdict {
        if self.is_seen(identifier) {
            Verdict::DuplicateIdentifier
        } else {
            Verdict::New
        }
    }

    pub fn fingerprint(&self, title: &str, body: &str) -> String {
        content_fingerprint(
            title,
            body,
            self.config.hash_window_offset,
            self.config.hash_window_length,
        )
    }

    /// Hash check then semantic check on an extracted article.
    pub async fn classify_content(&self, title: &str, body: &str) -> Classification {
        let hash = self.fingerprint(title, body);
        if self.hashes.contains(&hash) {
            debug!(hash = %hash, "dedup: content hash already seen");
            return Classification::duplicate(Verdict::DuplicateHash);
        }

        let embedding = match self.embedder.embed(body).await {
            Ok(v) if !v.is_empty() => Some(v),
            Ok(_) => {
                warn!("dedup: embedder returned an empty vector, skipping similarity check");
                None
            }
            Err(e) => {
                warn!(error = %e, "dedup: embedding failed, skipping similarity check");
                None
            }
        };

        let similarity = embedding
            .as_deref()
            .and_then(|v| self.index.max_similarity(v));
        if let Some(sim) = similarity {
            debug!(similarity = sim, threshold = self.config.similarity_threshold, "dedup: max similarity");
            if sim >= self.config.similarity_threshold {
                return Classification {
                    verdict: Verdict::DuplicateSemantic,
                    hash: Some(hash),
                    embedding: None,
                    similarity,
                };
            }
        }

        Classification {
            verdict: Verdict::New,
            hash: Some(hash),
            embedding,
            similarity,
        }
    }

    /// Full classification, short-circuiting identifier → hash → semantic.
    pub async fn classify(&self, identifier: &str, title: &str, body: &str) -> Classification {
        match self.pre_check(identifier) {
            Verdict::New => self.classify_content(title, body).await,
            verdict => Classification::duplicate(verdict),
        }
    }

    /// Record a delivered article. Each store is written independently and a
    /// failure in one is logged without affecting the others.
    pub fn commit(&mut self, identifier: &str, classification: Classification) {
        if let Err(e) = self.identifiers.append(identifier) {
            error!(identifier, error = %e, "dedup: failed to record identifier");
        }
        if let Some(hash) = &classification.hash {
            if let Err(e) = self.hashes.append(hash) {
                error!(hash = %hash, error = %e, "dedup: failed to record content hash");
            }
        }
        if let Some(embedding) = classification.embedding {
            if let Err(e) = self.index.push(embedding) {
                error!(error = %e, "dedup: failed to persist embedding index");
            }
        }
        info!(
            identifier,
            identifiers = self.identifiers.len(),
            hashes = self.hashes.len(),
            embeddings = self.index.len(),
            "dedup: committed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingEmbedder, FixedEmbedder};

    fn gate_with(dir: &std::path::Path, embedder: Arc<dyn TextEmbedder>) -> DedupGate {
        let storage = StorageConfig {
            sent_identifiers: dir.join("sent.txt"),
            content_hashes: dir.join("hashes.txt"),
            subscribers: dir.join("subscribers.txt"),
            embeddings: dir.join("embeddings.json"),
        };
        DedupGate::open(&storage, DedupConfig::default(), embedder).unwrap()
    }

    fn body(seed: &str) -> String {
        format!("{seed} ").repeat(60)
    }

    #[tokio::test]
    async fn new_article_is_new_and_carries_commit_data() {
        let dir = tempfile::tempdir().unwrap();
        let gate = gate_with(dir.path(), Arc::new(FixedEmbedder::new(8)));
        let c = gate.classify("guid-1", "Naslov", &body("prvi")).await;
        assert_eq!(c.verdict, Verdict::New);
        assert!(c.hash.is_some());
        assert!(c.embedding.is_some());
        assert_eq!(c.similarity, None);
    }

    #[tokio::test]
    async fn committed_identifier_short_circuits() {
        let dir = tempfile::tempdir().unwrap();
        let mut gate = gate_with(dir.path(), Arc::new(FixedEmbedder::new(8)));
        let c = gate.classify("guid-1", "Naslov", &body("prvi")).await;
        gate.commit("guid-1", c);

        assert_eq!(gate.pre_check("guid-1"), Verdict::DuplicateIdentifier);
        let c = gate.classify("guid-1", "Drugi", &body("drugi")).await;
        assert_eq!(c.verdict, Verdict::DuplicateIdentifier);
    }

    #[tokio::test]
    async fn same_content_under_new_identifier_is_hash_duplicate() {
        let dir = tempfile::tempdir().unwrap();
        let mut gate = gate_with(dir.path(), Arc::new(FixedEmbedder::new(8)));
        let c = gate.classify("guid-1", "Naslov", &body("prvi")).await;
        gate.commit("guid-1", c);

        let c = gate.classify("guid-2", "Naslov", &body("prvi")).await;
        assert_eq!(c.verdict, Verdict::DuplicateHash);
    }

    #[tokio::test]
    async fn similarity_above_threshold_is_semantic_duplicate() {
        let dir = tempfile::tempdir().unwrap();
        let first = body("prvi");
        let close = body("blizu");
        let far = body("daleko");
        let embedder = FixedEmbedder::new(2)
            .on_text(&first, vec![1.0, 0.0])
            .on_text(&close, vec![0.9, 0.435_889_9])
            .on_text(&far, vec![0.5, 0.866_025_4]);
        let mut gate = gate_with(dir.path(), Arc::new(embedder));

        let c = gate.classify("a", "A", &first).await;
        gate.commit("a", c);

        let c = gate.classify("b", "B", &close).await;
        assert_eq!(c.verdict, Verdict::DuplicateSemantic);
        assert!((c.similarity.unwrap() - 0.9).abs() < 1e-4);

        let c = gate.classify("c", "C", &far).await;
        assert_eq!(c.verdict, Verdict::New);
        assert!((c.similarity.unwrap() - 0.5).abs() < 1e-4);
    }

    #[tokio::test]
    async fn empty_index_never_semantic_duplicate() {
        let dir = tempfile::tempdir().unwrap();
        let text = body("isti");
        let embedder = FixedEmbedder::new(2).on_text(&text, vec![1.0, 0.0]);
        let gate = gate_with(dir.path(), Arc::new(embedder));
        let c = gate.classify("a", "A", &text).await;
        assert_eq!(c.verdict, Verdict::New);
    }

    #[tokio::test]
    async fn embedding_failure_is_new_and_not_indexed() {
        let dir = tempfile::tempdir().unwrap();
        let mut gate = gate_with(dir.path(), Arc::new(FailingEmbedder));
        let c = gate.classify("a", "A", &body("prvi")).await;
        assert_eq!(c.verdict, Verdict::New);
        assert!(c.embedding.is_none());
        gate.commit("a", c);
        assert!(gate.index.is_empty());
        assert!(gate.is_seen("a"));
    }

    #[tokio::test]
    async fn reload_sees_commits_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mut gate = gate_with(dir.path(), Arc::new(FixedEmbedder::new(8)));
        std::fs::write(dir.path().join("sent.txt"), "external\n").unwrap();
        assert!(!gate.is_seen("external"));
        gate.reload().unwrap();
        assert!(gate.is_seen("external"));
    }
}
