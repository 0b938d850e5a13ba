//! The polling loop: fetch candidates, dedup, translate, tag, deliver, commit.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use newsbot_common::config::FileConfig;
use newsbot_common::{clean_url, ArticleCandidate, ArticleRecord, ChatId, NewsbotError};

use crate::dedup::{DedupGate, Verdict};
use crate::delivery::{Deliverer, Post};
use crate::store::SubscriberStore;
use crate::tagging::TagRules;
use crate::traits::{
    ArticleExtractor, DuplicateKind, Extraction, FeedSource, GovSource, Messenger, TextSummarizer,
    TextTranslator,
};
use crate::translate::TranslationPipeline;

/// Source key for candidates from the government listing.
pub const GOV_SOURCE: &str = "gov";

// ---------------------------------------------------------------------------
// Shutdown
// ---------------------------------------------------------------------------

/// Cooperative shutdown signal, checked between items and during sleeps.
#[derive(Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

pub fn shutdown_channel() -> (ShutdownTrigger, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx }, Shutdown { rx })
}

impl ShutdownTrigger {
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }
}

impl Shutdown {
    /// A signal that never fires.
    pub fn never() -> Self {
        shutdown_channel().1
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once shutdown is triggered.
    pub async fn wait(&mut self) {
        if self.rx.wait_for(|triggered| *triggered).await.is_err() {
            // Trigger dropped without firing.
            std::future::pending::<()>().await;
        }
    }

    /// Sleep for `duration`. Returns `true` if shutdown interrupted the sleep.
    pub async fn sleep(&mut self, duration: Duration) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(duration) => self.is_triggered(),
            _ = self.wait() => true,
        }
    }
}

// ---------------------------------------------------------------------------
// Stages and outcomes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStage {
    FetchingCandidates,
    CheckingIdentifier,
    Extracting,
    CheckingHash,
    CheckingSemantic,
    Translating,
    Tagging,
    Chunking,
    Delivering,
    Committing,
}

impl fmt::Display for ItemStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ItemStage::FetchingCandidates => "fetching_candidates",
            ItemStage::CheckingIdentifier => "checking_identifier",
            ItemStage::Extracting => "extracting",
            ItemStage::CheckingHash => "checking_hash",
            ItemStage::CheckingSemantic => "checking_semantic",
            ItemStage::Translating => "translating",
            ItemStage::Tagging => "tagging",
            ItemStage::Chunking => "chunking",
            ItemStage::Delivering => "delivering",
            ItemStage::Committing => "committing",
        };
        f.write_str(name)
    }
}

/// What happened to one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
    Delivered,
    Duplicate(Verdict),
    Unavailable,
    /// No subscriber received it; it stays uncommitted and is retried.
    Undelivered,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleStats {
    pub candidates: usize,
    pub delivered: usize,
    pub duplicates: usize,
    pub unavailable: usize,
    pub failed: usize,
}

impl CycleStats {
    fn record(&mut self, outcome: &Result<ItemOutcome, (ItemStage, NewsbotError)>) {
        self.candidates += 1;
        match outcome {
            Ok(ItemOutcome::Delivered) => self.delivered += 1,
            Ok(ItemOutcome::Duplicate(_)) => self.duplicates += 1,
            Ok(ItemOutcome::Unavailable) => self.unavailable += 1,
            Ok(ItemOutcome::Undelivered) | Err(_) => self.failed += 1,
        }
    }
}

// ---------------------------------------------------------------------------
// NewsScanner
// ---------------------------------------------------------------------------

/// External services the scanner talks to.
pub struct ScannerServices {
    pub feeds: Arc<dyn FeedSource>,
    pub gov: Option<Arc<dyn GovSource>>,
    pub extractor: Arc<dyn ArticleExtractor>,
    pub translator: Arc<dyn TextTranslator>,
    pub summarizer: Arc<dyn TextSummarizer>,
    pub messenger: Arc<dyn Messenger>,
}

pub struct NewsScanner {
    config: FileConfig,
    feeds: Arc<dyn FeedSource>,
    gov: Option<Arc<dyn GovSource>>,
    extractor: Arc<dyn ArticleExtractor>,
    translation: TranslationPipeline,
    deliverer: Deliverer,
    tags: TagRules,
    gate: DedupGate,
}

impl NewsScanner {
    pub fn new(config: FileConfig, services: ScannerServices, gate: DedupGate) -> Self {
        let translation = TranslationPipeline::new(
            services.translator,
            services.summarizer,
            config.translation.clone(),
        );
        let deliverer = Deliverer::new(services.messenger, config.delivery.clone());
        let tags = TagRules::from_config(&config.tags);
        let gov = if config.gov.enabled { services.gov } else { None };
        Self {
            config,
            feeds: services.feeds,
            gov,
            extractor: services.extractor,
            translation,
            deliverer,
            tags,
            gate,
        }
    }

    pub fn gate(&self) -> &DedupGate {
        &self.gate
    }

    /// Poll forever (or once), sleeping `scan.poll_interval` between passes.
    pub async fn run(&mut self, once: bool, mut shutdown: Shutdown) {
        loop {
            let stats = self.run_cycle(&shutdown).await;
            info!(
                candidates = stats.candidates,
                delivered = stats.delivered,
                duplicates = stats.duplicates,
                unavailable = stats.unavailable,
                failed = stats.failed,
                "Scan cycle complete"
            );
            if once || shutdown.is_triggered() {
                break;
            }
            let interval = self.config.scan.poll_interval();
            info!(sleep_secs = interval.as_secs(), "Waiting for next scan");
            if shutdown.sleep(interval).await {
                break;
            }
        }
        info!("News scanner stopped");
    }

    /// One full pass over every source.
    pub async fn run_cycle(&mut self, shutdown: &Shutdown) -> CycleStats {
        let mut stats = CycleStats::default();

        if let Err(e) = self.gate.reload() {
            warn!(error = %e, "Failed to reload dedup logs, using cached state");
        }

        let chats: Vec<ChatId> = match SubscriberStore::read_ids(&self.config.storage.subscribers) {
            Ok(ids) => ids.into_iter().collect(),
            Err(e) => {
                error!(error = %e, "Failed to read subscribers, skipping cycle");
                return stats;
            }
        };
        if chats.is_empty() {
            info!("No subscribers, skipping cycle");
            return stats;
        }

        let feed_urls: Vec<String> = self.config.feeds.iter().map(|f| f.url.clone()).collect();
        for feed_url in feed_urls {
            if shutdown.is_triggered() {
                return stats;
            }
            let entries = match self.feeds.entries(&feed_url).await {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(
                        feed = %feed_url,
                        stage = %ItemStage::FetchingCandidates,
                        error = %e,
                        "Feed fetch failed, skipping source this cycle"
                    );
                    continue;
                }
            };
            info!(feed = %feed_url, entries = entries.len(), "Fetched feed");
            for entry in entries {
                if shutdown.is_triggered() {
                    return stats;
                }
                let candidate = ArticleCandidate::from_feed_entry(entry, &feed_url);
                let outcome = self.process_candidate(&candidate, &chats).await;
                log_outcome(&candidate, &outcome);
                stats.record(&outcome);
            }
        }

        if let Some(gov) = self.gov.clone() {
            if shutdown.is_triggered() {
                return stats;
            }
            let gate = &self.gate;
            let items = gov.items(&|link: &str| gate.is_seen(link)).await;
            info!(items = items.len(), "Fetched government listing");
            for item in items {
                if shutdown.is_triggered() {
                    return stats;
                }
                let candidate = ArticleCandidate::from_gov_item(item, GOV_SOURCE);
                let outcome = self.process_candidate(&candidate, &chats).await;
                log_outcome(&candidate, &outcome);
                stats.record(&outcome);
            }
        }

        stats
    }

    /// Run one candidate through the pipeline. Errors carry the stage they
    /// happened in.
    pub async fn process_candidate(
        &mut self,
        candidate: &ArticleCandidate,
        chats: &[ChatId],
    ) -> Result<ItemOutcome, (ItemStage, NewsbotError)> {
        let verdict = self.gate.pre_check(&candidate.identifier);
        if verdict.is_duplicate() {
            return Ok(ItemOutcome::Duplicate(verdict));
        }

        let link = clean_url(&candidate.link);
        let record = match &candidate.article {
            Some(record) => record.clone(),
            None => match self
                .extractor
                .extract(&link)
                .await
                .map_err(|e| (ItemStage::Extracting, e))?
            {
                Extraction::Article(record) => record,
                Extraction::Duplicate(DuplicateKind::Hash) => {
                    return Ok(ItemOutcome::Duplicate(Verdict::DuplicateHash))
                }
                Extraction::Duplicate(DuplicateKind::Semantic) => {
                    return Ok(ItemOutcome::Duplicate(Verdict::DuplicateSemantic))
                }
                Extraction::Unavailable => return Ok(ItemOutcome::Unavailable),
            },
        };
        if record.body.trim().is_empty() {
            return Ok(ItemOutcome::Unavailable);
        }
        let title = if record.title.trim().is_empty() {
            candidate.title.clone()
        } else {
            record.title.clone()
        };

        debug!(link = %link, stage = %ItemStage::CheckingHash, "Processing article");
        let classification = self.gate.classify_content(&title, &record.body).await;
        if classification.verdict.is_duplicate() {
            return Ok(ItemOutcome::Duplicate(classification.verdict));
        }
        debug!(
            link = %link,
            stage = %ItemStage::CheckingSemantic,
            similarity = ?classification.similarity,
            "Content is new"
        );

        debug!(link = %link, stage = %ItemStage::Translating, "Processing article");
        let (source_label, footer) = self.source_decorations(&candidate.source);
        let translation = self
            .translation
            .process(&title, &record.body, footer.as_deref())
            .await
            .map_err(|e| (ItemStage::Translating, e))?;

        debug!(link = %link, stage = %ItemStage::Tagging, "Processing article");
        let tags = self.tags.tags_for(
            &format!("{}\n\n{}", translation.title, translation.body),
            source_label.as_deref(),
        );

        debug!(link = %link, stage = %ItemStage::Chunking, "Processing article");
        let post = Post {
            title: translation.title,
            body: translation.body,
            link: link.clone(),
            tags,
            image: lead_image(&record),
        };
        let report = self.deliverer.deliver(chats, &post).await;
        if report.delivered == 0 {
            return Ok(ItemOutcome::Undelivered);
        }

        debug!(link = %link, stage = %ItemStage::Committing, "Processing article");
        self.gate.commit(&candidate.identifier, classification);
        Ok(ItemOutcome::Delivered)
    }

    /// Source label and footer configured for a candidate's source.
    fn source_decorations(&self, source: &str) -> (Option<String>, Option<String>) {
        if source == GOV_SOURCE {
            return (Some(self.config.gov.tag.clone()), None);
        }
        self.config
            .feeds
            .iter()
            .find(|f| f.url == source)
            .map(|f| (f.tag.clone(), f.footer.clone()))
            .unwrap_or_default()
    }
}

fn lead_image(record: &ArticleRecord) -> Option<String> {
    record.images.first().map(|image| image.url.clone())
}

fn log_outcome(candidate: &ArticleCandidate, outcome: &Result<ItemOutcome, (ItemStage, NewsbotError)>) {
    match outcome {
        Ok(ItemOutcome::Delivered) => {
            info!(link = %candidate.link, title = %candidate.title, "Article delivered and committed")
        }
        Ok(ItemOutcome::Duplicate(verdict)) => {
            debug!(link = %candidate.link, verdict = ?verdict, "Skipping duplicate")
        }
        Ok(ItemOutcome::Unavailable) => {
            info!(link = %candidate.link, "No article content, skipping")
        }
        Ok(ItemOutcome::Undelivered) => {
            warn!(link = %candidate.link, "Article not delivered, will retry next cycle")
        }
        Err((stage, e)) => {
            error!(link = %candidate.link, stage = %stage, error = %e, "Failed to process article")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sleep_returns_early_on_shutdown() {
        let (trigger, mut shutdown) = shutdown_channel();
        trigger.trigger();
        assert!(shutdown.sleep(Duration::from_secs(3600)).await);
        assert!(shutdown.is_triggered());
    }

    #[tokio::test]
    async fn sleep_completes_without_shutdown() {
        let (_trigger, mut shutdown) = shutdown_channel();
        assert!(!shutdown.sleep(Duration::from_millis(5)).await);
    }

    #[test]
    fn stage_names_are_snake_case() {
        assert_eq!(ItemStage::CheckingIdentifier.to_string(), "checking_identifier");
        assert_eq!(ItemStage::Delivering.to_string(), "delivering");
    }
}
