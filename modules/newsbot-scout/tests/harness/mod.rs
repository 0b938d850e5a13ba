//! Scenario harness for scanner tests.
//!
//! Every collaborator is a mock from `newsbot_scout::testing`; the dedup
//! stores and subscriber file live in a temp directory.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;

use newsbot_common::config::FileConfig;
use newsbot_common::{ArticleRecord, ChatId, FeedEntry, GovNewsItem};
use newsbot_scout::dedup::DedupGate;
use newsbot_scout::news_scanner::{CycleStats, NewsScanner, ScannerServices, Shutdown};
use newsbot_scout::testing::{
    FixedEmbedder, MockExtractor, MockFeedSource, MockGovSource, MockSummarizer, MockTranslator,
    RecordingMessenger, TEST_EMBEDDING_DIM,
};
use newsbot_scout::traits::{Extraction, GovSource};

pub const CDM_FEED: &str = "https://www.cdm.me/feed/";
pub const BI_FEED: &str = "https://balkaninsight.com/feed/";

/// A body long enough to fill the hash window, unique per `seed`.
pub fn long_body(seed: &str) -> String {
    format!("{seed} ").repeat(80).trim_end().to_string()
}

pub struct Scenario {
    feeds: MockFeedSource,
    gov: Option<MockGovSource>,
    extractor: MockExtractor,
    embedder: FixedEmbedder,
    translator: MockTranslator,
    messenger: RecordingMessenger,
    subscribers: Vec<ChatId>,
    sent: Vec<String>,
}

impl Scenario {
    pub fn new() -> Self {
        Self {
            feeds: MockFeedSource::new(),
            gov: None,
            extractor: MockExtractor::new(),
            embedder: FixedEmbedder::new(TEST_EMBEDDING_DIM),
            translator: MockTranslator::prefixing("RU: "),
            messenger: RecordingMessenger::new(),
            subscribers: vec![100, 200],
            sent: Vec::new(),
        }
    }

    pub fn feed(mut self, url: &str, entries: Vec<FeedEntry>) -> Self {
        self.feeds = self.feeds.on_feed(url, entries);
        self
    }

    pub fn failing_feed(mut self, url: &str) -> Self {
        self.feeds = self.feeds.failing(url);
        self
    }

    pub fn gov(mut self, items: Vec<GovNewsItem>) -> Self {
        self.gov = Some(MockGovSource::new(items));
        self
    }

    pub fn article(mut self, url: &str, record: ArticleRecord) -> Self {
        self.extractor = self.extractor.on_url(url, record);
        self
    }

    pub fn outcome(mut self, url: &str, outcome: Extraction) -> Self {
        self.extractor = self.extractor.on_url_outcome(url, outcome);
        self
    }

    pub fn embedder(mut self, embedder: FixedEmbedder) -> Self {
        self.embedder = embedder;
        self
    }

    pub fn translator(mut self, translator: MockTranslator) -> Self {
        self.translator = translator;
        self
    }

    pub fn messenger(mut self, messenger: RecordingMessenger) -> Self {
        self.messenger = messenger;
        self
    }

    pub fn subscribers(mut self, chats: &[ChatId]) -> Self {
        self.subscribers = chats.to_vec();
        self
    }

    /// Identifiers already delivered before the scenario starts.
    pub fn already_sent(mut self, identifiers: &[&str]) -> Self {
        self.sent = identifiers.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn build(self) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&dir, self.gov.is_some());

        if !self.subscribers.is_empty() {
            let lines: String = self.subscribers.iter().map(|id| format!("{id}\n")).collect();
            std::fs::write(&config.storage.subscribers, lines).unwrap();
        }
        if !self.sent.is_empty() {
            std::fs::write(&config.storage.sent_identifiers, self.sent.join("\n") + "\n").unwrap();
        }

        let gate = DedupGate::open(&config.storage, config.dedup.clone(), Arc::new(self.embedder))
            .unwrap();
        let extractor = Arc::new(self.extractor);
        let gov: Option<Arc<dyn GovSource>> = match self.gov {
            Some(gov) => Some(Arc::new(gov)),
            None => None,
        };
        let services = ScannerServices {
            feeds: Arc::new(self.feeds),
            gov,
            extractor: extractor.clone(),
            translator: Arc::new(self.translator.clone()),
            summarizer: Arc::new(MockSummarizer::first_chars(200)),
            messenger: Arc::new(self.messenger.clone()),
        };
        let sent_path = config.storage.sent_identifiers.clone();
        Harness {
            scanner: NewsScanner::new(config, services, gate),
            extractor,
            translator: self.translator,
            messenger: self.messenger,
            sent_path,
            _dir: dir,
        }
    }
}

pub struct Harness {
    pub scanner: NewsScanner,
    pub extractor: Arc<MockExtractor>,
    pub translator: MockTranslator,
    pub messenger: RecordingMessenger,
    sent_path: PathBuf,
    _dir: TempDir,
}

impl Harness {
    pub async fn cycle(&mut self) -> CycleStats {
        self.scanner.run_cycle(&Shutdown::never()).await
    }

    /// Contents of the sent-identifier log.
    pub fn sent_identifiers(&self) -> Vec<String> {
        std::fs::read_to_string(&self.sent_path)
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

fn test_config(dir: &TempDir, gov: bool) -> FileConfig {
    let d = dir.path().display();
    FileConfig::from_toml_str(&format!(
        r##"
[delivery]
message_pause_ms = 0
photo_pause_ms = 0

[translation]
pause_ms = 0
rate_limit_cooldown_secs = 0

[storage]
sent_identifiers = "{d}/sent_news.txt"
content_hashes = "{d}/news_history.txt"
subscribers = "{d}/subscribers.txt"
embeddings = "{d}/news_embeddings.json"

[gov]
enabled = {gov}
tag = "#GOV"

[[feeds]]
url = "{CDM_FEED}"
tag = "#CDM"

[[feeds]]
url = "{BI_FEED}"
tag = "#BALKANINSIGHT"
footer = "Конец бесплатной версии"

[[tags]]
keywords = ["метеоцентр", "погода"]
label = "#ПОГОДА"
"##
    ))
    .unwrap()
}
