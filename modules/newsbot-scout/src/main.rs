use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ai_client::{AzureLanguage, AzureTranslator};
use newsbot_archive::{Archive, ArchiveConfig, GovScraper};
use newsbot_common::config::{AppConfig, FileConfig};
use newsbot_scout::commands::CommandListener;
use newsbot_scout::dedup::DedupGate;
use newsbot_scout::infra::{AzureSummarizer, AzureTextTranslator, Embedder, TelegramMessenger};
use newsbot_scout::news_scanner::{shutdown_channel, NewsScanner, ScannerServices};
use newsbot_scout::store::SubscriberStore;
use newsbot_scout::traits::GovSource;
use telegram::{TelegramOptions, TelegramService};

#[derive(Parser)]
#[command(name = "newsbot", about = "Montenegrin news translated and delivered over Telegram")]
struct Cli {
    /// Path to config TOML file
    #[arg(long, env = "NEWSBOT_CONFIG", default_value = "newsbot.toml")]
    config: PathBuf,

    /// Run a single scan cycle and exit
    #[arg(long)]
    once: bool,

    /// Do not listen for /start and /stop
    #[arg(long)]
    no_commands: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing()?;

    let cli = Cli::parse();
    info!("Newsbot starting...");

    let app = AppConfig::from_env().context("Missing required environment")?;
    app.log_redacted();

    let config = FileConfig::load(&cli.config)?;
    info!(
        config = %cli.config.display(),
        feeds = config.feeds.len(),
        gov = config.gov.enabled,
        "Loaded config"
    );

    // Sources
    let archive = Arc::new(
        Archive::new(ArchiveConfig::from(&config.scan)).context("Failed to build archive")?,
    );
    let gov: Option<Arc<dyn GovSource>> = if config.gov.enabled {
        let scraper = GovScraper::new(
            &config.gov,
            &config.scan.user_agent,
            config.scan.request_timeout(),
        )
        .context("Failed to build gov scraper")?;
        Some(Arc::new(scraper))
    } else {
        None
    };

    // Language services
    let mut translator = AzureTranslator::new(app.azure_translation_key.clone());
    if let Some(endpoint) = &app.azure_translation_endpoint {
        translator = translator.with_endpoint(endpoint.clone());
    }
    if let Some(region) = &app.azure_translation_region {
        translator = translator.with_region(region.clone());
    }
    let summarizer = AzureLanguage::new(
        app.azure_analytics_endpoint.clone(),
        app.azure_analytics_key.clone(),
    );
    let embedder = Embedder::from_config(&app);
    info!(model = embedder.model(), "Embedding model");

    // Telegram
    let telegram = Arc::new(TelegramMessenger::new(TelegramService::new(
        TelegramOptions::new(app.telegram_token.clone()),
    )));

    let gate = DedupGate::open(&config.storage, config.dedup.clone(), Arc::new(embedder))
        .context("Failed to open dedup stores")?;

    let (trigger, shutdown) = shutdown_channel();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Ctrl-C received, finishing current item");
                trigger.trigger();
            }
            Err(e) => warn!(error = %e, "Failed to listen for Ctrl-C"),
        }
    });

    let listener = if cli.no_commands {
        None
    } else {
        let subscribers = SubscriberStore::load(&config.storage.subscribers)
            .context("Failed to load subscribers")?;
        let listener = CommandListener::new(telegram.clone(), telegram.clone(), subscribers);
        Some(tokio::spawn(listener.run(shutdown.clone())))
    };

    let services = ScannerServices {
        feeds: archive.clone(),
        gov,
        extractor: archive,
        translator: Arc::new(AzureTextTranslator::new(translator)),
        summarizer: Arc::new(AzureSummarizer::new(summarizer)),
        messenger: telegram,
    };
    let mut scanner = NewsScanner::new(config, services, gate);
    scanner.run(cli.once, shutdown).await;

    if let Some(listener) = listener {
        listener.abort();
    }
    info!("Newsbot stopped");
    Ok(())
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::from_default_env().add_directive("newsbot=info".parse()?);
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")) {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}
