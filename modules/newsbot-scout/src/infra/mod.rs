// Adapters from the remote service clients to the scanner's traits.

pub mod azure;
pub mod embedder;
pub mod telegram;

pub use self::azure::{AzureSummarizer, AzureTextTranslator};
pub use self::embedder::Embedder;
pub use self::telegram::TelegramMessenger;
