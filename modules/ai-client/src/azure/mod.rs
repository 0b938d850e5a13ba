mod error;
mod language;
mod translator;
pub(crate) mod types;

pub use error::AzureError;
pub use language::AzureLanguage;
pub use translator::AzureTranslator;

/// Header carrying the Cognitive Services subscription key.
const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";
/// Header carrying the resource region (multi-service / regional keys only).
const SUBSCRIPTION_REGION_HEADER: &str = "Ocp-Apim-Subscription-Region";
