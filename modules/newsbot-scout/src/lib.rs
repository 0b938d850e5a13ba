pub mod chunker;
pub mod commands;
pub mod dedup;
pub mod delivery;
pub mod infra;
pub mod news_scanner;
pub mod store;
pub mod tagging;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;
pub mod translate;
