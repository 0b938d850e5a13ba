pub mod archive;
pub mod error;
pub mod gov;
mod readability;
mod services;
pub mod sites;

pub use archive::{extract_article, Archive, ArchiveConfig};
pub use error::{ArchiveError, Result};
pub use gov::{GovListing, GovPage, GovScraper};
pub use sites::{ImageRule, SelectorSite, SiteExtractor, SiteRegistry};
