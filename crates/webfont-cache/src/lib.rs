//! Web font cache
//!
//! Resolves a `(family, weight)` pair to a TrueType file on local disk,
//! downloading it from the Google Fonts CSS2 API on first use:
//!
//! - `FontCache::resolve`: cache hit or stylesheet lookup + binary download
//! - `FontCache::cached`: cache-only lookup, never touches the network
//!
//! Cached files are named `<family>-<weight>.ttf` and are never expired.

pub mod cache;
pub mod error;
pub mod stylesheet;

pub use cache::{
    cache_file_name, normalize_family, FontCache, FontCacheConfig, DEFAULT_FONT_URL_PREFIX,
    DEFAULT_STYLESHEET_URL, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT,
};
pub use error::DownloadError;
pub use stylesheet::{stylesheet_url, FontUrlMatcher};
