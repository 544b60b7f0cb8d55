//! Disk-backed font cache

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::header::USER_AGENT;
use tracing::{debug, info};

use crate::error::DownloadError;
use crate::stylesheet::{stylesheet_url, FontUrlMatcher};

pub const DEFAULT_STYLESHEET_URL: &str = "https://fonts.googleapis.com/css2";
pub const DEFAULT_FONT_URL_PREFIX: &str = "https://fonts.gstatic.com/";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Without a modern browser token the CSS2 API answers with TrueType sources
/// instead of WOFF2.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

#[derive(Debug, Clone)]
pub struct FontCacheConfig {
    /// Directory holding `<family>-<weight>.ttf` files
    pub cache_dir: PathBuf,
    /// CSS2 endpoint queried for the `@font-face` rules
    pub stylesheet_url: String,
    /// Only `url(...)` values starting with this prefix are downloaded
    pub font_url_prefix: String,
    /// Applied to each outbound request
    pub timeout: Duration,
    /// Sent with the stylesheet request
    pub user_agent: String,
}

impl Default for FontCacheConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("fonts_cache"),
            stylesheet_url: DEFAULT_STYLESHEET_URL.to_string(),
            font_url_prefix: DEFAULT_FONT_URL_PREFIX.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl FontCacheConfig {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            ..Self::default()
        }
    }
}

/// Download-once cache of web font files.
///
/// Entries are never invalidated. Two concurrent misses for the same key may
/// both download; each writes a private temporary file and renames it into
/// place, so readers only ever see complete files.
pub struct FontCache {
    config: FontCacheConfig,
    client: reqwest::Client,
    matcher: FontUrlMatcher,
}

impl FontCache {
    /// Create the cache, ensuring the directory exists.
    pub fn new(config: FontCacheConfig) -> Result<Self, DownloadError> {
        std::fs::create_dir_all(&config.cache_dir)?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        let matcher = FontUrlMatcher::new(&config.font_url_prefix)?;

        let shown =
            std::fs::canonicalize(&config.cache_dir).unwrap_or_else(|_| config.cache_dir.clone());
        info!("Font cache directory: {}", shown.display());

        Ok(Self {
            config,
            client,
            matcher,
        })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.config.cache_dir
    }

    /// Path the entry for this pair lives at, whether or not it exists yet
    pub fn cache_path(&self, family: &str, weight: u32) -> Result<PathBuf, DownloadError> {
        let family = normalize_family(family)?;
        Ok(self.entry_path(&family, weight))
    }

    /// Cache-only lookup
    pub async fn cached(&self, family: &str, weight: u32) -> Option<PathBuf> {
        let path = self.cache_path(family, weight).ok()?;
        is_file(&path).await.then_some(path)
    }

    /// Return the local TrueType file for `family` at `weight`, downloading
    /// it on a cache miss.
    pub async fn resolve(&self, family: &str, weight: u32) -> Result<PathBuf, DownloadError> {
        let family = normalize_family(family)?;
        if let Some(path) = self.cached(&family, weight).await {
            debug!("Using cached font: {}", path.display());
            return Ok(path);
        }
        let path = self.entry_path(&family, weight);

        info!("Downloading web font: {} {}", family, weight);

        let css = self.fetch_stylesheet(&family, weight).await?;
        let font_url = self
            .matcher
            .first_font_url(&css)
            .ok_or_else(|| DownloadError::NoFontUrl {
                family: family.clone(),
                weight,
            })?;
        debug!("Found font URL: {}", font_url);

        let bytes = self
            .client
            .get(font_url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        write_atomically(&path, &bytes).await?;
        info!(
            "Downloaded and cached: {} ({} bytes)",
            path.display(),
            bytes.len()
        );

        Ok(path)
    }

    async fn fetch_stylesheet(&self, family: &str, weight: u32) -> Result<String, DownloadError> {
        let url = stylesheet_url(&self.config.stylesheet_url, family, weight);
        let css = self
            .client
            .get(&url)
            .header(USER_AGENT, &self.config.user_agent)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(css)
    }

    fn entry_path(&self, normalized_family: &str, weight: u32) -> PathBuf {
        self.config
            .cache_dir
            .join(cache_file_name(normalized_family, weight))
    }
}

/// Trim and replace spaces with `+`, the form the CSS2 query expects.
///
/// The result doubles as a file name component, so anything beyond
/// alphanumerics, `+` and `_` is rejected.
pub fn normalize_family(family: &str) -> Result<String, DownloadError> {
    let normalized = family.trim().replace(' ', "+");
    let valid = !normalized.is_empty()
        && normalized
            .chars()
            .all(|c| c.is_alphanumeric() || c == '+' || c == '_');
    if !valid {
        return Err(DownloadError::InvalidFamily(family.to_string()));
    }
    Ok(normalized)
}

pub fn cache_file_name(normalized_family: &str, weight: u32) -> String {
    format!("{}-{}.ttf", normalized_family, weight)
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}

async fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), DownloadError> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(
        ".{}.{}.part",
        file_name,
        uuid::Uuid::new_v4().simple()
    ));

    tokio::fs::write(&tmp, bytes).await?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    Ok(())
}
