//! Runtime configuration read from the environment

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;
use webfont_cache::{FontCacheConfig, DEFAULT_FONT_URL_PREFIX, DEFAULT_STYLESHEET_URL};

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_CACHE_DIR: &str = "fonts_cache";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_MAX_UPLOAD_MB: usize = 50;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub font_cache: FontCacheConfig,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset or empty keys take defaults
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let timeout_secs = parsed(&get, "FONT_FETCH_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS);
        let max_upload_mb = parsed(&get, "MAX_UPLOAD_MB", DEFAULT_MAX_UPLOAD_MB);

        let font_cache = FontCacheConfig {
            cache_dir: PathBuf::from(
                get("FONT_CACHE_DIR").unwrap_or_else(|| DEFAULT_CACHE_DIR.to_string()),
            ),
            stylesheet_url: get("FONT_STYLESHEET_URL")
                .unwrap_or_else(|| DEFAULT_STYLESHEET_URL.to_string()),
            font_url_prefix: get("FONT_FILE_URL_PREFIX")
                .unwrap_or_else(|| DEFAULT_FONT_URL_PREFIX.to_string()),
            timeout: Duration::from_secs(timeout_secs),
            ..FontCacheConfig::default()
        };

        Self {
            host: get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parsed(&get, "PORT", DEFAULT_PORT),
            font_cache,
            max_upload_bytes: max_upload_mb.saturating_mul(1024 * 1024),
        }
    }
}

fn parsed<T, F>(get: &F, key: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Ignoring invalid {}={:?}, using {}", key, raw, default);
            default
        }),
        None => default,
    }
}
