//! Application state for the PDF edit API

use anyhow::Result;
use webfont_cache::FontCache;

use crate::config::Config;

pub struct AppState {
    pub fonts: FontCache,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self> {
        let fonts = FontCache::new(config.font_cache.clone())?;
        Ok(Self { fonts })
    }
}
