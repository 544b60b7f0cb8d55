//! Choosing the font an edit is drawn with

use pdfedit_core::{BuiltinFont, EditInstruction, TextFont};
use tracing::{debug, info, warn};
use webfont_cache::FontCache;

/// Web font for the edit's family and weight when one can be resolved
/// through the cache; otherwise the built-in Helvetica face for the weight.
///
/// Never fails. Download and read errors are logged and turn into the
/// built-in fallback.
pub async fn select_font(cache: &FontCache, edit: &EditInstruction) -> TextFont {
    let fallback = TextFont::Builtin(BuiltinFont::for_weight(edit.font_weight));

    let Some(family) = edit.web_font_family() else {
        debug!(
            "Using built-in font for {:?} (weight {})",
            edit.font_name, edit.font_weight
        );
        return fallback;
    };
    info!("Parsed font family: {}", family);

    let path = match cache.resolve(family, edit.font_weight).await {
        Ok(path) => path,
        Err(e) => {
            warn!(
                "Could not get web font {} {}, using built-in font: {}",
                family, edit.font_weight, e
            );
            return fallback;
        }
    };

    match tokio::fs::read(&path).await {
        Ok(data) => TextFont::TrueType {
            name: embedded_font_name(family, edit.font_weight),
            data,
        },
        Err(e) => {
            warn!("Could not read {}: {}", path.display(), e);
            fallback
        }
    }
}

/// Name the web font is embedded under, e.g. `OpenSans-700`
fn embedded_font_name(family: &str, weight: u32) -> String {
    let family: String = family.split_whitespace().collect();
    format!("{}-{}", family, weight)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::Duration;
    use webfont_cache::FontCacheConfig;

    fn offline_cache(dir: &std::path::Path) -> FontCache {
        FontCache::new(FontCacheConfig {
            cache_dir: dir.to_path_buf(),
            stylesheet_url: "http://127.0.0.1:9/css2".to_string(),
            font_url_prefix: "http://127.0.0.1:9/".to_string(),
            timeout: Duration::from_secs(2),
            ..FontCacheConfig::default()
        })
        .unwrap()
    }

    fn edit(font_name: &str, font_weight: u32) -> EditInstruction {
        EditInstruction {
            page_number: 1,
            original_text: String::new(),
            new_text: "Hello".to_string(),
            x: 0.0,
            y: 0.0,
            width: 10.0,
            height: 10.0,
            font_size: 12.0,
            color: "rgb(0, 0, 0)".to_string(),
            font_name: font_name.to_string(),
            font_weight,
        }
    }

    #[test]
    fn test_embedded_font_name() {
        assert_eq!(embedded_font_name("Open Sans", 700), "OpenSans-700");
        assert_eq!(embedded_font_name("Rubik", 400), "Rubik-400");
    }

    #[tokio::test]
    async fn test_generic_family_uses_builtin() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = offline_cache(tmp.path());

        assert_eq!(
            select_font(&cache, &edit("Arial", 400)).await,
            TextFont::Builtin(BuiltinFont::Helvetica)
        );
        assert_eq!(
            select_font(&cache, &edit("", 800)).await,
            TextFont::Builtin(BuiltinFont::HelveticaBold)
        );
    }

    #[tokio::test]
    async fn test_cached_web_font_is_loaded() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = offline_cache(tmp.path());
        std::fs::write(tmp.path().join("Open+Sans-600.ttf"), b"font bytes").unwrap();

        assert_eq!(
            select_font(&cache, &edit("Open Sans-SemiBold, sans-serif", 600)).await,
            TextFont::TrueType {
                name: "OpenSans-600".to_string(),
                data: b"font bytes".to_vec(),
            }
        );
    }

    #[tokio::test]
    async fn test_download_failure_falls_back() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = offline_cache(tmp.path());

        assert_eq!(
            select_font(&cache, &edit("Rubik", 700)).await,
            TextFont::Builtin(BuiltinFont::HelveticaBold)
        );
    }

    #[tokio::test]
    async fn test_unsafe_family_falls_back() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = offline_cache(tmp.path());

        assert_eq!(
            select_font(&cache, &edit("../../etc/passwd", 400)).await,
            TextFont::Builtin(BuiltinFont::Helvetica)
        );
    }
}
