//! Edit instructions as sent by the editor front-end

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::PdfEditError;

pub const DEFAULT_COLOR: &str = "rgb(0, 0, 0)";
pub const DEFAULT_FONT_WEIGHT: u32 = 400;
pub const BOLD_WEIGHT: u32 = 700;

/// Fraction of the font size the baseline sits above the box bottom
pub const BASELINE_DESCENT_RATIO: f64 = 0.2;

/// Families never fetched from the web font service
pub const GENERIC_FAMILIES: [&str; 5] = ["Georgia", "serif", "sans-serif", "Arial", "Helvetica"];

lazy_static! {
    static ref RGB_COLOR: Regex =
        Regex::new(r"^rgb\((\d+),\s*(\d+),\s*(\d+)\)").expect("valid rgb pattern");
}

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

fn default_font_weight() -> u32 {
    DEFAULT_FONT_WEIGHT
}

/// One text replacement.
///
/// Coordinates are in PDF points with the origin at the top-left corner of
/// the page and y growing downward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditInstruction {
    /// 1-based
    pub page_number: u32,
    /// Informational only
    #[serde(default)]
    pub original_text: String,
    pub new_text: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub font_size: f64,
    /// `rgb(r, g, b)` with 0-255 channels
    #[serde(default = "default_color")]
    pub color: String,
    /// CSS font-family list, e.g. `"Rubik, sans-serif"`
    #[serde(default)]
    pub font_name: String,
    #[serde(default = "default_font_weight")]
    pub font_weight: u32,
}

impl EditInstruction {
    /// Parse the JSON array carried in the `edits` form field
    pub fn parse_list(json: &str) -> Result<Vec<Self>, PdfEditError> {
        serde_json::from_str(json).map_err(|e| PdfEditError::InvalidEdits(e.to_string()))
    }

    pub fn rgb(&self) -> (f32, f32, f32) {
        parse_rgb_color(&self.color)
    }

    pub fn font_family(&self) -> &str {
        derive_font_family(&self.font_name)
    }

    /// Family to look up in the web font service, if any
    pub fn web_font_family(&self) -> Option<&str> {
        let family = self.font_family();
        (!family.is_empty() && !is_generic_family(family)).then_some(family)
    }

    /// Baseline position measured from the top of the page
    pub fn baseline_y(&self) -> f64 {
        self.y + self.height - self.font_size * BASELINE_DESCENT_RATIO
    }
}

/// Parse `rgb(r, g, b)` into 0-1 channels. Anything else is black.
pub fn parse_rgb_color(color: &str) -> (f32, f32, f32) {
    let Some(caps) = RGB_COLOR.captures(color) else {
        return (0.0, 0.0, 0.0);
    };
    let channel = |i: usize| -> f32 {
        let value = caps
            .get(i)
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .unwrap_or(u32::MAX);
        (value as f32 / 255.0).min(1.0)
    };
    (channel(1), channel(2), channel(3))
}

/// First family of a CSS font-family list with any style suffix removed:
/// `"Rubik-Bold, sans-serif"` becomes `"Rubik"`.
pub fn derive_font_family(font_name: &str) -> &str {
    let first = font_name.split(',').next().unwrap_or_default();
    first.split('-').next().unwrap_or_default().trim()
}

/// Exact, case-sensitive match against [`GENERIC_FAMILIES`]
pub fn is_generic_family(family: &str) -> bool {
    GENERIC_FAMILIES.contains(&family)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_parse_list_applies_defaults() {
        let json = r#"[{
            "pageNumber": 1,
            "newText": "Hello",
            "x": 100, "y": 50, "width": 200, "height": 20,
            "fontSize": 12
        }]"#;
        let edits = EditInstruction::parse_list(json).unwrap();
        assert_eq!(edits.len(), 1);

        let edit = &edits[0];
        assert_eq!(edit.page_number, 1);
        assert_eq!(edit.original_text, "");
        assert_eq!(edit.color, DEFAULT_COLOR);
        assert_eq!(edit.font_name, "");
        assert_eq!(edit.font_weight, 400);
        assert_eq!(edit.x, 100.0);
    }

    #[test]
    fn test_parse_list_reads_all_fields() {
        let json = r#"[{
            "pageNumber": 2,
            "originalText": "World",
            "newText": "Hi",
            "x": 10.5, "y": 20.25, "width": 50, "height": 12,
            "fontSize": 11.5,
            "color": "rgb(255, 0, 0)",
            "fontName": "Rubik, sans-serif",
            "fontWeight": 700
        }]"#;
        let edit = &EditInstruction::parse_list(json).unwrap()[0];
        assert_eq!(edit.original_text, "World");
        assert_eq!(edit.font_size, 11.5);
        assert_eq!(edit.font_family(), "Rubik");
        assert_eq!(edit.font_weight, 700);
        assert_eq!(edit.rgb(), (1.0, 0.0, 0.0));
    }

    #[test]
    fn test_parse_list_rejects_malformed_json() {
        assert!(matches!(
            EditInstruction::parse_list("not json"),
            Err(PdfEditError::InvalidEdits(_))
        ));
        // Missing newText
        assert!(matches!(
            EditInstruction::parse_list(
                r#"[{"pageNumber":1,"x":0,"y":0,"width":1,"height":1,"fontSize":1}]"#
            ),
            Err(PdfEditError::InvalidEdits(_))
        ));
    }

    #[test]
    fn test_parse_list_empty_array() {
        assert!(EditInstruction::parse_list("[]").unwrap().is_empty());
    }

    #[test]
    fn test_parse_rgb_color() {
        assert_eq!(parse_rgb_color("rgb(255, 0, 0)"), (1.0, 0.0, 0.0));
        assert_eq!(parse_rgb_color("rgb(0,255,0)"), (0.0, 1.0, 0.0));
        assert_eq!(parse_rgb_color("#ff0000"), (0.0, 0.0, 0.0));
        assert_eq!(parse_rgb_color(""), (0.0, 0.0, 0.0));
        assert_eq!(parse_rgb_color(" rgb(255, 0, 0)"), (0.0, 0.0, 0.0));
    }

    #[test]
    fn test_parse_rgb_color_scales_partial_channels() {
        let (r, g, b) = parse_rgb_color("rgb(255, 128, 0)");
        assert_eq!(r, 1.0);
        assert!((g - 0.502).abs() < 1e-3, "{}", g);
        assert_eq!(b, 0.0);
        assert_eq!(parse_rgb_color("rgb(0, 0, 0)"), (0.0, 0.0, 0.0));
    }

    #[test]
    fn test_parse_rgb_color_clamps_channels() {
        assert_eq!(parse_rgb_color("rgb(300, 999, 256)"), (1.0, 1.0, 1.0));
    }

    #[test]
    fn test_derive_font_family() {
        assert_eq!(derive_font_family("Rubik-Bold, sans-serif"), "Rubik");
        assert_eq!(derive_font_family("Rubik-Bold, Georgia, serif"), "Rubik");
        assert_eq!(derive_font_family("Arial"), "Arial");
        assert_eq!(derive_font_family("Open Sans"), "Open Sans");
        assert_eq!(derive_font_family("  Lato , serif"), "Lato");
        assert_eq!(derive_font_family(""), "");
        assert_eq!(derive_font_family("sans-serif"), "sans");
    }

    #[test]
    fn test_generic_families_are_exact_matches() {
        assert!(is_generic_family("Arial"));
        assert!(is_generic_family("serif"));
        assert!(!is_generic_family("arial"));
        assert!(!is_generic_family("Rubik"));
    }

    #[test]
    fn test_web_font_family() {
        let mut edit = EditInstruction::parse_list(
            r#"[{"pageNumber":1,"newText":"a","x":0,"y":0,"width":1,"height":1,"fontSize":1}]"#,
        )
        .unwrap()
        .remove(0);
        assert_eq!(edit.web_font_family(), None);

        edit.font_name = "Arial, sans-serif".to_string();
        assert_eq!(edit.web_font_family(), None);

        edit.font_name = "Rubik-Medium".to_string();
        assert_eq!(edit.web_font_family(), Some("Rubik"));
    }

    proptest! {
        #[test]
        fn prop_rgb_channels_scale_to_unit_range(r in 0u32..=255, g in 0u32..=255, b in 0u32..=255) {
            let (pr, pg, pb) = parse_rgb_color(&format!("rgb({}, {}, {})", r, g, b));
            prop_assert!((pr - r as f32 / 255.0).abs() < 1e-6);
            prop_assert!((pg - g as f32 / 255.0).abs() < 1e-6);
            prop_assert!((pb - b as f32 / 255.0).abs() < 1e-6);
        }

        #[test]
        fn prop_non_rgb_input_is_black(s in "[^r].*") {
            prop_assert_eq!(parse_rgb_color(&s), (0.0, 0.0, 0.0));
        }

        #[test]
        fn prop_derived_family_has_no_separators(s in ".*") {
            let family = derive_font_family(&s);
            prop_assert!(!family.contains(','));
            prop_assert!(!family.contains('-'));
            prop_assert_eq!(family, family.trim());
        }
    }
}
