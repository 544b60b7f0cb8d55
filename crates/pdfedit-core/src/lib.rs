//! PDF text replacement and font extraction
//!
//! This crate edits documents in memory using lopdf:
//! - `extract_fonts`: every embedded font program with per-font metadata
//! - `PdfEditor` / `apply_edits`: cover a box with white and draw new text
//!   over it, with an embedded TrueType font or a built-in Helvetica face
//!
//! Instruction coordinates use a top-left origin; conversion to PDF space
//! happens per page against its visible area (CropBox clipped to MediaBox).

pub mod editor;
pub mod error;
pub mod extract;
pub mod fonts;
pub mod instruction;
mod page;

#[cfg(test)]
mod test_support;

pub use editor::{apply_edits, PdfEditor};
pub use error::PdfEditError;
pub use extract::{extract_fonts, FontExtraction, FontMetadata};
pub use fonts::{encode_win_ansi, AppliedFont, BuiltinFont, TextFont};
pub use instruction::{
    derive_font_family, is_generic_family, parse_rgb_color, EditInstruction, BOLD_WEIGHT,
    DEFAULT_COLOR, DEFAULT_FONT_WEIGHT, GENERIC_FAMILIES,
};
