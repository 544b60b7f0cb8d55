//! Font objects for replacement text
//!
//! TrueType programs are embedded as Type0/Identity-H composite fonts so
//! any glyph in the program can be shown. Content strings are two-byte
//! glyph ids; the `ToUnicode` map and the `W` widths are written from the
//! glyphs actually used once all edits are applied.
//!
//! The built-in fallback is one of the standard 14 Helvetica faces with
//! WinAnsi encoding.

use std::collections::BTreeMap;
use std::io::Write;

use flate2::{write::ZlibEncoder, Compression};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use ttf_parser::{Face, GlyphId};

use crate::error::PdfEditError;
use crate::instruction::BOLD_WEIGHT;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinFont {
    Helvetica,
    HelveticaBold,
}

impl BuiltinFont {
    pub fn for_weight(weight: u32) -> Self {
        if weight >= BOLD_WEIGHT {
            BuiltinFont::HelveticaBold
        } else {
            BuiltinFont::Helvetica
        }
    }

    pub fn base_font(self) -> &'static str {
        match self {
            BuiltinFont::Helvetica => "Helvetica",
            BuiltinFont::HelveticaBold => "Helvetica-Bold",
        }
    }

    pub(crate) fn add_to(self, doc: &mut Document) -> ObjectId {
        doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => self.base_font(),
            "Encoding" => "WinAnsiEncoding",
        })
    }
}

/// Font requested for one edit
#[derive(Debug, Clone, PartialEq)]
pub enum TextFont {
    /// TrueType program. `name` identifies it within the output document;
    /// the same name is embedded once.
    TrueType { name: String, data: Vec<u8> },
    Builtin(BuiltinFont),
}

/// Font an edit was actually drawn with
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppliedFont {
    TrueType(String),
    Builtin(BuiltinFont),
}

/// Encode text for a WinAnsi simple font; characters outside the encoding
/// become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars().map(win_ansi_byte).collect()
}

fn win_ansi_byte(ch: char) -> u8 {
    let code = ch as u32;
    match code {
        0x20..=0x7E | 0xA0..=0xFF => code as u8,
        _ => match ch {
            '€' => 0x80,
            '‚' => 0x82,
            'ƒ' => 0x83,
            '„' => 0x84,
            '…' => 0x85,
            '†' => 0x86,
            '‡' => 0x87,
            'ˆ' => 0x88,
            '‰' => 0x89,
            'Š' => 0x8A,
            '‹' => 0x8B,
            'Œ' => 0x8C,
            'Ž' => 0x8E,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '•' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '˜' => 0x98,
            '™' => 0x99,
            'š' => 0x9A,
            '›' => 0x9B,
            'œ' => 0x9C,
            'ž' => 0x9E,
            'Ÿ' => 0x9F,
            _ => b'?',
        },
    }
}

/// A TrueType program embedded in the document being edited
pub(crate) struct EmbeddedFont {
    pub font_id: ObjectId,
    cid_font_id: ObjectId,
    to_unicode_id: ObjectId,
    data: Vec<u8>,
    units_per_em: f64,
    /// glyph id -> (first character drawn with it, width in 1/1000 em)
    used: BTreeMap<u16, (char, i64)>,
}

impl EmbeddedFont {
    /// Validate the program with ttf-parser and add the font objects.
    pub fn embed(doc: &mut Document, name: &str, data: Vec<u8>) -> Result<Self, PdfEditError> {
        let face =
            Face::parse(&data, 0).map_err(|e| PdfEditError::Font(format!("{}: {}", name, e)))?;

        let units_per_em = face.units_per_em() as f64;
        let scale = |v: i16| (v as f64 * 1000.0 / units_per_em).round() as i64;
        let bbox = face.global_bounding_box();
        let ascent = scale(face.ascender());
        let descent = scale(face.descender());
        let cap_height = scale(face.capital_height().unwrap_or_else(|| face.ascender()));
        let base_font = Object::Name(pdf_font_name(name).into_bytes());

        let font_file = Stream::new(
            dictionary! {
                "Length1" => data.len() as i64,
                "Filter" => "FlateDecode",
            },
            compress(&data)?,
        );
        let font_file_id = doc.add_object(font_file);

        let descriptor_id = doc.add_object(dictionary! {
            "Type" => "FontDescriptor",
            "FontName" => base_font.clone(),
            "Flags" => 32,
            "FontBBox" => vec![
                scale(bbox.x_min).into(),
                scale(bbox.y_min).into(),
                scale(bbox.x_max).into(),
                scale(bbox.y_max).into(),
            ],
            "ItalicAngle" => 0,
            "Ascent" => ascent,
            "Descent" => descent,
            "CapHeight" => cap_height,
            "StemV" => 80,
            "FontFile2" => Object::Reference(font_file_id),
        });

        let cid_font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "CIDFontType2",
            "BaseFont" => base_font.clone(),
            "CIDSystemInfo" => dictionary! {
                "Registry" => Object::string_literal("Adobe"),
                "Ordering" => Object::string_literal("Identity"),
                "Supplement" => 0,
            },
            "FontDescriptor" => Object::Reference(descriptor_id),
            "W" => Object::Array(Vec::new()),
            "CIDToGIDMap" => "Identity",
        });

        let to_unicode_id = doc.add_object(to_unicode_stream(&BTreeMap::new()));

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "BaseFont" => base_font,
            "Encoding" => "Identity-H",
            "DescendantFonts" => vec![Object::Reference(cid_font_id)],
            "ToUnicode" => Object::Reference(to_unicode_id),
        });

        Ok(Self {
            font_id,
            cid_font_id,
            to_unicode_id,
            data,
            units_per_em,
            used: BTreeMap::new(),
        })
    }

    /// Map text to big-endian glyph ids, recording each glyph used.
    /// Characters missing from the font map to glyph 0.
    pub fn encode(&mut self, text: &str) -> Vec<u8> {
        let Ok(face) = Face::parse(&self.data, 0) else {
            return Vec::new();
        };

        let mut out = Vec::with_capacity(text.len() * 2);
        for ch in text.chars() {
            let glyph = face.glyph_index(ch).unwrap_or(GlyphId(0));
            if glyph.0 != 0 {
                let advance = face.glyph_hor_advance(glyph).unwrap_or(0) as f64;
                let width = (advance * 1000.0 / self.units_per_em).round() as i64;
                self.used.entry(glyph.0).or_insert((ch, width));
            }
            out.extend_from_slice(&glyph.0.to_be_bytes());
        }
        out
    }

    /// Write the widths and `ToUnicode` map for the glyphs used so far.
    pub fn finish(&self, doc: &mut Document) -> Result<(), PdfEditError> {
        let mut widths = Vec::with_capacity(self.used.len() * 2);
        for (glyph, (_, width)) in &self.used {
            widths.push(Object::Integer(*glyph as i64));
            widths.push(Object::Array(vec![Object::Integer(*width)]));
        }
        doc.get_object_mut(self.cid_font_id)?
            .as_dict_mut()?
            .set("W", Object::Array(widths));

        let chars: BTreeMap<u16, char> = self.used.iter().map(|(g, (c, _))| (*g, *c)).collect();
        doc.objects
            .insert(self.to_unicode_id, Object::Stream(to_unicode_stream(&chars)));
        Ok(())
    }
}

/// PDF font names may not contain delimiters or whitespace
fn pdf_font_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect();
    if cleaned.is_empty() {
        "EmbeddedFont".to_string()
    } else {
        cleaned
    }
}

fn compress(data: &[u8]) -> Result<Vec<u8>, PdfEditError> {
    let failed = |e: std::io::Error| {
        PdfEditError::OperationError(format!("Failed to compress font: {}", e))
    };
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).map_err(failed)?;
    encoder.finish().map_err(failed)
}

fn to_unicode_stream(glyphs: &BTreeMap<u16, char>) -> Stream {
    Stream::new(Dictionary::new(), to_unicode_cmap(glyphs).into_bytes())
}

fn to_unicode_cmap(glyphs: &BTreeMap<u16, char>) -> String {
    let entries: Vec<(&u16, &char)> = glyphs.iter().collect();

    let mut out = String::new();
    out.push_str("/CIDInit /ProcSet findresource begin\n");
    out.push_str("12 dict begin\n");
    out.push_str("begincmap\n");
    out.push_str("/CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n");
    out.push_str("/CMapName /Adobe-Identity-UCS def\n");
    out.push_str("/CMapType 2 def\n");
    out.push_str("1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n");

    // bfchar blocks hold at most 100 entries
    for chunk in entries.chunks(100) {
        out.push_str(&format!("{} beginbfchar\n", chunk.len()));
        for (glyph, ch) in chunk {
            let mut units = [0u16; 2];
            let utf16: String = ch
                .encode_utf16(&mut units)
                .iter()
                .map(|u| format!("{:04X}", u))
                .collect();
            out.push_str(&format!("<{:04X}> <{}>\n", glyph, utf16));
        }
        out.push_str("endbfchar\n");
    }

    out.push_str("endcmap\n");
    out.push_str("CMapName currentdict /CMap defineresource pop\n");
    out.push_str("end\nend\n");
    out
}
