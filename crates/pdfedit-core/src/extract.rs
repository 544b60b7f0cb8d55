//! Embedded font extraction

use std::collections::BTreeMap;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use lopdf::{Dictionary, Document, Object, Stream};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::PdfEditError;
use crate::page::{font_resources, resolve};

/// Everything embedded in a document, keyed by font name
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FontExtraction {
    /// Base64 of the decoded font program
    pub fonts: BTreeMap<String, String>,
    pub metadata: BTreeMap<String, FontMetadata>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FontMetadata {
    /// Font dictionary `/Subtype`, e.g. `TrueType`, `Type1`, `Type0`
    #[serde(rename = "type")]
    pub font_type: String,
    /// Extension matching the program format
    pub ext: String,
    /// Program size in bytes
    pub size: usize,
    /// 1-based pages referencing the font, ascending
    pub pages: Vec<u32>,
}

struct FontProgram {
    data: Vec<u8>,
    ext: &'static str,
}

/// Collect every embedded font program, one entry per distinct font name.
///
/// Fonts without an embedded program are skipped; a font whose program
/// cannot be read is logged and skipped without failing the extraction.
pub fn extract_fonts(pdf_bytes: &[u8]) -> Result<FontExtraction, PdfEditError> {
    let doc =
        Document::load_mem(pdf_bytes).map_err(|e| PdfEditError::InvalidDocument(e.to_string()))?;

    let mut result = FontExtraction::default();
    for (page_number, page_id) in doc.get_pages() {
        for (resource_name, font) in font_resources(&doc, page_id) {
            let Ok(font_dict) = resolve(&doc, font).as_dict() else {
                continue;
            };
            let name = font_name(font_dict, &resource_name);

            if let Some(metadata) = result.metadata.get_mut(&name) {
                if !metadata.pages.contains(&page_number) {
                    metadata.pages.push(page_number);
                }
                continue;
            }

            match font_program(&doc, font_dict) {
                Ok(Some(program)) if !program.data.is_empty() => {
                    debug!(
                        "Extracted {} ({} bytes, {})",
                        name,
                        program.data.len(),
                        program.ext
                    );
                    result.metadata.insert(
                        name.clone(),
                        FontMetadata {
                            font_type: name_value(font_dict, b"Subtype")
                                .unwrap_or_else(|| "unknown".to_string()),
                            ext: program.ext.to_string(),
                            size: program.data.len(),
                            pages: vec![page_number],
                        },
                    );
                    result.fonts.insert(name, STANDARD.encode(&program.data));
                }
                Ok(_) => debug!("Font {} has no embedded program", name),
                Err(e) => warn!("Could not extract font {}: {}", name, e),
            }
        }
    }

    Ok(result)
}

fn name_value(dict: &Dictionary, key: &[u8]) -> Option<String> {
    dict.get(key)
        .and_then(Object::as_name)
        .ok()
        .map(|n| String::from_utf8_lossy(n).into_owned())
}

/// `/BaseFont`, or the resource key when the dictionary has none
fn font_name(font_dict: &Dictionary, resource_name: &[u8]) -> String {
    name_value(font_dict, b"BaseFont")
        .unwrap_or_else(|| String::from_utf8_lossy(resource_name).into_owned())
}

fn font_program(
    doc: &Document,
    font_dict: &Dictionary,
) -> Result<Option<FontProgram>, PdfEditError> {
    // Composite fonts keep their descriptor on the descendant
    let owner = if name_value(font_dict, b"Subtype").as_deref() == Some("Type0") {
        let descendant = font_dict
            .get(b"DescendantFonts")
            .map(|d| resolve(doc, d))
            .and_then(Object::as_array)
            .ok()
            .and_then(|fonts| fonts.first())
            .map(|d| resolve(doc, d))
            .and_then(|d| d.as_dict().ok());
        match descendant {
            Some(dict) => dict,
            None => return Ok(None),
        }
    } else {
        font_dict
    };

    let Some(descriptor) = owner
        .get(b"FontDescriptor")
        .ok()
        .map(|d| resolve(doc, d))
        .and_then(|d| d.as_dict().ok())
    else {
        return Ok(None);
    };

    for key in [&b"FontFile2"[..], b"FontFile", b"FontFile3"] {
        let Ok(entry) = descriptor.get(key) else {
            continue;
        };
        let stream = resolve(doc, entry)
            .as_stream()
            .map_err(|e| PdfEditError::Font(e.to_string()))?;
        let data = stream_data(stream)?;
        return Ok(Some(FontProgram {
            data,
            ext: program_extension(key, stream),
        }));
    }

    Ok(None)
}

fn stream_data(stream: &Stream) -> Result<Vec<u8>, PdfEditError> {
    if stream.dict.has(b"Filter") {
        stream
            .decompressed_content()
            .map_err(|e| PdfEditError::Font(e.to_string()))
    } else {
        Ok(stream.content.clone())
    }
}

fn program_extension(key: &[u8], stream: &Stream) -> &'static str {
    match key {
        b"FontFile" => "pfa",
        b"FontFile2" => "ttf",
        _ => match name_value(&stream.dict, b"Subtype").as_deref() {
            Some("OpenType") => "otf",
            Some("Type1C") | Some("CIDFontType0C") => "cff",
            _ => "bin",
        },
    }
}
