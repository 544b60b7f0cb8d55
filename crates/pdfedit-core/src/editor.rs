//! Apply edit instructions to a loaded document

use std::collections::{BTreeMap, HashMap, HashSet};

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, StringFormat};
use tracing::{debug, warn};

use crate::error::PdfEditError;
use crate::fonts::{encode_win_ansi, AppliedFont, BuiltinFont, EmbeddedFont, TextFont};
use crate::instruction::EditInstruction;
use crate::page;

/// Leading between lines of multi-line replacement text, as a multiple of
/// the font size
const LINE_HEIGHT: f64 = 1.2;

/// An open document collecting edits.
///
/// Each edit draws a white rectangle over its box and writes the new text
/// on top. Edits are appended after all existing page content in the order
/// they are applied, so later edits paint over earlier ones.
pub struct PdfEditor {
    doc: Document,
    pages: BTreeMap<u32, ObjectId>,
    isolated_pages: HashSet<ObjectId>,
    builtin_fonts: HashMap<BuiltinFont, ObjectId>,
    embedded_fonts: HashMap<String, EmbeddedFont>,
    rejected_fonts: HashSet<String>,
    page_font_names: HashMap<(ObjectId, ObjectId), Vec<u8>>,
}

impl PdfEditor {
    pub fn load(bytes: &[u8]) -> Result<Self, PdfEditError> {
        let doc =
            Document::load_mem(bytes).map_err(|e| PdfEditError::InvalidDocument(e.to_string()))?;
        let pages = doc.get_pages();
        Ok(Self {
            doc,
            pages,
            isolated_pages: HashSet::new(),
            builtin_fonts: HashMap::new(),
            embedded_fonts: HashMap::new(),
            rejected_fonts: HashSet::new(),
            page_font_names: HashMap::new(),
        })
    }

    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn page_id(&self, page_number: u32) -> Result<ObjectId, PdfEditError> {
        self.pages
            .get(&page_number)
            .copied()
            .ok_or(PdfEditError::PageOutOfRange {
                page: page_number,
                total: self.page_count(),
            })
    }

    /// Fail on the first edit whose page does not exist
    pub fn check_edits<'a>(
        &self,
        edits: impl IntoIterator<Item = &'a EditInstruction>,
    ) -> Result<(), PdfEditError> {
        for edit in edits {
            self.page_id(edit.page_number)?;
        }
        Ok(())
    }

    /// Draw one replacement. A TrueType program that cannot be parsed is
    /// replaced by the built-in font for the edit's weight; the returned
    /// value says which font was used.
    pub fn apply(
        &mut self,
        edit: &EditInstruction,
        font: TextFont,
    ) -> Result<AppliedFont, PdfEditError> {
        let page_id = self.page_id(edit.page_number)?;

        if self.isolated_pages.insert(page_id) {
            page::isolate_contents(&mut self.doc, page_id)?;
        }

        let (applied, font_id) = self.prepare_font(font, edit.font_weight);
        let resource = self.font_resource(page_id, font_id)?;

        let format = match applied {
            AppliedFont::TrueType(_) => StringFormat::Hexadecimal,
            AppliedFont::Builtin(_) => StringFormat::Literal,
        };
        let lines: Vec<Object> = edit
            .new_text
            .split('\n')
            .map(|line| {
                let encoded = self.encode(&applied, line.trim_end_matches('\r'));
                Object::String(encoded, format)
            })
            .collect();

        let (left, top) = page::page_origin(&self.doc, page_id);
        let content = Content {
            operations: replacement_operations(edit, left, top, resource, lines),
        };
        let bytes = content
            .encode()
            .map_err(|e| PdfEditError::OperationError(e.to_string()))?;
        page::append_content(&mut self.doc, page_id, bytes)?;

        debug!(
            "Replaced {:?} with {:?} on page {}",
            edit.original_text, edit.new_text, edit.page_number
        );
        Ok(applied)
    }

    /// Serialize the document with every edit applied
    pub fn save(mut self) -> Result<Vec<u8>, PdfEditError> {
        for font in self.embedded_fonts.values() {
            font.finish(&mut self.doc)?;
        }

        let mut output = Vec::new();
        self.doc
            .save_to(&mut output)
            .map_err(|e| PdfEditError::OperationError(e.to_string()))?;
        Ok(output)
    }

    fn prepare_font(&mut self, font: TextFont, weight: u32) -> (AppliedFont, ObjectId) {
        match font {
            TextFont::TrueType { name, data } => {
                if let Some(embedded) = self.embedded_fonts.get(&name) {
                    return (AppliedFont::TrueType(name), embedded.font_id);
                }
                if !self.rejected_fonts.contains(&name) {
                    match EmbeddedFont::embed(&mut self.doc, &name, data) {
                        Ok(embedded) => {
                            let font_id = embedded.font_id;
                            self.embedded_fonts.insert(name.clone(), embedded);
                            return (AppliedFont::TrueType(name), font_id);
                        }
                        Err(e) => {
                            warn!("Falling back to built-in font: {}", e);
                            self.rejected_fonts.insert(name);
                        }
                    }
                }
                self.builtin(BuiltinFont::for_weight(weight))
            }
            TextFont::Builtin(builtin) => self.builtin(builtin),
        }
    }

    fn builtin(&mut self, builtin: BuiltinFont) -> (AppliedFont, ObjectId) {
        let font_id = *self
            .builtin_fonts
            .entry(builtin)
            .or_insert_with(|| builtin.add_to(&mut self.doc));
        (AppliedFont::Builtin(builtin), font_id)
    }

    fn font_resource(
        &mut self,
        page_id: ObjectId,
        font_id: ObjectId,
    ) -> Result<Vec<u8>, PdfEditError> {
        if let Some(name) = self.page_font_names.get(&(page_id, font_id)) {
            return Ok(name.clone());
        }
        let name = page::add_font_resource(&mut self.doc, page_id, font_id)?;
        self.page_font_names.insert((page_id, font_id), name.clone());
        Ok(name)
    }

    fn encode(&mut self, font: &AppliedFont, text: &str) -> Vec<u8> {
        match font {
            AppliedFont::TrueType(name) => self
                .embedded_fonts
                .get_mut(name)
                .map(|embedded| embedded.encode(text))
                .unwrap_or_default(),
            AppliedFont::Builtin(_) => encode_win_ansi(text),
        }
    }
}

/// White cover plus text, isolated in its own graphics state. `left`/`top`
/// convert the top-left based instruction coordinates to PDF space.
fn replacement_operations(
    edit: &EditInstruction,
    left: f64,
    top: f64,
    font_resource: Vec<u8>,
    lines: Vec<Object>,
) -> Vec<Operation> {
    let real = |v: f64| Object::Real(v as f32);
    let white = || vec![Object::Real(1.0), Object::Real(1.0), Object::Real(1.0)];
    let (r, g, b) = edit.rgb();
    let x = left + edit.x;

    let mut ops = vec![
        Operation::new("q", vec![]),
        Operation::new("rg", white()),
        Operation::new("RG", white()),
        Operation::new(
            "re",
            vec![
                real(x),
                real(top - (edit.y + edit.height)),
                real(edit.width),
                real(edit.height),
            ],
        ),
        Operation::new("B", vec![]),
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![Object::Name(font_resource), real(edit.font_size)]),
        Operation::new("rg", vec![Object::Real(r), Object::Real(g), Object::Real(b)]),
        Operation::new("Tr", vec![Object::Integer(0)]),
        Operation::new("TL", vec![real(edit.font_size * LINE_HEIGHT)]),
        Operation::new("Td", vec![real(x), real(top - edit.baseline_y())]),
    ];

    for (i, line) in lines.into_iter().enumerate() {
        if i > 0 {
            ops.push(Operation::new("T*", vec![]));
        }
        ops.push(Operation::new("Tj", vec![line]));
    }

    ops.push(Operation::new("ET", vec![]));
    ops.push(Operation::new("Q", vec![]));
    ops
}

/// Load, check every page number, apply each edit with its font in order,
/// and save.
pub fn apply_edits(
    pdf_bytes: &[u8],
    edits: Vec<(EditInstruction, TextFont)>,
) -> Result<Vec<u8>, PdfEditError> {
    let mut editor = PdfEditor::load(pdf_bytes)?;
    editor.check_edits(edits.iter().map(|(edit, _)| edit))?;
    for (edit, font) in edits {
        editor.apply(&edit, font)?;
    }
    editor.save()
}
