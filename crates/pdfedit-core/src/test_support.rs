//! Shared fixtures for unit tests

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, Stream};

/// Letter-sized document with `num_pages` pages, each showing "Page N" in
/// Helvetica from its own content stream.
pub(crate) fn create_test_pdf(num_pages: u32) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut page_ids = Vec::new();
    for i in 0..num_pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), Object::Integer(12)]),
                Operation::new("Td", vec![Object::Integer(100), Object::Integer(700)]),
                Operation::new(
                    "Tj",
                    vec![Object::String(
                        format!("Page {}", i + 1).into_bytes(),
                        lopdf::StringFormat::Literal,
                    )],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.encode().unwrap()));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => Object::Reference(content_id),
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => Object::Reference(font_id) },
            },
        });
        page_ids.push(page_id);
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids.into_iter().map(Object::Reference).collect::<Vec<_>>(),
            "Count" => num_pages as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

fn put_u16(buf: &mut Vec<u8>, v: u16) {
    buf.extend_from_slice(&v.to_be_bytes());
}

fn put_i16(buf: &mut Vec<u8>, v: i16) {
    buf.extend_from_slice(&v.to_be_bytes());
}

fn put_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_be_bytes());
}

/// Smallest TrueType program ttf-parser accepts: five glyphs without
/// outlines mapping `H e l o` to glyphs 1-4, 1000 units per em.
/// Advances are 500 600 500 250 550.
pub(crate) fn minimal_truetype() -> Vec<u8> {
    const ADVANCES: [u16; 5] = [500, 600, 500, 250, 550];
    const MAPPING: [(u16, u16); 4] = [(0x48, 1), (0x65, 2), (0x6C, 3), (0x6F, 4)];

    let mut head = Vec::new();
    put_u32(&mut head, 0x0001_0000);
    put_u32(&mut head, 0x0001_0000);
    put_u32(&mut head, 0);
    put_u32(&mut head, 0x5F0F_3CF5);
    put_u16(&mut head, 0);
    put_u16(&mut head, 1000);
    head.extend_from_slice(&[0; 16]);
    for v in [0i16, -200, 600, 800] {
        put_i16(&mut head, v);
    }
    put_u16(&mut head, 0);
    put_u16(&mut head, 8);
    put_i16(&mut head, 2);
    put_i16(&mut head, 0);
    put_i16(&mut head, 0);
    assert_eq!(head.len(), 54);

    let mut hhea = Vec::new();
    put_u32(&mut hhea, 0x0001_0000);
    put_i16(&mut hhea, 800);
    put_i16(&mut hhea, -200);
    put_i16(&mut hhea, 0);
    put_u16(&mut hhea, 600);
    for v in [0i16, 0, 600, 1, 0, 0, 0, 0, 0, 0, 0] {
        put_i16(&mut hhea, v);
    }
    put_u16(&mut hhea, ADVANCES.len() as u16);
    assert_eq!(hhea.len(), 36);

    let mut maxp = Vec::new();
    put_u32(&mut maxp, 0x0000_5000);
    put_u16(&mut maxp, ADVANCES.len() as u16);

    let mut hmtx = Vec::new();
    for advance in ADVANCES {
        put_u16(&mut hmtx, advance);
        put_i16(&mut hmtx, 0);
    }

    // Format 4, one segment per character plus the 0xFFFF terminator
    let mut segments: Vec<(u16, u16)> = MAPPING.to_vec();
    segments.push((0xFFFF, 0));
    let seg_count = segments.len() as u16;
    let mut cmap = Vec::new();
    put_u16(&mut cmap, 0);
    put_u16(&mut cmap, 1);
    put_u16(&mut cmap, 3);
    put_u16(&mut cmap, 1);
    put_u32(&mut cmap, 12);
    put_u16(&mut cmap, 4);
    put_u16(&mut cmap, 16 + 8 * seg_count);
    put_u16(&mut cmap, 0);
    put_u16(&mut cmap, seg_count * 2);
    put_u16(&mut cmap, 8);
    put_u16(&mut cmap, 2);
    put_u16(&mut cmap, seg_count * 2 - 8);
    for (code, _) in &segments {
        put_u16(&mut cmap, *code);
    }
    put_u16(&mut cmap, 0);
    for (code, _) in &segments {
        put_u16(&mut cmap, *code);
    }
    for (code, glyph) in &segments {
        put_u16(&mut cmap, glyph.wrapping_sub(*code));
    }
    for _ in &segments {
        put_u16(&mut cmap, 0);
    }

    // Table records must be sorted by tag
    let tables: [(&[u8; 4], Vec<u8>); 5] = [
        (b"cmap", cmap),
        (b"head", head),
        (b"hhea", hhea),
        (b"hmtx", hmtx),
        (b"maxp", maxp),
    ];

    let mut font = Vec::new();
    put_u32(&mut font, 0x0001_0000);
    put_u16(&mut font, tables.len() as u16);
    put_u16(&mut font, 64);
    put_u16(&mut font, 2);
    put_u16(&mut font, 16);

    let mut offset = 12 + 16 * tables.len();
    let mut body = Vec::new();
    for (tag, data) in &tables {
        font.extend_from_slice(*tag);
        put_u32(&mut font, 0);
        put_u32(&mut font, offset as u32);
        put_u32(&mut font, data.len() as u32);

        body.extend_from_slice(data);
        while body.len() % 4 != 0 {
            body.push(0);
        }
        offset = 12 + 16 * tables.len() + body.len();
    }
    font.extend_from_slice(&body);
    font
}

#[test]
fn test_minimal_truetype_parses() {
    let data = minimal_truetype();
    let face = ttf_parser::Face::parse(&data, 0).unwrap();
    assert_eq!(face.units_per_em(), 1000);
    assert_eq!(face.number_of_glyphs(), 5);
    assert_eq!(face.glyph_index('H'), Some(ttf_parser::GlyphId(1)));
    assert_eq!(face.glyph_index('o'), Some(ttf_parser::GlyphId(4)));
    assert_eq!(face.glyph_index('!'), None);
    assert_eq!(face.glyph_hor_advance(ttf_parser::GlyphId(1)), Some(600));
}
