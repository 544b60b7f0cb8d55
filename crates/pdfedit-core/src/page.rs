//! Page tree helpers: inherited attributes, content streams, font resources

use std::collections::HashSet;

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use crate::error::PdfEditError;

/// Bound on reference chains and `Parent` walks in malformed files
const MAX_DEPTH: usize = 32;

/// Nesting limit for Form XObjects inside Form XObjects
const MAX_FORM_DEPTH: usize = 8;

/// US Letter, used when no MediaBox is found anywhere up the tree
const DEFAULT_MEDIA_BOX: [f64; 4] = [0.0, 0.0, 612.0, 792.0];

/// Prefix for font resources added by the editor
const FONT_RESOURCE_PREFIX: &str = "FEd";

/// Follow references until a direct object is reached
pub(crate) fn resolve<'a>(doc: &'a Document, mut obj: &'a Object) -> &'a Object {
    for _ in 0..MAX_DEPTH {
        match obj {
            Object::Reference(id) => match doc.get_object(*id) {
                Ok(target) => obj = target,
                Err(_) => return obj,
            },
            _ => return obj,
        }
    }
    obj
}

/// Look up a page attribute, walking `Parent` links for inheritable keys
pub(crate) fn inherited<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> Option<&'a Object> {
    let mut dict = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_DEPTH {
        if let Ok(value) = dict.get(key) {
            return Some(resolve(doc, value));
        }
        let parent = dict.get(b"Parent").ok()?;
        dict = resolve(doc, parent).as_dict().ok()?;
    }
    None
}

fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

/// Normalized `[x0, y0, x1, y1]` rectangle stored under `key`
fn page_box(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<[f64; 4]> {
    let values: Vec<f64> = inherited(doc, page_id, key)?
        .as_array()
        .ok()?
        .iter()
        .filter_map(|o| number(resolve(doc, o)))
        .collect();
    let [a, b, c, d] = <[f64; 4]>::try_from(values).ok()?;
    Some([a.min(c), b.min(d), a.max(c), b.max(d)])
}

/// `(left, top)` of the visible page area: the CropBox clipped to the
/// MediaBox, or the MediaBox when there is no usable CropBox.
pub(crate) fn page_origin(doc: &Document, page_id: ObjectId) -> (f64, f64) {
    let media = page_box(doc, page_id, b"MediaBox").unwrap_or(DEFAULT_MEDIA_BOX);
    let visible = page_box(doc, page_id, b"CropBox")
        .map(|crop| {
            [
                crop[0].max(media[0]),
                crop[1].max(media[1]),
                crop[2].min(media[2]),
                crop[3].min(media[3]),
            ]
        })
        .filter(|clipped| clipped[0] < clipped[2] && clipped[1] < clipped[3])
        .unwrap_or(media);

    (visible[0], visible[3])
}

/// Current `Contents` of a page as a flat list of stream references
pub(crate) fn content_entries(doc: &Document, page_id: ObjectId) -> Vec<Object> {
    let Ok(page) = doc.get_dictionary(page_id) else {
        return Vec::new();
    };
    match page.get(b"Contents") {
        Ok(Object::Reference(id)) => match doc.get_object(*id) {
            Ok(Object::Array(items)) => items.clone(),
            _ => vec![Object::Reference(*id)],
        },
        Ok(Object::Array(items)) => items.clone(),
        _ => Vec::new(),
    }
}

fn set_contents(
    doc: &mut Document,
    page_id: ObjectId,
    entries: Vec<Object>,
) -> Result<(), PdfEditError> {
    let page = doc.get_object_mut(page_id)?.as_dict_mut()?;
    page.set("Contents", Object::Array(entries));
    Ok(())
}

fn add_stream(doc: &mut Document, content: Vec<u8>) -> Object {
    Object::Reference(doc.add_object(Stream::new(Dictionary::new(), content)))
}

/// Wrap the existing contents in `q`/`Q` so graphics state they leave
/// behind cannot leak into content appended afterwards.
pub(crate) fn isolate_contents(
    doc: &mut Document,
    page_id: ObjectId,
) -> Result<(), PdfEditError> {
    let existing = content_entries(doc, page_id);
    if existing.is_empty() {
        return Ok(());
    }

    let mut entries = Vec::with_capacity(existing.len() + 2);
    entries.push(add_stream(doc, b"q\n".to_vec()));
    entries.extend(existing);
    entries.push(add_stream(doc, b"\nQ\n".to_vec()));
    set_contents(doc, page_id, entries)
}

/// Append a content stream after everything already on the page
pub(crate) fn append_content(
    doc: &mut Document,
    page_id: ObjectId,
    content: Vec<u8>,
) -> Result<(), PdfEditError> {
    let mut entries = content_entries(doc, page_id);
    entries.push(add_stream(doc, content));
    set_contents(doc, page_id, entries)
}

/// Make sure the page carries its own `Resources` entry, copying inherited
/// resources onto it when needed.
fn ensure_own_resources(doc: &mut Document, page_id: ObjectId) -> Result<(), PdfEditError> {
    if doc.get_dictionary(page_id)?.has(b"Resources") {
        return Ok(());
    }
    let resources = inherited(doc, page_id, b"Resources")
        .and_then(|obj| obj.as_dict().ok())
        .cloned()
        .unwrap_or_else(Dictionary::new);
    doc.get_object_mut(page_id)?
        .as_dict_mut()?
        .set("Resources", Object::Dictionary(resources));
    Ok(())
}

fn resources_mut(
    doc: &mut Document,
    page_id: ObjectId,
) -> Result<&mut Dictionary, PdfEditError> {
    let resources_ref = match doc.get_dictionary(page_id)?.get(b"Resources") {
        Ok(Object::Reference(id)) => Some(*id),
        _ => None,
    };
    let resources = match resources_ref {
        Some(id) => doc.get_object_mut(id)?.as_dict_mut()?,
        None => doc
            .get_object_mut(page_id)?
            .as_dict_mut()?
            .get_mut(b"Resources")?
            .as_dict_mut()?,
    };
    Ok(resources)
}

/// Register `font_id` in the page's `/Font` resources under a fresh name and
/// return that name.
pub(crate) fn add_font_resource(
    doc: &mut Document,
    page_id: ObjectId,
    font_id: ObjectId,
) -> Result<Vec<u8>, PdfEditError> {
    ensure_own_resources(doc, page_id)?;

    let font_dict_ref = match resources_mut(doc, page_id)?.get(b"Font") {
        Ok(Object::Reference(id)) => Some(*id),
        _ => None,
    };

    let fonts = match font_dict_ref {
        Some(id) => doc.get_object_mut(id)?.as_dict_mut()?,
        None => {
            let resources = resources_mut(doc, page_id)?;
            if !matches!(resources.get(b"Font"), Ok(Object::Dictionary(_))) {
                resources.set("Font", Object::Dictionary(Dictionary::new()));
            }
            resources.get_mut(b"Font")?.as_dict_mut()?
        }
    };

    let name = (1u32..)
        .map(|n| format!("{}{}", FONT_RESOURCE_PREFIX, n).into_bytes())
        .find(|candidate| !fonts.has(candidate))
        .unwrap_or_else(|| FONT_RESOURCE_PREFIX.as_bytes().to_vec());
    fonts.set(name.clone(), Object::Reference(font_id));
    Ok(name)
}

/// Every `(resource name, font object)` pair the page can draw with: its
/// own `/Font` resources (possibly inherited) and those of the Form
/// XObjects it uses, nested forms included.
pub(crate) fn font_resources(doc: &Document, page_id: ObjectId) -> Vec<(Vec<u8>, &Object)> {
    let mut fonts = Vec::new();
    if let Some(resources) = inherited(doc, page_id, b"Resources").and_then(|r| r.as_dict().ok())
    {
        let mut visited = HashSet::new();
        collect_fonts(doc, resources, 0, &mut visited, &mut fonts);
    }
    fonts
}

fn collect_fonts<'a>(
    doc: &'a Document,
    resources: &'a Dictionary,
    depth: usize,
    visited: &mut HashSet<ObjectId>,
    fonts: &mut Vec<(Vec<u8>, &'a Object)>,
) {
    let subdict = |key: &[u8]| {
        resources
            .get(key)
            .ok()
            .map(|obj| resolve(doc, obj))
            .and_then(|obj| obj.as_dict().ok())
    };

    if let Some(font_dict) = subdict(&b"Font"[..]) {
        fonts.extend(font_dict.iter().map(|(name, font)| (name.clone(), font)));
    }

    if depth >= MAX_FORM_DEPTH {
        return;
    }
    let Some(xobjects) = subdict(&b"XObject"[..]) else {
        return;
    };
    for (_, xobject) in xobjects.iter() {
        // A form reached twice (or through a cycle) is only walked once
        if let Object::Reference(id) = xobject {
            if !visited.insert(*id) {
                continue;
            }
        }
        let Ok(form) = resolve(doc, xobject).as_stream() else {
            continue;
        };
        if !matches!(form.dict.get(b"Subtype").and_then(Object::as_name), Ok(b"Form")) {
            continue;
        }
        let form_resources = form
            .dict
            .get(b"Resources")
            .ok()
            .map(|obj| resolve(doc, obj))
            .and_then(|obj| obj.as_dict().ok());
        if let Some(form_resources) = form_resources {
            collect_fonts(doc, form_resources, depth + 1, visited, fonts);
        }
    }
}
