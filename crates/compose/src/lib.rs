//! Merging synthesized overlay pages onto a base template document.
//!
//! The merger builds a fresh output document: output page `i` is a copy of
//! base page `min(i, base_count - 1)` with the overlay page's content stream
//! layered on top and the overlay's font/image resources added to the page's
//! resource dictionary. The final document always has exactly as many pages
//! as the overlay, so a one-page template grows to hold paginated row data
//! (trailing pages re-use the last base page as background).

mod error;

pub use error::ComposeError;

use formfill_overlay::OverlayDocument;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use std::collections::HashMap;

/// Copies object graphs from the base document into the output document.
///
/// Objects are copied at most once; a placeholder is registered before
/// recursing so cyclical references (Page -> Parent -> Kids -> Page) cannot
/// recurse forever.
struct ObjectGraphCopier<'a> {
    source: &'a Document,
    target: &'a mut Document,
    id_map: HashMap<ObjectId, ObjectId>,
}

impl<'a> ObjectGraphCopier<'a> {
    fn new(source: &'a Document, target: &'a mut Document) -> Self {
        Self { source, target, id_map: HashMap::new() }
    }

    fn copy_object(&mut self, source_id: ObjectId) -> Result<ObjectId, lopdf::Error> {
        if let Some(target_id) = self.id_map.get(&source_id) {
            return Ok(*target_id);
        }

        // Reserve the target slot before recursing so self-referential
        // graphs terminate.
        let new_id = self.target.add_object(Object::Null);
        self.id_map.insert(source_id, new_id);

        let source_obj = self.source.get_object(source_id)?.clone();
        let copied = self.remap(source_obj)?;

        match self.target.objects.get_mut(&new_id) {
            Some(slot) => *slot = copied,
            None => return Err(lopdf::Error::ObjectNotFound(new_id)),
        }
        Ok(new_id)
    }

    /// Rewrites every `Object::Reference` in `obj` to point into the target
    /// document, copying referenced objects on demand.
    fn remap(&mut self, obj: Object) -> Result<Object, lopdf::Error> {
        match obj {
            Object::Reference(id) => Ok(Object::Reference(self.copy_object(id)?)),
            Object::Array(items) => Ok(Object::Array(
                items
                    .into_iter()
                    .map(|item| self.remap(item))
                    .collect::<Result<Vec<_>, _>>()?,
            )),
            Object::Dictionary(mut dict) => {
                for (_, value) in dict.iter_mut() {
                    *value = self.remap(value.clone())?;
                }
                Ok(Object::Dictionary(dict))
            }
            Object::Stream(mut stream) => {
                for (_, value) in stream.dict.iter_mut() {
                    *value = self.remap(value.clone())?;
                }
                Ok(Object::Stream(stream))
            }
            primitive => Ok(primitive),
        }
    }
}

/// Resolves a possibly-indirect object within `doc`.
fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj.as_reference() {
        Ok(id) => doc.get_object(id).unwrap_or(obj),
        Err(_) => obj,
    }
}

/// Walks the page tree upwards for an inheritable page attribute
/// (`Resources`, `MediaBox`, ...).
fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut current = page_id;
    loop {
        let dict = doc.get_object(current).ok()?.as_dict().ok()?;
        if let Ok(found) = dict.get(key) {
            return Some(found);
        }
        current = dict.get(b"Parent").ok()?.as_reference().ok()?;
    }
}

/// Composites `overlay` onto `base`, producing the final document.
///
/// The base document is not modified; base page content ends up sandwiched
/// between a `q`/`Q` pair so its graphics state cannot leak into the overlay
/// operators drawn after it.
pub fn merge_overlay(base: &Document, overlay: &OverlayDocument) -> Result<Document, ComposeError> {
    let base_pages: Vec<ObjectId> = {
        let mut pages: Vec<_> = base.get_pages().into_iter().collect();
        pages.sort_by_key(|(number, _)| *number);
        pages.into_iter().map(|(_, id)| id).collect()
    };
    if base_pages.is_empty() {
        return Err(ComposeError::EmptyBase);
    }

    let mut out = Document::with_version("1.7");
    let pages_id = out.new_object_id();

    // State-isolation wrappers shared by every page.
    let save_state_id = out.add_object(Stream::new(dictionary! {}, b"q\n".to_vec()));
    let restore_state_id = out.add_object(Stream::new(dictionary! {}, b"Q\n".to_vec()));

    // Overlay resources are document-wide: one font object per base-14 font,
    // one XObject per image, shared by all pages that reference them.
    let mut font_refs: Vec<(String, ObjectId)> = Vec::new();
    for (internal, base_font) in &overlay.fonts {
        let font_id = out.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => base_font.as_str(),
            "Encoding" => "WinAnsiEncoding",
        });
        font_refs.push((internal.clone(), font_id));
    }
    let mut image_refs: Vec<(String, ObjectId)> = Vec::new();
    for image in &overlay.images {
        let mut stream = image.stream.clone();
        if let Some(smask) = &image.smask {
            let smask_id = out.add_object(smask.clone());
            stream.dict.set("SMask", Object::Reference(smask_id));
        }
        let image_id = out.add_object(stream);
        image_refs.push((image.name.clone(), image_id));
    }

    let mut copier = ObjectGraphCopier::new(base, &mut out);
    let mut merged_pages: Vec<Dictionary> = Vec::new();
    for (index, page) in overlay.pages.iter().enumerate() {
        let base_index = index.min(base_pages.len() - 1);
        let src_id = base_pages[base_index];
        let src_dict = base.get_object(src_id)?.as_dict()?;

        // Copy the page dictionary itself freshly for every output page (the
        // same base page may back several of them), while shared streams and
        // resources are copied once through the copier's cache.
        let mut stripped = src_dict.clone();
        stripped.remove(b"Parent");
        let Object::Dictionary(mut page_dict) = copier.remap(Object::Dictionary(stripped))? else {
            return Err(ComposeError::Other("page did not remap to a dictionary".into()));
        };

        // Effective resources, materialized inline so per-page additions
        // cannot alias another page.
        let mut resources = match inherited(base, src_id, b"Resources") {
            Some(found) => {
                let resolved = resolve(base, found).as_dict()?.clone();
                let Object::Dictionary(copied) = copier.remap(Object::Dictionary(resolved))? else {
                    return Err(ComposeError::Other("resources did not remap".into()));
                };
                copied
            }
            None => Dictionary::new(),
        };

        let media_box = match inherited(base, src_id, b"MediaBox") {
            Some(found) => Some(copier.remap(resolve(base, found).clone())?),
            None => None,
        };

        let overlay_id = copier
            .target
            .add_object(Stream::new(dictionary! {}, page.content.clone()));

        let mut contents = normalize_contents(copier.target, &page_dict);
        contents.insert(0, Object::Reference(save_state_id));
        contents.push(Object::Reference(restore_state_id));
        contents.push(Object::Reference(overlay_id));
        page_dict.set("Contents", Object::Array(contents));

        register_resources(&mut resources, &font_refs, &image_refs);
        page_dict.set("Resources", Object::Dictionary(resources));
        if let Some(media_box) = media_box
            && !page_dict.has(b"MediaBox")
        {
            page_dict.set("MediaBox", media_box);
        }
        merged_pages.push(page_dict);
    }

    let mut kids = Vec::with_capacity(merged_pages.len());
    let page_count = merged_pages.len() as i64;
    for mut page_dict in merged_pages {
        page_dict.set("Parent", Object::Reference(pages_id));
        let page_id = out.add_object(page_dict);
        kids.push(Object::Reference(page_id));
    }

    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => page_count,
    };
    out.objects.insert(pages_id, pages_dict.into());

    let catalog_id = out.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    out.trailer.set("Root", catalog_id);

    log::debug!(
        "Merged {} overlay page(s) onto {} base page(s)",
        page_count,
        base_pages.len()
    );
    Ok(out)
}

/// Base page contents as a flat list of stream references.
fn normalize_contents(doc: &Document, page_dict: &Dictionary) -> Vec<Object> {
    match page_dict.get(b"Contents") {
        Ok(Object::Array(items)) => items.clone(),
        Ok(reference @ Object::Reference(id)) => match doc.get_object(*id) {
            Ok(Object::Array(items)) => items.clone(),
            _ => vec![reference.clone()],
        },
        Ok(other) => vec![other.clone()],
        Err(_) => Vec::new(),
    }
}

fn register_resources(
    resources: &mut Dictionary,
    fonts: &[(String, ObjectId)],
    images: &[(String, ObjectId)],
) {
    if !fonts.is_empty() {
        if !resources.has(b"Font") {
            resources.set("Font", Object::Dictionary(Dictionary::new()));
        }
        if let Ok(font_dict) = resources.get_mut(b"Font").and_then(Object::as_dict_mut) {
            for (internal, id) in fonts {
                if font_dict.has(internal.as_bytes()) {
                    log::warn!("Base page already defines font resource {}, keeping it", internal);
                    continue;
                }
                font_dict.set(internal.as_bytes().to_vec(), Object::Reference(*id));
            }
        }
    }
    if !images.is_empty() {
        if !resources.has(b"XObject") {
            resources.set("XObject", Object::Dictionary(Dictionary::new()));
        }
        if let Ok(xobjects) = resources.get_mut(b"XObject").and_then(Object::as_dict_mut) {
            for (name, id) in images {
                if xobjects.has(name.as_bytes()) {
                    log::warn!("Base page already defines XObject {}, keeping it", name);
                    continue;
                }
                xobjects.set(name.as_bytes().to_vec(), Object::Reference(*id));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formfill_overlay::{OverlayDocument, PageOverlay};
    use lopdf::StringFormat;
    use lopdf::content::{Content, Operation};

    /// Creates a simple dummy PDF document with a specified number of pages.
    /// Each page has a unique text content "Prefix X".
    fn create_dummy_pdf(num_pages: u32, text_prefix: &str) -> Document {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut page_ids = vec![];
        for i in 1..=num_pages {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![100.into(), 700.into()]),
                    Operation::new(
                        "Tj",
                        vec![Object::String(
                            format!("{} {}", text_prefix, i).into_bytes(),
                            StringFormat::Literal,
                        )],
                    ),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Contents" => content_id,
                "Resources" => resources_id,
            });
            page_ids.push(page_id.into());
        }

        let pages_dict = dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids,
            "Count" => num_pages as i64,
        };
        doc.objects.insert(pages_id, pages_dict.into());

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        doc
    }

    fn overlay_of(texts: &[&str]) -> OverlayDocument {
        let pages = texts
            .iter()
            .map(|text| {
                let content = Content {
                    operations: vec![
                        Operation::new("BT", vec![]),
                        Operation::new("Tf", vec![Object::Name(b"OF1".to_vec()), 10.into()]),
                        Operation::new("Td", vec![50.into(), 50.into()]),
                        Operation::new(
                            "Tj",
                            vec![Object::String(text.as_bytes().to_vec(), StringFormat::Literal)],
                        ),
                        Operation::new("ET", vec![]),
                    ],
                };
                PageOverlay { content: content.encode().unwrap() }
            })
            .collect();
        OverlayDocument {
            pages,
            fonts: vec![("OF1".to_string(), "Helvetica".to_string())],
            images: vec![],
        }
    }

    fn page_text(doc: &Document, page_number: u32) -> String {
        let pages = doc.get_pages();
        let content = doc.get_page_content(pages[&page_number]).unwrap();
        String::from_utf8_lossy(&content).into_owned()
    }

    #[test]
    fn output_page_count_follows_overlay() {
        let base = create_dummy_pdf(1, "Base Page");
        let merged = merge_overlay(&base, &overlay_of(&["Overlay 1", "Overlay 2", "Overlay 3"])).unwrap();

        assert_eq!(merged.get_pages().len(), 3);
        for page in 1..=3u32 {
            let text = page_text(&merged, page);
            // Every output page re-uses the single base page as background.
            assert!(text.contains("Base Page 1"), "page {}", page);
            assert!(text.contains(&format!("Overlay {}", page)), "page {}", page);
        }
    }

    #[test]
    fn each_page_pairs_with_its_own_base_page() {
        let base = create_dummy_pdf(3, "Base Page");
        let merged = merge_overlay(&base, &overlay_of(&["Overlay 1", "Overlay 2"])).unwrap();

        assert_eq!(merged.get_pages().len(), 2);
        assert!(page_text(&merged, 1).contains("Base Page 1"));
        assert!(page_text(&merged, 2).contains("Base Page 2"));
        assert!(!page_text(&merged, 2).contains("Base Page 3"));
    }

    #[test]
    fn base_content_is_state_isolated() {
        let base = create_dummy_pdf(1, "Base Page");
        let merged = merge_overlay(&base, &overlay_of(&["Overlay 1"])).unwrap();

        let pages = merged.get_pages();
        let page_dict = merged.get_object(pages[&1]).unwrap().as_dict().unwrap();
        let contents = page_dict.get(b"Contents").unwrap().as_array().unwrap();
        // q-wrapper, base stream, Q-wrapper, overlay stream.
        assert_eq!(contents.len(), 4);

        let text = page_text(&merged, 1);
        let q = text.find("q\n").unwrap();
        let base_pos = text.find("Base Page").unwrap();
        let restore = text.rfind("Q\n").unwrap();
        let overlay_pos = text.find("Overlay 1").unwrap();
        assert!(q < base_pos && base_pos < restore && restore < overlay_pos);
    }

    #[test]
    fn overlay_fonts_merge_without_clobbering_base() {
        let base = create_dummy_pdf(1, "Base Page");
        let merged = merge_overlay(&base, &overlay_of(&["Overlay 1"])).unwrap();

        let pages = merged.get_pages();
        let page_dict = merged.get_object(pages[&1]).unwrap().as_dict().unwrap();
        let resources = page_dict.get(b"Resources").unwrap().as_dict().unwrap();
        let fonts = resources.get(b"Font").unwrap().as_dict().unwrap();
        assert!(fonts.has(b"F1"));
        assert!(fonts.has(b"OF1"));
    }

    #[test]
    fn merged_output_survives_a_save_load_round_trip() {
        let base = create_dummy_pdf(2, "Base Page");
        let mut merged = merge_overlay(&base, &overlay_of(&["Overlay 1", "Overlay 2", "Overlay 3"])).unwrap();

        let mut bytes = Vec::new();
        merged.save_to(&mut bytes).unwrap();
        let reloaded = Document::load_mem(&bytes).unwrap();
        assert_eq!(reloaded.get_pages().len(), 3);
    }

    #[test]
    fn empty_base_is_rejected() {
        let base = Document::with_version("1.7");
        let err = merge_overlay(&base, &overlay_of(&["Overlay 1"])).unwrap_err();
        assert!(matches!(err, ComposeError::EmptyBase));
    }
}
