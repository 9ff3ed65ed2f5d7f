//! PDF form-field (AcroForm) filling.
//!
//! Used for PDF templates that have no position map: matching form fields
//! get their `/V` set from the render context and the viewer is asked to
//! regenerate appearances. A PDF without an AcroForm dictionary is a
//! failure here; the caller falls back to the overlay path.

use crate::error::RenderError;
use formfill_mapping::{RenderContext, is_reserved_key};
use lopdf::{Document, Object, ObjectId, StringFormat};

pub fn fill_acroform(bytes: &[u8], context: &RenderContext) -> Result<Vec<u8>, RenderError> {
    let mut doc = Document::load_mem(bytes)?;

    let catalog_id = doc.trailer.get(b"Root")?.as_reference()?;
    let (acroform_ref, field_ids) = locate_form(&doc, catalog_id)?;

    let mut filled = 0usize;
    for field_id in field_ids {
        let field = doc.get_object_mut(field_id)?.as_dict_mut()?;
        let name = match field.get(b"T") {
            Ok(Object::String(bytes, _)) => String::from_utf8_lossy(bytes).into_owned(),
            _ => continue,
        };
        if is_reserved_key(&name) {
            continue;
        }
        let Some(value) = context.get(&name) else {
            continue;
        };
        let rendered = RenderContext::display_value(Some(value));
        field.set("V", Object::String(rendered.into_bytes(), StringFormat::Literal));
        // Stale appearance streams would keep showing the old value.
        field.remove(b"AP");
        filled += 1;
    }
    log::debug!("AcroForm fill set {} field value(s)", filled);

    set_need_appearances(&mut doc, catalog_id, acroform_ref)?;

    let mut out = Vec::new();
    doc.save_to(&mut out)?;
    Ok(out)
}

/// Finds the AcroForm dictionary and its top-level field references.
fn locate_form(
    doc: &Document,
    catalog_id: ObjectId,
) -> Result<(Option<ObjectId>, Vec<ObjectId>), RenderError> {
    let catalog = doc.get_object(catalog_id)?.as_dict()?;
    let acroform_obj = catalog
        .get(b"AcroForm")
        .map_err(|_| RenderError::Pdf("document has no AcroForm dictionary".into()))?;

    let (acroform_ref, acroform) = match acroform_obj {
        Object::Reference(id) => (Some(*id), doc.get_object(*id)?.as_dict()?),
        Object::Dictionary(dict) => (None, dict),
        _ => return Err(RenderError::Pdf("malformed AcroForm entry".into())),
    };

    let fields = acroform
        .get(b"Fields")
        .and_then(Object::as_array)
        .map_err(|_| RenderError::Pdf("AcroForm has no Fields array".into()))?;
    let field_ids: Vec<ObjectId> = fields
        .iter()
        .filter_map(|f| f.as_reference().ok())
        .collect();
    if field_ids.is_empty() {
        return Err(RenderError::Pdf("AcroForm has no fillable fields".into()));
    }
    Ok((acroform_ref, field_ids))
}

fn set_need_appearances(
    doc: &mut Document,
    catalog_id: ObjectId,
    acroform_ref: Option<ObjectId>,
) -> Result<(), RenderError> {
    match acroform_ref {
        Some(id) => {
            doc.get_object_mut(id)?
                .as_dict_mut()?
                .set("NeedAppearances", true);
        }
        None => {
            doc.get_object_mut(catalog_id)?
                .as_dict_mut()?
                .get_mut(b"AcroForm")?
                .as_dict_mut()?
                .set("NeedAppearances", true);
        }
    }
    Ok(())
}
