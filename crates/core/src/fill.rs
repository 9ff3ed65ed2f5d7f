//! Placeholder substitution for office-document templates.
//!
//! Docx and xlsx templates carry `{{key}}` placeholders in their XML parts.
//! Filling rewrites only the parts that can contain user-visible text and
//! copies every other archive entry through untouched; conversion to PDF is
//! the external converter's job.

use crate::error::RenderError;
use formfill_mapping::RenderContext;
use std::io::{Cursor, Read, Write};
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

/// Fills `{{key}}` placeholders in a docx template's document, header, and
/// footer parts.
pub fn fill_docx(bytes: &[u8], context: &RenderContext) -> Result<Vec<u8>, RenderError> {
    rewrite_archive(bytes, context, |name| {
        name == "word/document.xml"
            || (name.starts_with("word/header") && name.ends_with(".xml"))
            || (name.starts_with("word/footer") && name.ends_with(".xml"))
    })
}

/// Fills `{{key}}` placeholders in an xlsx template's shared strings and
/// worksheet parts.
pub fn fill_xlsx(bytes: &[u8], context: &RenderContext) -> Result<Vec<u8>, RenderError> {
    rewrite_archive(bytes, context, |name| {
        name == "xl/sharedStrings.xml"
            || (name.starts_with("xl/worksheets/") && name.ends_with(".xml"))
    })
}

fn rewrite_archive(
    bytes: &[u8],
    context: &RenderContext,
    is_text_part: impl Fn(&str) -> bool,
) -> Result<Vec<u8>, RenderError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let name = entry.name().to_string();
        if is_text_part(&name) {
            let mut xml = String::new();
            entry.read_to_string(&mut xml)?;
            let filled = substitute_placeholders(&xml, context);
            writer.start_file(name, SimpleFileOptions::default())?;
            writer.write_all(filled.as_bytes())?;
        } else {
            writer.raw_copy_file(entry)?;
        }
    }

    Ok(writer.finish()?.into_inner())
}

/// Replaces `{{key}}` (and the spaced `{{ key }}` variant) for every
/// drawable context entry. Placeholders with no matching entry are left as
/// written.
fn substitute_placeholders(text: &str, context: &RenderContext) -> String {
    let mut result = text.to_string();
    for (key, value) in context.data_entries() {
        let rendered = RenderContext::display_value(Some(value));
        result = result.replace(&format!("{{{{{}}}}}", key), &rendered);
        result = result.replace(&format!("{{{{ {} }}}}", key), &rendered);
    }
    result
}
