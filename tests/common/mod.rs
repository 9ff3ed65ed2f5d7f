//! Shared helpers for the integration tests.

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, StringFormat, dictionary};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Builds an in-memory PDF with `num_pages` pages, each carrying a unique
/// `"<prefix> <n>"` text run.
pub fn dummy_pdf(num_pages: u32, text_prefix: &str) -> Vec<u8> {
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
                Operation::new("Td", vec![100.into(), 750.into()]),
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

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// Writes a template directory (`meta.json` + original file) under `base`.
pub fn write_template(base: &Path, id: &str, meta: Value, original: &[u8], ext: &str) {
    let dir = base.join(id);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("meta.json"), meta.to_string()).unwrap();
    fs::write(dir.join(format!("original.{}", ext)), original).unwrap();
}

/// Concatenated content-stream text of one page of a rendered PDF. Real
/// operands may serialize as `700` or `700.0`; the latter is normalized so
/// coordinate assertions hold either way.
pub fn page_text(pdf_bytes: &[u8], page_number: u32) -> String {
    let doc = Document::load_mem(pdf_bytes).unwrap();
    let pages = doc.get_pages();
    let content = doc.get_page_content(pages[&page_number]).unwrap();
    String::from_utf8_lossy(&content).replace(".0 ", " ")
}

pub fn page_count(pdf_bytes: &[u8]) -> usize {
    Document::load_mem(pdf_bytes).unwrap().get_pages().len()
}
