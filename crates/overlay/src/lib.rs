//! Overlay synthesis for PDF templates.
//!
//! Given a template's layout configuration, a render context, and the raw
//! payload, this crate plans pagination for repeating rows and draws each
//! overlay page as a PDF content stream: header/footer fields, fixed
//! fields, images, signature placeholders, and the page's repeat rows.
//!
//! The output ([`OverlayDocument`]) carries no base-document state; merging
//! onto the template's physical pages is the page merger's job.

pub mod canvas;
pub mod compose;
pub mod error;
pub mod images;
pub mod paginate;

pub use canvas::{FontBook, PageCanvas, normalize_font};
pub use compose::{OverlayComposer, OverlayDocument, PageOverlay};
pub use error::OverlayError;
pub use images::{ImageXObject, RemoteFetcher};
pub use paginate::{PageLayoutPlan, plan_pages, rows_per_page};

#[cfg(test)]
mod tests {
    use super::*;
    use formfill_mapping::RenderContext;
    use formfill_template::LayoutConfig;
    use serde_json::json;

    fn compose(layout: serde_json::Value, payload: serde_json::Value) -> OverlayDocument {
        let layout: LayoutConfig = serde_json::from_value(layout).unwrap();
        let mapping = serde_json::Map::new();
        let ctx = RenderContext::resolve(&payload, &mapping);
        OverlayComposer::new(&layout, &ctx, &payload)
            .compose()
            .unwrap()
    }

    // Real operands may serialize as `700` or `700.0`; normalize the latter
    // so coordinate assertions hold either way.
    fn content_text(page: &PageOverlay) -> String {
        String::from_utf8_lossy(&page.content)
            .replace(".0 ", " ")
            .to_string()
    }

    #[test]
    fn three_items_two_rows_per_page_make_two_pages() {
        let doc = compose(
            json!({
                "positions": {
                    "items.name": [150, 1050]
                },
                "repeat_rows": {
                    "items": { "startY": 700, "deltaY": 20, "rowsPerPage": 2 }
                },
                "preview_scale": 1.5
            }),
            json!({ "items": [
                { "name": "first" },
                { "name": "second" },
                { "name": "third" }
            ] }),
        );

        assert_eq!(doc.pages.len(), 2);
        let page0 = content_text(&doc.pages[0]);
        let page1 = content_text(&doc.pages[1]);
        assert!(page0.contains("(first)"));
        assert!(page0.contains("(second)"));
        assert!(!page0.contains("(third)"));
        assert!(page1.contains("(third)"));
        // Rows anchor at startY and step down by deltaY; page 1 restarts at startY.
        assert!(page0.contains("100 700 Td"));
        assert!(page0.contains("100 680 Td"));
        assert!(page1.contains("100 700 Td"));
    }

    #[test]
    fn fixed_fields_draw_at_calibrated_positions() {
        let doc = compose(
            json!({
                "positions": { "fullName": [100, 200] },
                "preview_scale": 1.5,
                "offset": { "x": 5, "y": -5 }
            }),
            json!({ "fullName": "Ana" }),
        );
        let text = content_text(&doc.pages[0]);
        assert!(text.contains("(Ana)"));
        // 100/1.5+5 = 71.67, 200/1.5-5 = 128.33
        assert!(text.contains("71.6"));
        assert!(text.contains("128.3"));
    }

    #[test]
    fn header_substitutes_page_number_and_count() {
        let doc = compose(
            json!({
                "positions": { "items.v": [10, 10] },
                "header_positions": {
                    "_page_number": [500, 1100],
                    "_page_count": [540, 1100],
                    "title": [100, 1100]
                },
                "repeat_rows": { "items": { "startY": 700, "deltaY": 20, "rowsPerPage": 1 } }
            }),
            json!({ "title": "Report", "items": [ { "v": 1 }, { "v": 2 } ] }),
        );
        assert_eq!(doc.pages.len(), 2);
        let page0 = content_text(&doc.pages[0]);
        let page1 = content_text(&doc.pages[1]);
        assert!(page0.contains("(1)"));
        assert!(page1.contains("(2)"));
        assert!(page0.contains("(Report)"));
        assert!(page1.contains("(Report)"));
    }

    #[test]
    fn reserved_keys_are_never_drawn_as_data() {
        let layout: LayoutConfig = serde_json::from_value(json!({
            "positions": { "_positions": [10, 10], "name": [20, 20] }
        }))
        .unwrap();
        let payload = json!({ "name": "ok" });
        let mut mapping = serde_json::Map::new();
        mapping.insert("_positions".into(), json!({ "name": [20, 20] }));
        let ctx = RenderContext::resolve(&payload, &mapping);
        let doc = OverlayComposer::new(&layout, &ctx, &payload)
            .compose()
            .unwrap();
        let text = content_text(&doc.pages[0]);
        assert!(text.contains("(ok)"));
        // The reserved mapping section must not appear as drawn text.
        assert!(!text.contains("_positions"));
    }

    #[test]
    fn missing_field_value_renders_empty() {
        let doc = compose(
            json!({ "positions": { "absent": [10, 10], "present": [20, 20] } }),
            json!({ "present": "x" }),
        );
        let text = content_text(&doc.pages[0]);
        assert_eq!(text.matches("Tj").count(), 1);
    }

    #[test]
    fn signature_draws_outlined_box_only() {
        let doc = compose(
            json!({
                "positions": { "name": [10, 10] },
                "signatures": { "firma": { "x": 150, "y": 150, "width": 300, "height": 75 } },
                "preview_scale": 1.5
            }),
            json!({}),
        );
        let text = content_text(&doc.pages[0]);
        assert!(text.contains("re"));
        assert!(text.contains("S"));
        assert!(text.contains("100 100 200 50 re"));
        assert!(!text.contains("Tj"));
    }

    #[test]
    fn unresolvable_image_is_skipped_not_fatal() {
        let doc = compose(
            json!({
                "positions": { "name": [10, 10] },
                "images": { "logo": { "x": 0, "y": 0, "width": 50, "height": 50 } }
            }),
            json!({ "name": "ok", "logo": "!!garbage!!" }),
        );
        assert!(doc.images.is_empty());
        let text = content_text(&doc.pages[0]);
        assert!(text.contains("(ok)"));
        assert!(!text.contains("Do"));
    }

    #[test]
    fn image_preview_fallback_is_used() {
        use base64::Engine as _;
        let img = image::RgbaImage::from_pixel(10, 5, image::Rgba([1, 2, 3, 255]));
        let mut png = std::io::Cursor::new(Vec::new());
        img.write_to(&mut png, image::ImageFormat::Png).unwrap();
        let preview = base64::engine::general_purpose::STANDARD.encode(png.into_inner());

        let doc = compose(
            json!({
                "positions": { "name": [10, 10] },
                "images": { "logo": { "x": 0, "y": 0, "width": 150, "height": 150 } },
                "image_previews": { "logo": preview },
                "preview_scale": 1.5
            }),
            json!({}),
        );
        assert_eq!(doc.images.len(), 1);
        let text = content_text(&doc.pages[0]);
        assert!(text.contains("/OImg1 Do"));
        // 10x5 px image fit into a 100x100pt box: 100 x 50 points.
        assert!(text.contains("100 0 0 50"));
    }
}
