//! The per-page overlay state machine.
//!
//! For each planned page the composer draws, in order: header and footer
//! fields (with page-number substitution), fixed fields, images, signature
//! placeholders, and the page's slice of repeat rows. The output is an
//! [`OverlayDocument`] the page merger composites onto the base template.

use crate::canvas::{FontBook, PageCanvas};
use crate::error::OverlayError;
use crate::images::{ImageXObject, RemoteFetcher, build_xobject, decode_inline, resolve_value_bytes};
use crate::paginate::{PageLayoutPlan, plan_pages};
use formfill_mapping::{RenderContext, lookup_path};
use formfill_template::{LayoutConfig, RepeatSection};
use formfill_types::{Calibration, PixelBox, PixelPos, PointPos};
use serde_json::Value;
use std::time::Duration;

/// Synthetic header/footer field names resolved at draw time.
const PAGE_NUMBER_KEY: &str = "_page_number";
const PAGE_COUNT_KEY: &str = "_page_count";

const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);
const SIGNATURE_LINE_WIDTH: f32 = 0.75;

/// One synthesized page: an encoded content stream. Fonts and images live on
/// the [`OverlayDocument`] so the merger registers each resource once.
pub struct PageOverlay {
    pub content: Vec<u8>,
}

/// The ordered overlay pages plus the resources their content references.
pub struct OverlayDocument {
    pub pages: Vec<PageOverlay>,
    /// `(internal name, base-14 font)` pairs.
    pub fonts: Vec<(String, String)>,
    pub images: Vec<ImageXObject>,
}

struct ImagePlacement {
    image_index: usize,
    bbox: PixelBox,
}

/// Draws the overlay for one render call. Owns no state beyond its inputs;
/// safe to construct per call from any thread.
pub struct OverlayComposer<'a> {
    layout: &'a LayoutConfig,
    context: &'a RenderContext,
    payload: &'a Value,
    fetch_timeout: Duration,
}

impl<'a> OverlayComposer<'a> {
    pub fn new(layout: &'a LayoutConfig, context: &'a RenderContext, payload: &'a Value) -> Self {
        Self { layout, context, payload, fetch_timeout: DEFAULT_FETCH_TIMEOUT }
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn compose(&self) -> Result<OverlayDocument, OverlayError> {
        let cal = self.layout.calibration();
        let repeat = self.layout.primary_repeat();

        let items: &[Value] = match repeat {
            Some((path, _)) => lookup_path(self.payload, path)
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or(&[]),
            None => &[],
        };
        let plan = plan_pages(repeat.map(|(_, s)| s), items.len());
        log::debug!(
            "Overlay plan: {} page(s), {} row(s) per page, {} repeat item(s)",
            plan.total_pages,
            plan.rows_per_page,
            items.len()
        );

        let (images, placements) = self.resolve_images()?;

        let mut fonts = FontBook::new();
        let mut pages = Vec::with_capacity(plan.total_pages as usize);
        for page_index in 0..plan.total_pages {
            let mut canvas = PageCanvas::new(&mut fonts);
            self.draw_header_footer(&mut canvas, &cal, page_index, plan.total_pages);
            self.draw_fixed_fields(&mut canvas, &cal, repeat.map(|(p, _)| p.as_str()));
            self.draw_images(&mut canvas, &cal, &images, &placements);
            self.draw_signatures(&mut canvas, &cal);
            if let Some((path, section)) = repeat {
                self.draw_repeat_rows(&mut canvas, &cal, path, section, items, &plan, page_index);
            }
            pages.push(PageOverlay { content: canvas.into_content()? });
        }

        let fonts = fonts
            .entries()
            .map(|(internal, base)| (internal.to_string(), base.to_string()))
            .collect();
        Ok(OverlayDocument { pages, fonts, images })
    }

    /// Resolves every configured image field once, up front. Fallback order:
    /// context value, stored preview, skip.
    fn resolve_images(&self) -> Result<(Vec<ImageXObject>, Vec<ImagePlacement>), OverlayError> {
        let mut images = Vec::new();
        let mut placements = Vec::new();
        if self.layout.images.is_empty() {
            return Ok((images, placements));
        }

        let fetcher = match RemoteFetcher::new(self.fetch_timeout) {
            Ok(f) => Some(f),
            Err(e) => {
                log::warn!("HTTP client unavailable, remote images will be skipped: {}", e);
                None
            }
        };

        for (field, bbox) in &self.layout.images {
            let name = format!("OImg{}", images.len() + 1);
            let from_context = self
                .context
                .get(field)
                .and_then(|v| resolve_value_bytes(v, fetcher.as_ref()));
            let from_preview = self
                .layout
                .image_previews
                .get(field)
                .and_then(|stored| decode_inline(stored));

            let mut resolved = None;
            for candidate in [from_context, from_preview].into_iter().flatten() {
                match build_xobject(name.clone(), &candidate) {
                    Ok(xobject) => {
                        resolved = Some(xobject);
                        break;
                    }
                    Err(e) => log::warn!("Image field '{}' failed to decode: {}", field, e),
                }
            }
            match resolved {
                Some(xobject) => {
                    images.push(xobject);
                    placements.push(ImagePlacement { image_index: images.len() - 1, bbox: *bbox });
                }
                None => log::warn!("Image field '{}' has no usable data, skipping", field),
            }
        }
        Ok((images, placements))
    }

    fn draw_header_footer(
        &self,
        canvas: &mut PageCanvas<'_>,
        cal: &Calibration,
        page_index: u32,
        total_pages: u32,
    ) {
        let entries = self
            .layout
            .header_positions
            .iter()
            .chain(self.layout.footer_positions.iter());
        for (key, pos) in entries {
            let text = match key.as_str() {
                PAGE_NUMBER_KEY => (page_index + 1).to_string(),
                PAGE_COUNT_KEY => total_pages.to_string(),
                _ => RenderContext::display_value(self.context.get(key)),
            };
            canvas.draw_text(self.layout.style_for(key), cal.to_point(*pos), &text);
        }
    }

    fn draw_fixed_fields(
        &self,
        canvas: &mut PageCanvas<'_>,
        cal: &Calibration,
        repeat_path: Option<&str>,
    ) {
        for (key, value) in self.context.data_entries() {
            if let Some(path) = repeat_path
                && key.starts_with(path)
                && key[path.len()..].starts_with('.')
            {
                continue;
            }
            let Some(pos) = self.layout.positions.get(key) else {
                continue;
            };
            let text = RenderContext::display_value(Some(value));
            canvas.draw_text(self.layout.style_for(key), cal.to_point(*pos), &text);
        }
    }

    fn draw_images(
        &self,
        canvas: &mut PageCanvas<'_>,
        cal: &Calibration,
        images: &[ImageXObject],
        placements: &[ImagePlacement],
    ) {
        for placement in placements {
            let image = &images[placement.image_index];
            let bbox = placement.bbox;
            let anchor = cal.to_point(PixelPos::new(bbox.x, bbox.y));
            let box_w = cal.to_point_len(bbox.width);
            let box_h = cal.to_point_len(bbox.height);
            // Fit into the configured box preserving aspect ratio.
            let scale = (box_w / image.px_width as f32).min(box_h / image.px_height as f32);
            let draw_w = image.px_width as f32 * scale;
            let draw_h = image.px_height as f32 * scale;
            canvas.place_image(&image.name, anchor.x, anchor.y, draw_w, draw_h);
        }
    }

    fn draw_signatures(&self, canvas: &mut PageCanvas<'_>, cal: &Calibration) {
        for (key, bbox) in &self.layout.signatures {
            let anchor = cal.to_point(PixelPos::new(bbox.x, bbox.y));
            let w = cal.to_point_len(bbox.width);
            let h = cal.to_point_len(bbox.height);
            let color = self.layout.style_for(key).color;
            canvas.stroke_rect(color, SIGNATURE_LINE_WIDTH, anchor.x, anchor.y, w, h);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_repeat_rows(
        &self,
        canvas: &mut PageCanvas<'_>,
        cal: &Calibration,
        path: &str,
        section: &RepeatSection,
        items: &[Value],
        plan: &PageLayoutPlan,
        page_index: u32,
    ) {
        let prefix = format!("{}.", path);
        let range = plan.page_range(page_index, items.len());
        for (offset, item) in items[range].iter().enumerate() {
            // Row anchors are point-space already; only the offset applies.
            let row_y = section.start_y - offset as f32 * section.delta_y + cal.offset.y;
            for (key, pos) in &self.layout.positions {
                let Some(subfield) = key.strip_prefix(&prefix) else {
                    continue;
                };
                let text = RenderContext::display_value(lookup_path(item, subfield));
                let x = cal.to_point(*pos).x;
                canvas.draw_text(self.layout.style_for(key), PointPos::new(x, row_y), &text);
            }
        }
    }
}
