//! Raster-preview collaborator interface.

use crate::error::RenderError;

/// Renders one page of a PDF to an encoded bitmap for the layout editor.
///
/// This is the authoring-side collaborator: the editor rasterizes a page at
/// a known scale, the user drops markers on the raster, and the resulting
/// pixels-per-point ratio is persisted as the template's `preview_scale`.
/// The render pipeline itself never calls this.
pub trait PreviewRenderer: Send + Sync {
    fn render_page(
        &self,
        pdf_bytes: &[u8],
        page_index: usize,
        scale: f32,
    ) -> Result<Vec<u8>, RenderError>;
}
