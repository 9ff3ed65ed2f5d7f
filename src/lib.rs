//! Formfill: a template-fill PDF composition engine.
//!
//! Fills structured JSON data into stored document templates (docx, xlsx,
//! or PDF) and produces a final PDF. PDF templates with a position map get
//! the overlay treatment: editor-calibrated field positions, paginated
//! repeat rows, header/footer page numbering, images, and signature
//! placeholders, merged page-by-page onto the base document.
//!
//! ```no_run
//! use formfill::{FsTemplateStore, Renderer, TemplateId};
//! use std::sync::Arc;
//!
//! let store = Arc::new(FsTemplateStore::new("./templates"));
//! let renderer = Renderer::new(store, None);
//! let payload = serde_json::json!({ "customer": { "name": "ACME" } });
//! let pdf = renderer.render(&TemplateId::new("invoice"), &payload)?;
//! # Ok::<(), formfill::RenderError>(())
//! ```

pub use formfill_compose::{ComposeError, merge_overlay};
pub use formfill_core::{
    DocumentConverter, PreviewRenderer, RenderError, Renderer, SofficeConverter,
};
pub use formfill_mapping::{DotPath, RenderContext};
pub use formfill_overlay::{
    OverlayComposer, OverlayDocument, OverlayError, PageLayoutPlan, plan_pages,
};
pub use formfill_template::{
    FsTemplateStore, LayoutConfig, RepeatSection, TemplateDescriptor, TemplateError, TemplateKind,
    TemplateStore, TextStyle,
};
pub use formfill_types::{Calibration, Color, PixelBox, PixelPos, PointPos, TemplateId};
