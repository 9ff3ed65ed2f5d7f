//! Platform-agnostic template-fill core - strategy selection, fills, and
//! the render pipeline.
//!
//! The entry point is [`Renderer`]: construct it with a template store and
//! (optionally) a document converter, then call
//! [`render`](Renderer::render) with a template id and a JSON payload to get
//! final PDF bytes.
//!
//! ## Render strategies
//!
//! - **docx**: `{{key}}` placeholder fill, then external PDF conversion
//! - **xlsx**: cell substitution, then external PDF conversion
//! - **pdf + position map**: overlay synthesis merged onto the base pages
//! - **pdf without position map**: AcroForm field fill, overlay fallback

pub mod acroform;
pub mod convert;
pub mod error;
pub mod fill;
pub mod preview;
pub mod renderer;
pub mod schema;

pub use convert::{DocumentConverter, SofficeConverter};
pub use error::RenderError;
pub use preview::PreviewRenderer;
pub use renderer::Renderer;
