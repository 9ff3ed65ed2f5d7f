//! Template metadata and layout configuration.
//!
//! This crate owns the persisted side of the engine: template descriptors,
//! the structured layout configuration for PDF overlays, per-field text
//! styles, and read access to the on-disk template store.
//!
//! ## Key types
//!
//! - **`TemplateDescriptor`**: parsed `meta.json`; kind, mapping, layout, schema
//! - **`LayoutConfig`**: positions, repeat sections, styles, calibration,
//!   images, signatures; kept separate from the data mapping
//! - **`TemplateStore`**: trait the engine consumes; `FsTemplateStore` reads
//!   the directory-per-template layout

pub mod descriptor;
pub mod error;
pub mod layout;
pub mod store;
mod style;

pub use descriptor::{TemplateDescriptor, TemplateKind};
pub use error::TemplateError;
pub use layout::{LayoutConfig, RepeatSection};
pub use store::{FsTemplateStore, TemplateStore};
pub use style::{DEFAULT_FONT, TextStyle};
