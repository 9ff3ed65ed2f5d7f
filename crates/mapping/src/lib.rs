//! A simple, JSON-native path and mapping engine.
//!
//! This crate turns a raw request payload plus a template's field mapping
//! into the flat render context the drawing layer consumes. Selectors are
//! dot-paths with optional array indexes, parsed with `nom`.

pub mod context;
pub mod error;
pub mod path;

// --- Public API ---
pub use context::{RenderContext, is_reserved_key};
pub use error::MappingError;
pub use path::{DotPath, PathSegment, lookup_path};
