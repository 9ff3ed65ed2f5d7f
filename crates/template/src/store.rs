//! Read access to stored templates.
//!
//! Storage, upload, and versioning belong to the admin surface; the engine
//! only ever reads. A template on disk is a directory named by its id
//! holding `meta.json` and the original source document (`original.docx`,
//! `original.xlsx`, or `original.pdf`).

use crate::descriptor::{TemplateDescriptor, TemplateKind};
use crate::error::TemplateError;
use formfill_types::TemplateId;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// The engine-side view of the template store.
pub trait TemplateStore: Send + Sync {
    fn metadata(&self, id: &TemplateId) -> Result<TemplateDescriptor, TemplateError>;
    fn file_bytes(&self, id: &TemplateId) -> Result<Vec<u8>, TemplateError>;
}

/// Filesystem-backed store: `<base>/<id>/meta.json` + `<base>/<id>/original.<ext>`.
pub struct FsTemplateStore {
    base: PathBuf,
}

impl FsTemplateStore {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    fn template_dir(&self, id: &TemplateId) -> PathBuf {
        self.base.join(id.as_str())
    }

    fn read_meta(&self, id: &TemplateId) -> Result<Value, TemplateError> {
        let path = self.template_dir(id).join("meta.json");
        if !path.is_file() {
            return Err(TemplateError::NotFound(id.to_string()));
        }
        let raw = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

impl TemplateStore for FsTemplateStore {
    fn metadata(&self, id: &TemplateId) -> Result<TemplateDescriptor, TemplateError> {
        TemplateDescriptor::from_meta(self.read_meta(id)?)
    }

    fn file_bytes(&self, id: &TemplateId) -> Result<Vec<u8>, TemplateError> {
        let meta = self.read_meta(id)?;
        // Prefer the stored extension; fall back to the kind's canonical one.
        let ext = match meta.get("ext").and_then(Value::as_str) {
            Some(ext) => ext.to_string(),
            None => {
                let kind = meta
                    .get("kind")
                    .and_then(Value::as_str)
                    .ok_or_else(|| TemplateError::Parse("meta missing kind".into()))?;
                TemplateKind::parse(kind)?.extension().to_string()
            }
        };
        let path = original_path(&self.template_dir(id), &ext);
        if !path.is_file() {
            return Err(TemplateError::NotFound(id.to_string()));
        }
        Ok(fs::read(path)?)
    }
}

fn original_path(dir: &Path, ext: &str) -> PathBuf {
    let ext = ext.trim_start_matches('.');
    dir.join(format!("original.{}", ext))
}
