//! The render pipeline: strategy selection and orchestration.

use crate::acroform::fill_acroform;
use crate::convert::DocumentConverter;
use crate::error::RenderError;
use crate::fill::{fill_docx, fill_xlsx};
use crate::schema;
use formfill_compose::merge_overlay;
use formfill_mapping::RenderContext;
use formfill_overlay::OverlayComposer;
use formfill_template::{TemplateDescriptor, TemplateKind, TemplateStore};
use formfill_types::TemplateId;
use lopdf::Document;
use serde_json::Value;
use std::fs;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_IMAGE_TIMEOUT: Duration = Duration::from_secs(10);

/// The render service. Explicitly constructed with its collaborators and
/// stateless across calls, so one instance can serve any number of threads.
pub struct Renderer {
    store: Arc<dyn TemplateStore>,
    converter: Option<Arc<dyn DocumentConverter>>,
    image_timeout: Duration,
}

impl Renderer {
    pub fn new(store: Arc<dyn TemplateStore>, converter: Option<Arc<dyn DocumentConverter>>) -> Self {
        Self { store, converter, image_timeout: DEFAULT_IMAGE_TIMEOUT }
    }

    pub fn with_image_timeout(mut self, timeout: Duration) -> Self {
        self.image_timeout = timeout;
        self
    }

    /// Renders a template with `payload` into final PDF bytes.
    ///
    /// Dispatch by template kind: office formats fill placeholders and
    /// convert; PDFs with a position map take the overlay path; PDFs without
    /// one try a form fill first and fall back to the overlay.
    pub fn render(&self, id: &TemplateId, payload: &Value) -> Result<Vec<u8>, RenderError> {
        let descriptor = self.store.metadata(id)?;
        if let Some(schema) = &descriptor.schema {
            schema::validate(payload, schema)?;
        }
        let context = RenderContext::resolve(payload, &descriptor.mapping);
        let template = self.store.file_bytes(id)?;

        match descriptor.kind {
            TemplateKind::Docx => {
                log::debug!("Rendering {} via docx placeholder fill", id);
                let filled = fill_docx(&template, &context)?;
                self.convert_to_pdf(&filled, "docx")
            }
            TemplateKind::Xlsx => {
                log::debug!("Rendering {} via xlsx cell substitution", id);
                let filled = fill_xlsx(&template, &context)?;
                self.convert_to_pdf(&filled, "xlsx")
            }
            TemplateKind::Pdf if descriptor.layout.has_positions() => {
                log::debug!("Rendering {} via PDF overlay", id);
                self.render_overlay(&descriptor, &context, payload, &template)
            }
            TemplateKind::Pdf => match fill_acroform(&template, &context) {
                Ok(bytes) => {
                    log::debug!("Rendering {} via AcroForm fill", id);
                    Ok(bytes)
                }
                Err(e) => {
                    log::warn!("AcroForm fill failed for {} ({}), falling back to overlay", id, e);
                    self.render_overlay(&descriptor, &context, payload, &template)
                }
            },
        }
    }

    fn render_overlay(
        &self,
        descriptor: &TemplateDescriptor,
        context: &RenderContext,
        payload: &Value,
        template: &[u8],
    ) -> Result<Vec<u8>, RenderError> {
        let base = Document::load_mem(template)?;
        let overlay = OverlayComposer::new(&descriptor.layout, context, payload)
            .with_fetch_timeout(self.image_timeout)
            .compose()?;
        let mut merged = merge_overlay(&base, &overlay)?;

        let mut bytes = Vec::new();
        merged.save_to(&mut bytes)?;
        Ok(bytes)
    }

    /// Runs the filled office document through the external converter inside
    /// a call-scoped temp directory, cleaned up on every exit path.
    fn convert_to_pdf(&self, filled: &[u8], ext: &str) -> Result<Vec<u8>, RenderError> {
        let converter = self
            .converter
            .as_ref()
            .ok_or_else(|| RenderError::Conversion("no document converter configured".into()))?;

        let workdir = tempfile::tempdir()?;
        let input = workdir.path().join(format!("template.{}", ext));
        let output = workdir.path().join("template.pdf");
        fs::write(&input, filled)?;
        converter.convert_to_pdf(&input, &output)?;
        Ok(fs::read(&output)?)
    }
}
