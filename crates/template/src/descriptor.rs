//! Template metadata as consumed by the render pipeline.

use crate::error::TemplateError;
use crate::layout::LayoutConfig;
use formfill_types::TemplateId;
use serde::Deserialize;
use serde_json::{Map, Value};

/// The source document format of a stored template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    Docx,
    Xlsx,
    Pdf,
}

impl TemplateKind {
    /// Parses the persisted `kind` string. Unknown kinds are a configuration
    /// error, rejected before any rendering is attempted.
    pub fn parse(kind: &str) -> Result<Self, TemplateError> {
        match kind {
            "docx" | "word-document" => Ok(Self::Docx),
            "xlsx" | "spreadsheet" => Ok(Self::Xlsx),
            "pdf" => Ok(Self::Pdf),
            other => Err(TemplateError::UnsupportedKind(other.to_string())),
        }
    }

    pub fn from_extension(ext: &str) -> Result<Self, TemplateError> {
        Self::parse(ext.trim_start_matches('.'))
    }

    /// The canonical file extension, dot included.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Docx => ".docx",
            Self::Xlsx => ".xlsx",
            Self::Pdf => ".pdf",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Docx => "docx",
            Self::Xlsx => "xlsx",
            Self::Pdf => "pdf",
        }
    }
}

/// Parsed template metadata: data mapping, layout, and optional payload
/// schema. Owned by the store, read-only to the engine.
#[derive(Debug, Clone)]
pub struct TemplateDescriptor {
    pub id: TemplateId,
    pub name: String,
    pub kind: TemplateKind,
    /// Data aliases and literals, plus any unknown reserved keys carried
    /// opaquely. Known layout sections have been split into `layout`.
    pub mapping: Map<String, Value>,
    pub layout: LayoutConfig,
    pub schema: Option<Value>,
}

/// Raw persisted shape of `meta.json`.
#[derive(Deserialize)]
struct MetaDoc {
    id: String,
    #[serde(default)]
    name: String,
    kind: String,
    #[serde(default)]
    mapping: Map<String, Value>,
    #[serde(default)]
    layout: Option<LayoutConfig>,
    /// Legacy metas kept repeat sections at the top level.
    #[serde(default, alias = "repeat_rows")]
    repeat_sections: Option<Value>,
    #[serde(default)]
    schema: Option<Value>,
}

impl TemplateDescriptor {
    pub fn from_meta(meta: Value) -> Result<Self, TemplateError> {
        let doc: MetaDoc = serde_json::from_value(meta)?;
        let kind = TemplateKind::parse(&doc.kind)?;

        let mut mapping = doc.mapping;
        let mut layout = doc.layout.unwrap_or_default();
        layout.absorb_mapping(&mut mapping)?;

        // Top-level repeat sections predate the structured layout block.
        if layout.repeat_sections.is_empty()
            && let Some(raw) = doc.repeat_sections
            && !raw.is_null()
        {
            layout.repeat_sections = serde_json::from_value(raw)
                .map_err(|e| TemplateError::Parse(format!("bad repeat_sections: {}", e)))?;
        }

        // An empty schema object means "no validation configured".
        let schema = doc.schema.filter(|s| match s {
            Value::Null => false,
            Value::Object(o) => !o.is_empty(),
            _ => true,
        });

        Ok(Self {
            id: TemplateId::from(doc.id),
            name: doc.name,
            kind,
            mapping,
            layout,
            schema,
        })
    }
}
