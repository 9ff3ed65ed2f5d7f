//! The structured layout configuration of a PDF template.
//!
//! Historically the layout sections were smuggled through the field mapping
//! under reserved underscore keys (`_positions`, `_styles`, ...). The
//! structured form keeps layout separate from data; metas that still carry
//! the legacy keys are split apart at load time so the reserved names never
//! reach the render context as drawable fields.

use crate::error::TemplateError;
use crate::style::TextStyle;
use formfill_types::{Calibration, PixelBox, PixelPos, PointPos};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A vertically repeating, paginated block bound to one payload array.
///
/// `start_y` and `delta_y` are in point space already (the editor computes
/// them from the calibrated preview); only the shared offset applies to them
/// at draw time.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RepeatSection {
    #[serde(alias = "startY")]
    pub start_y: f32,
    #[serde(alias = "deltaY")]
    pub delta_y: f32,
    #[serde(alias = "rowsPerPage")]
    pub rows_per_page: Option<u32>,
    #[serde(alias = "endY")]
    pub end_y: Option<f32>,
}

impl Default for RepeatSection {
    fn default() -> Self {
        Self {
            start_y: 700.0,
            delta_y: 24.0,
            rows_per_page: None,
            end_y: None,
        }
    }
}

fn default_preview_scale() -> f32 {
    Calibration::default().preview_scale
}

fn deserialize_preview_scale<'de, D>(deserializer: D) -> Result<f32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(lenient_f32(&raw).unwrap_or_else(default_preview_scale))
}

fn deserialize_offset<'de, D>(deserializer: D) -> Result<PointPos, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(offset_from_value(&raw))
}

/// Numbers, numeric strings, and null all occur in stored metas.
fn lenient_f32(value: &Value) -> Option<f32> {
    match value {
        Value::Number(n) => n.as_f64().map(|f| f as f32),
        Value::String(s) => s.trim().parse::<f32>().ok(),
        _ => None,
    }
}

fn offset_from_value(value: &Value) -> PointPos {
    let get = |key: &str| {
        value
            .get(key)
            .and_then(lenient_f32)
            .unwrap_or(0.0)
    };
    PointPos::new(get("x"), get("y"))
}

/// Everything the overlay path needs to know about a PDF template's layout,
/// kept apart from the data mapping.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Fixed and repeat-row field anchors, keyed by field name (repeat-row
    /// fields use `<arrayPath>.<subfield>` keys), in editor pixels.
    pub positions: BTreeMap<String, PixelPos>,
    #[serde(alias = "repeat_rows")]
    pub repeat_sections: BTreeMap<String, RepeatSection>,
    pub header_positions: BTreeMap<String, PixelPos>,
    pub footer_positions: BTreeMap<String, PixelPos>,
    pub styles: BTreeMap<String, TextStyle>,
    pub default_style: TextStyle,
    #[serde(deserialize_with = "deserialize_preview_scale", default = "default_preview_scale")]
    pub preview_scale: f32,
    #[serde(deserialize_with = "deserialize_offset")]
    pub offset: PointPos,
    pub images: BTreeMap<String, PixelBox>,
    /// Stored fallback blobs (data URLs) captured when an image was last
    /// resolved successfully in the editor.
    pub image_previews: BTreeMap<String, String>,
    pub signatures: BTreeMap<String, PixelBox>,
}

impl LayoutConfig {
    pub fn calibration(&self) -> Calibration {
        Calibration::new(self.preview_scale, self.offset)
    }

    /// Style for a drawn field: explicit entry if present, else the default.
    pub fn style_for(&self, field: &str) -> &TextStyle {
        self.styles.get(field).unwrap_or(&self.default_style)
    }

    /// True when the template has a position map, which selects the overlay
    /// render path for PDF templates.
    pub fn has_positions(&self) -> bool {
        !self.positions.is_empty()
    }

    /// The repeat section driving pagination. Only one array can paginate a
    /// template; extra entries are ignored.
    pub fn primary_repeat(&self) -> Option<(&String, &RepeatSection)> {
        let mut entries = self.repeat_sections.iter();
        let first = entries.next();
        if entries.next().is_some() {
            log::warn!(
                "Template configures {} repeat sections; only the first is paginated",
                self.repeat_sections.len()
            );
        }
        first
    }

    /// Splits legacy reserved keys out of a mapping table into this config.
    ///
    /// Known `_`-prefixed sections are removed from `mapping` and merged here
    /// (explicit structured sections win over legacy ones). Unknown
    /// underscore keys stay in the mapping untouched; stores must preserve
    /// them opaquely.
    pub fn absorb_mapping(&mut self, mapping: &mut Map<String, Value>) -> Result<(), TemplateError> {
        fn take_section<T: serde::de::DeserializeOwned>(
            mapping: &mut Map<String, Value>,
            key: &str,
        ) -> Result<Option<T>, TemplateError> {
            match mapping.remove(key) {
                None | Some(Value::Null) => Ok(None),
                Some(raw) => serde_json::from_value(raw)
                    .map(Some)
                    .map_err(|e| TemplateError::Parse(format!("bad {} section: {}", key, e))),
            }
        }

        fn merge_map<V>(target: &mut BTreeMap<String, V>, legacy: Option<BTreeMap<String, V>>) {
            if let Some(legacy) = legacy {
                for (k, v) in legacy {
                    target.entry(k).or_insert(v);
                }
            }
        }

        merge_map(&mut self.positions, take_section(mapping, "_positions")?);
        merge_map(
            &mut self.repeat_sections,
            take_section(mapping, "_repeat_rows")?,
        );
        merge_map(
            &mut self.header_positions,
            take_section(mapping, "_header_positions")?,
        );
        merge_map(
            &mut self.footer_positions,
            take_section(mapping, "_footer_positions")?,
        );
        merge_map(&mut self.styles, take_section(mapping, "_styles")?);
        merge_map(&mut self.images, take_section(mapping, "_images")?);
        merge_map(
            &mut self.image_previews,
            take_section(mapping, "_image_previews")?,
        );
        merge_map(&mut self.signatures, take_section(mapping, "_signatures")?);

        if let Some(style) = take_section::<TextStyle>(mapping, "_default_style")? {
            self.default_style = style;
        }
        if let Some(raw) = mapping.remove("_preview_scale") {
            if let Some(scale) = lenient_f32(&raw) {
                self.preview_scale = scale;
            }
        }
        if let Some(raw) = mapping.remove("_offset") {
            self.offset = offset_from_value(&raw);
        }

        Ok(())
    }
}
