//! Per-field text styling with lenient deserialization.
//!
//! Stored styles come from the layout editor and from hand-edited metas, so
//! the accepted shapes are looser than the in-memory type: sizes may be
//! numbers or strings like `"10pt"`, colors hex strings or `{r,g,b}` maps.
//! An unparseable color degrades to the default instead of failing the load.

use formfill_types::Color;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const DEFAULT_FONT: &str = "Helvetica";
pub const DEFAULT_SIZE: f32 = 10.0;
pub const DEFAULT_COLOR: Color = Color { r: 0x11, g: 0x11, b: 0x11 };

/// Resolved font/size/color for one drawn field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextStyle {
    pub font: String,
    pub size: f32,
    pub color: Color,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font: DEFAULT_FONT.to_string(),
            size: DEFAULT_SIZE,
            color: DEFAULT_COLOR,
        }
    }
}

/// Parse a size value that can be either a number or a string like "10pt"
fn parse_size(value: &Value) -> Option<f32> {
    match value {
        Value::Number(n) => n.as_f64().map(|f| f as f32),
        Value::String(s) => {
            let numeric_part = s
                .trim()
                .chars()
                .take_while(|c| c.is_numeric() || *c == '.' || *c == '-')
                .collect::<String>();
            numeric_part.parse::<f32>().ok()
        }
        _ => None,
    }
}

fn parse_color(value: &Value) -> Option<Color> {
    serde_json::from_value(value.clone()).ok()
}

impl<'de> Deserialize<'de> for TextStyle {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Value::deserialize(deserializer)?;
        let mut style = TextStyle::default();
        let Some(obj) = raw.as_object() else {
            return Ok(style);
        };

        if let Some(font) = obj.get("font").and_then(Value::as_str) {
            style.font = font.to_string();
        }
        if let Some(size) = obj.get("size").and_then(|v| parse_size(v)) {
            style.size = size;
        }
        if let Some(value) = obj.get("color") {
            match parse_color(value) {
                Some(color) => style.color = color,
                None => {
                    log::debug!("Unparseable style color {}, keeping default", value);
                }
            }
        }

        Ok(style)
    }
}
