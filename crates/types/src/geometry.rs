use serde::{Deserialize, Deserializer, Serialize};

/// A position in editor-pixel space, as captured by the layout editor.
///
/// Persisted as a two-element `[x, y]` array; an `{x, y}` object is also
/// accepted for hand-written configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PixelPos {
    pub x: f32,
    pub y: f32,
}

impl PixelPos {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl<'de> Deserialize<'de> for PixelPos {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum PosDef {
            Pair([f32; 2]),
            Map { x: f32, y: f32 },
        }

        match PosDef::deserialize(deserializer)? {
            PosDef::Pair([x, y]) => Ok(PixelPos { x, y }),
            PosDef::Map { x, y } => Ok(PixelPos { x, y }),
        }
    }
}

/// A rectangular region in editor-pixel space (images, signature boxes).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PixelBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Default for PixelBox {
    fn default() -> Self {
        Self { x: 0.0, y: 0.0, width: 100.0, height: 100.0 }
    }
}

/// A position in PDF point space (origin bottom-left, 72 points per inch).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PointPos {
    pub x: f32,
    pub y: f32,
}

impl PointPos {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// The linear transform between the editor's pixel space and PDF point space.
///
/// `preview_scale` is the pixels-per-point ratio of the editor's page raster;
/// `offset` is a correction in points applied after scaling. One calibration
/// is shared by every position entry of a template.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    pub preview_scale: f32,
    pub offset: PointPos,
}

impl Default for Calibration {
    fn default() -> Self {
        // The authoring preview rasterizes pages at 1.5x by default.
        Self { preview_scale: 1.5, offset: PointPos::default() }
    }
}

impl Calibration {
    pub fn new(preview_scale: f32, offset: PointPos) -> Self {
        Self { preview_scale, offset }
    }

    /// Converts an editor-pixel position to PDF points.
    pub fn to_point(&self, px: PixelPos) -> PointPos {
        PointPos {
            x: px.x / self.preview_scale + self.offset.x,
            y: px.y / self.preview_scale + self.offset.y,
        }
    }

    /// Converts a pixel-space length (width/height) to points. Offsets do not
    /// apply to lengths.
    pub fn to_point_len(&self, px: f32) -> f32 {
        px / self.preview_scale
    }

    /// The inverse of [`to_point`](Self::to_point), used by the authoring tool
    /// to place markers back onto the preview raster.
    pub fn to_pixel(&self, pt: PointPos) -> PixelPos {
        PixelPos {
            x: (pt.x - self.offset.x) * self.preview_scale,
            y: (pt.y - self.offset.y) * self.preview_scale,
        }
    }
}
