pub mod color;
pub mod geometry;
pub mod ids;

pub use color::Color;
pub use geometry::{Calibration, PixelBox, PixelPos, PointPos};
pub use ids::TemplateId;
