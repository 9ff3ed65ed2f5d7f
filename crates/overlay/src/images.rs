//! Image value resolution and PDF XObject construction.
//!
//! A configured image field may carry its data as an HTTP(S) URL, a
//! `data:` URL, or raw base64. Resolution is tolerant: every failure falls
//! through to the stored preview blob, and a field with nothing usable is
//! skipped; a missing image never fails a page.

use crate::error::OverlayError;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use flate2::Compression;
use flate2::write::ZlibEncoder;
use image::{DynamicImage, ImageFormat};
use lopdf::{Object, Stream, dictionary};
use serde_json::Value;
use std::io::Write;
use std::time::Duration;

/// A decoded image ready to be registered in the output document.
#[derive(Debug)]
pub struct ImageXObject {
    /// Resource name the content stream references (`/OImg1 Do`).
    pub name: String,
    pub stream: Stream,
    pub smask: Option<Stream>,
    pub px_width: u32,
    pub px_height: u32,
}

/// Blocking HTTP client for remote image values, with a hard timeout so a
/// dead host cannot stall the render call.
pub struct RemoteFetcher {
    client: reqwest::blocking::Client,
}

impl RemoteFetcher {
    pub fn new(timeout: Duration) -> Result<Self, OverlayError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }

    pub fn fetch(&self, url: &str) -> Result<Vec<u8>, OverlayError> {
        let response = self.client.get(url).send()?.error_for_status()?;
        Ok(response.bytes()?.to_vec())
    }
}

/// Decodes an inline image value: `data:*;base64,...` or bare base64.
pub fn decode_inline(value: &str) -> Option<Vec<u8>> {
    let payload = match value.strip_prefix("data:") {
        Some(rest) => rest.split_once(";base64,").map(|(_, b64)| b64)?,
        None => value,
    };
    BASE64.decode(payload.trim()).ok()
}

/// Turns a context value into raw image bytes, fetching remote URLs through
/// `fetcher`. Returns `None` (with a log line) when nothing usable remains.
pub fn resolve_value_bytes(value: &Value, fetcher: Option<&RemoteFetcher>) -> Option<Vec<u8>> {
    let s = value.as_str()?;
    if s.starts_with("http://") || s.starts_with("https://") {
        match fetcher?.fetch(s) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                log::warn!("Remote image fetch failed for {}: {}", s, e);
                None
            }
        }
    } else {
        decode_inline(s)
    }
}

/// Builds the XObject for one image field.
///
/// JPEG bytes without an alpha channel embed as-is with a `DCTDecode`
/// filter; everything else decodes to RGBA and embeds as FlateDecode RGB
/// with the alpha plane in an SMask.
pub fn build_xobject(name: String, bytes: &[u8]) -> Result<ImageXObject, OverlayError> {
    let format = image::guess_format(bytes)?;
    let decoded = image::load_from_memory(bytes)?;

    if format == ImageFormat::Jpeg && !decoded.color().has_alpha() {
        return Ok(jpeg_xobject(name, bytes, &decoded));
    }
    rgba_xobject(name, &decoded)
}

fn jpeg_xobject(name: String, bytes: &[u8], decoded: &DynamicImage) -> ImageXObject {
    let (width, height) = (decoded.width(), decoded.height());
    let color_space = if decoded.color().has_color() {
        "DeviceRGB"
    } else {
        "DeviceGray"
    };
    let stream = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => color_space,
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        },
        bytes.to_vec(),
    );
    ImageXObject { name, stream, smask: None, px_width: width, px_height: height }
}

fn rgba_xobject(name: String, decoded: &DynamicImage) -> Result<ImageXObject, OverlayError> {
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    let mut alpha = Vec::with_capacity((width * height) as usize);
    for pixel in rgba.pixels() {
        let [r, g, b, a] = pixel.0;
        rgb.extend_from_slice(&[r, g, b]);
        alpha.push(a);
    }
    let opaque = alpha.iter().all(|&a| a == u8::MAX);

    let stream = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
        },
        deflate(&rgb)?,
    );
    let smask = if opaque {
        None
    } else {
        Some(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width as i64,
                "Height" => height as i64,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
                "Filter" => "FlateDecode",
            },
            deflate(&alpha)?,
        ))
    };

    Ok(ImageXObject { name, stream, smask, px_width: width, px_height: height })
}

fn deflate(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes() -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(4, 2, image::Rgba([255, 0, 0, 128]));
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn decodes_data_url_and_raw_base64() {
        let bytes = png_bytes();
        let b64 = BASE64.encode(&bytes);
        assert_eq!(decode_inline(&format!("data:image/png;base64,{}", b64)), Some(bytes.clone()));
        assert_eq!(decode_inline(&b64), Some(bytes));
        assert_eq!(decode_inline("data:image/png,plain"), None);
        assert_eq!(decode_inline("!!not base64!!"), None);
    }

    #[test]
    fn png_with_alpha_gets_smask() {
        let x = build_xobject("OImg1".into(), &png_bytes()).unwrap();
        assert_eq!((x.px_width, x.px_height), (4, 2));
        assert!(x.smask.is_some());
    }

    #[test]
    fn garbage_bytes_are_an_error() {
        assert!(build_xobject("OImg1".into(), b"not an image").is_err());
    }

    #[test]
    fn opaque_image_skips_smask() {
        let img = image::RgbaImage::from_pixel(2, 2, image::Rgba([0, 128, 255, 255]));
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        let x = build_xobject("OImg1".into(), &out.into_inner()).unwrap();
        assert!(x.smask.is_none());
    }
}
