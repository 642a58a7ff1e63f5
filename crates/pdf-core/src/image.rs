//! Image embedding
//!
//! JPEG data passes straight through with the DCTDecode filter, which
//! keeps page-sized template scans cheap to embed. PNG data is decoded,
//! flattened onto white, and recompressed with FlateDecode.

use crate::{PdfError, Result};
use image::{ColorType, DynamicImage, ImageDecoder, ImageReader};
use lopdf::{Dictionary, Object, Stream};
use std::io::Cursor;

impl From<image::ImageError> for PdfError {
    fn from(err: image::ImageError) -> Self {
        PdfError::ImageError(err.to_string())
    }
}

const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Detected image format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
}

/// Detect image format from magic bytes
pub fn detect_format(data: &[u8]) -> Result<ImageFormat> {
    if data.len() < 8 {
        return Err(PdfError::ImageError("image data too short".to_string()));
    }

    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Ok(ImageFormat::Jpeg)
    } else if data.starts_with(&PNG_SIGNATURE) {
        Ok(ImageFormat::Png)
    } else {
        Err(PdfError::ImageError("unknown image format".to_string()))
    }
}

/// Width, height and component count read from a JPEG SOF segment
fn jpeg_frame_header(data: &[u8]) -> Result<(u32, u32, u8)> {
    // Walk the marker segments until a start-of-frame. The SOF payload
    // is precision (1), height (2), width (2), component count (1).
    let mut i = 2;
    while i + 10 < data.len() {
        if data[i] != 0xFF {
            i += 1;
            continue;
        }

        match data[i + 1] {
            // DHT, JPG and DAC share the 0xC0..=0xCF range but carry
            // no frame header
            0xC4 | 0xC8 | 0xCC => {}
            marker if (0xC0..=0xCF).contains(&marker) => {
                let height = u16::from_be_bytes([data[i + 5], data[i + 6]]);
                let width = u16::from_be_bytes([data[i + 7], data[i + 8]]);
                return Ok((width as u32, height as u32, data[i + 9]));
            }
            _ => {}
        }

        if i + 4 >= data.len() {
            break;
        }
        let segment_len = u16::from_be_bytes([data[i + 2], data[i + 3]]) as usize;
        if segment_len < 2 {
            break;
        }
        i += 2 + segment_len;
    }

    Err(PdfError::ImageError(
        "no JPEG frame header found".to_string(),
    ))
}

/// One channel composited over a white background
fn over_white(value: u8, alpha: u8) -> u8 {
    let a = alpha as f32 / 255.0;
    (value as f32 * a + 255.0 * (1.0 - a)) as u8
}

/// Image XObject ready for embedding
#[derive(Debug, Clone)]
pub struct ImageXObject {
    /// Pixel width
    pub width: u32,
    /// Pixel height
    pub height: u32,
    /// "DeviceRGB" or "DeviceGray"
    pub color_space: String,
    /// Bits per component
    pub bits_per_component: u8,
    /// "DCTDecode" for JPEG, "FlateDecode" for PNG
    pub filter: String,
    /// Stream payload, already in the filter's encoding
    pub data: Vec<u8>,
}

impl ImageXObject {
    /// Build an XObject from image file bytes, detecting the format
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        match detect_format(data)? {
            ImageFormat::Jpeg => Self::from_jpeg(data),
            ImageFormat::Png => Self::from_png(data),
        }
    }

    /// Embed JPEG bytes as-is behind DCTDecode
    pub fn from_jpeg(data: &[u8]) -> Result<Self> {
        let (width, height, components) = jpeg_frame_header(data)?;

        Ok(Self {
            width,
            height,
            color_space: if components == 1 {
                "DeviceGray".to_string()
            } else {
                "DeviceRGB".to_string()
            },
            bits_per_component: 8,
            filter: "DCTDecode".to_string(),
            data: data.to_vec(),
        })
    }

    /// Decode a PNG and re-encode the pixels behind FlateDecode
    ///
    /// PDF image XObjects carry no alpha, so transparent pixels are
    /// composited over white. Grayscale sources stay single-channel.
    pub fn from_png(data: &[u8]) -> Result<Self> {
        let reader = ImageReader::new(Cursor::new(data)).with_guessed_format()?;
        let decoder = reader.into_decoder()?;

        let (width, height) = decoder.dimensions();
        let color_type = decoder.color_type();
        let decoded = DynamicImage::from_decoder(decoder)?;

        let (pixels, color_space) = match color_type {
            ColorType::L8 | ColorType::L16 => {
                (decoded.to_luma8().into_raw(), "DeviceGray")
            }
            ColorType::La8 | ColorType::La16 => {
                let flat: Vec<u8> = decoded
                    .to_luma_alpha8()
                    .pixels()
                    .map(|p| over_white(p[0], p[1]))
                    .collect();
                (flat, "DeviceGray")
            }
            ColorType::Rgba8 | ColorType::Rgba16 => {
                let mut flat = Vec::with_capacity((width * height * 3) as usize);
                for p in decoded.to_rgba8().pixels() {
                    flat.push(over_white(p[0], p[3]));
                    flat.push(over_white(p[1], p[3]));
                    flat.push(over_white(p[2], p[3]));
                }
                (flat, "DeviceRGB")
            }
            _ => (decoded.to_rgb8().into_raw(), "DeviceRGB"),
        };

        let mut encoder =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        std::io::Write::write_all(&mut encoder, &pixels)?;

        Ok(Self {
            width,
            height,
            color_space: color_space.to_string(),
            bits_per_component: 8,
            filter: "FlateDecode".to_string(),
            data: encoder.finish()?,
        })
    }

    /// Build the image stream object
    pub fn to_pdf_stream(&self) -> Stream {
        let dict = Dictionary::from_iter([
            ("Type", Object::Name(b"XObject".to_vec())),
            ("Subtype", Object::Name(b"Image".to_vec())),
            ("Width", Object::Integer(self.width as i64)),
            ("Height", Object::Integer(self.height as i64)),
            (
                "ColorSpace",
                Object::Name(self.color_space.as_bytes().to_vec()),
            ),
            (
                "BitsPerComponent",
                Object::Integer(self.bits_per_component as i64),
            ),
            ("Filter", Object::Name(self.filter.as_bytes().to_vec())),
            ("Length", Object::Integer(self.data.len() as i64)),
        ]);

        Stream::new(dict, self.data.clone())
    }
}

/// Content stream operators placing an image at a position
///
/// `y` is a bottom-origin PDF coordinate; the caller flips it.
pub fn generate_image_operators(
    image_name: &str,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
) -> Vec<u8> {
    // q / cm / Do / Q: save state, position and scale, draw, restore
    format!("q\n{width} 0 0 {height} {x} {y} cm\n/{image_name} Do\nQ\n").into_bytes()
}
