//! Image encoding: `DynamicImage` → base64 PNG wrapped in `ImageData`.
//!
//! Vision APIs accept images as base64 data embedded in the JSON request
//! body. PNG keeps rendered text crisp; JPEG artefacts around glyphs make
//! small print and reference numbers harder for the model to read.

use crate::error::PaperScanError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// Encode a rasterised page as a base64 PNG ready for the vision API.
///
/// `page_num` is 1-based and only used for error reporting.
pub fn encode_page(img: &DynamicImage, page_num: usize) -> Result<ImageData, PaperScanError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| PaperScanError::ImageEncodingFailed {
            page: page_num,
            detail: e.to_string(),
        })?;

    let b64 = STANDARD.encode(&buf);
    debug!("Encoded page {} → {} bytes base64", page_num, b64.len());

    Ok(ImageData::new(b64, "image/png"))
}

/// Encode every page, keeping page order.
pub fn encode_pages(images: &[DynamicImage]) -> Result<Vec<ImageData>, PaperScanError> {
    images
        .iter()
        .enumerate()
        .map(|(idx, img)| encode_page(img, idx + 1))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn encode_small_image() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255])));
        let data = encode_page(&img, 1).expect("encode should succeed");
        assert_eq!(data.mime_type, "image/png");
        let decoded = STANDARD.decode(&data.data).expect("valid base64");
        assert!(decoded.starts_with(b"\x89PNG"));
    }

    #[test]
    fn encode_pages_keeps_order() {
        let small = DynamicImage::ImageRgba8(RgbaImage::new(2, 2));
        let large = DynamicImage::ImageRgba8(RgbaImage::new(64, 64));
        let encoded = encode_pages(&[small.clone(), large.clone()]).unwrap();
        assert_eq!(encoded.len(), 2);
        assert_eq!(encoded[0].data, encode_page(&small, 1).unwrap().data);
        assert_eq!(encoded[1].data, encode_page(&large, 2).unwrap().data);
    }
}
