//! Image encoding: `PreprocessedImage` → PNG in a scoped temp file.
//!
//! The Tesseract executable reads its input from disk. PNG is lossless, so
//! the binarized strokes reach the engine exactly as the preprocessor left
//! them; JPEG ringing around sharp black/white edges would reintroduce the
//! noise the median filter just removed.
//!
//! The returned [`NamedTempFile`] deletes itself on drop, which covers every
//! exit path of the OCR call including early returns and panics. Nothing is
//! persisted.

use crate::error::OcrError;
use crate::pipeline::preprocess::PreprocessedImage;
use image::ImageFormat;
use std::io::{BufWriter, Cursor, Write};
use tempfile::NamedTempFile;
use tracing::debug;

/// PNG bytes of a preprocessed page.
pub fn encode_png(img: &PreprocessedImage) -> Result<Vec<u8>, OcrError> {
    let mut buf = Vec::new();
    img.as_gray()
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(|e| OcrError::Encode(e.to_string()))?;
    debug!("Encoded page {} → {} bytes PNG", img.page_num, buf.len());
    Ok(buf)
}

/// Write a preprocessed page to a temporary `.png` file.
pub fn write_temp_png(img: &PreprocessedImage) -> Result<NamedTempFile, OcrError> {
    let bytes = encode_png(img)?;
    let file = tempfile::Builder::new()
        .prefix("docextract-page-")
        .suffix(".png")
        .tempfile()?;
    {
        let mut writer = BufWriter::new(file.as_file());
        writer.write_all(&bytes)?;
        writer.flush()?;
    }
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::preprocess::{preprocess, PreprocessOptions};
    use crate::pipeline::render::PageImage;
    use image::{DynamicImage, Rgb, RgbImage};

    fn blank_page() -> PreprocessedImage {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(12, 8, Rgb([255, 255, 255])));
        preprocess(
            &PageImage {
                page_num: 1,
                image: img,
            },
            &PreprocessOptions::default(),
        )
    }

    #[test]
    fn encodes_valid_png() {
        let bytes = encode_png(&blank_page()).expect("encode should succeed");
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
        let decoded = image::load_from_memory(&bytes).expect("valid png");
        assert_eq!((decoded.width(), decoded.height()), (12, 8));
    }

    #[test]
    fn temp_png_is_removed_on_drop() {
        let file = write_temp_png(&blank_page()).unwrap();
        let path = file.path().to_path_buf();
        assert!(path.exists());
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("png"));
        drop(file);
        assert!(!path.exists());
    }
}
