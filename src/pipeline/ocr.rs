//! OCR engine adapter.
//!
//! The router talks to OCR through the [`OcrEngine`] trait. The production
//! implementation, [`TesseractEngine`], shells out to the `tesseract`
//! executable: it needs no native headers at build time, and the engine's
//! location comes from [`crate::ExtractionConfig::tesseract_cmd`] rather than
//! any global setting.
//!
//! Every call uses the same [`RecognitionMode`]. With the default
//! single-block mode Tesseract skips layout analysis and reads the page as
//! one run of text, which trades column structure for predictable output
//! across similarly formatted datasheets.

use crate::config::RecognitionMode;
use crate::error::OcrError;
use crate::pipeline::encode::write_temp_png;
use crate::pipeline::preprocess::PreprocessedImage;
use std::path::PathBuf;
use std::process::Command;
use std::time::Instant;
use tracing::debug;

/// Text recognition over a preprocessed bitmap.
pub trait OcrEngine: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Recognise the text in `image`. The result is raw engine output;
    /// cleanup happens in [`crate::pipeline::postprocess::clean_ocr_text`].
    fn recognize(&self, image: &PreprocessedImage, mode: RecognitionMode)
        -> Result<String, OcrError>;
}

/// [`OcrEngine`] that runs the Tesseract command-line tool.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    command: PathBuf,
    tessdata_dir: Option<PathBuf>,
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self::new("tesseract")
    }
}

impl TesseractEngine {
    pub fn new(command: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            tessdata_dir: None,
        }
    }

    pub fn with_tessdata_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.tessdata_dir = Some(dir.into());
        self
    }

    /// `true` if `<command> --version` runs successfully.
    pub fn is_available(&self) -> bool {
        Command::new(&self.command)
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn command_display(&self) -> String {
        self.command.display().to_string()
    }
}

impl OcrEngine for TesseractEngine {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn recognize(
        &self,
        image: &PreprocessedImage,
        mode: RecognitionMode,
    ) -> Result<String, OcrError> {
        let start = Instant::now();
        let input = write_temp_png(image)?;

        let mut cmd = Command::new(&self.command);
        cmd.arg(input.path())
            .arg("stdout")
            .arg("--psm")
            .arg(mode.psm().to_string());
        if let Some(ref dir) = self.tessdata_dir {
            cmd.arg("--tessdata-dir").arg(dir);
        }

        let output = cmd.output().map_err(|e| OcrError::Unavailable {
            command: self.command_display(),
            reason: e.to_string(),
        })?;

        if !output.status.success() {
            return Err(OcrError::EngineFailed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!(
            "Page {}: tesseract --psm {} → {} chars in {:?}",
            image.page_num,
            mode.psm(),
            text.chars().count(),
            start.elapsed()
        );
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::preprocess::{preprocess, PreprocessOptions};
    use crate::pipeline::render::PageImage;
    use image::{DynamicImage, GrayImage, Luma};

    fn page() -> PreprocessedImage {
        preprocess(
            &PageImage {
                page_num: 1,
                image: DynamicImage::ImageLuma8(GrayImage::from_pixel(8, 8, Luma([255]))),
            },
            &PreprocessOptions::default(),
        )
    }

    #[test]
    fn missing_binary_is_unavailable() {
        let engine = TesseractEngine::new("/definitely/not/tesseract");
        assert!(!engine.is_available());
        let err = engine
            .recognize(&page(), RecognitionMode::SingleBlock)
            .unwrap_err();
        assert!(matches!(err, OcrError::Unavailable { .. }), "got: {err}");
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_is_engine_failure() {
        // `false` ignores its arguments and exits 1.
        let engine = TesseractEngine::new("false");
        let err = engine
            .recognize(&page(), RecognitionMode::SingleBlock)
            .unwrap_err();
        assert!(matches!(err, OcrError::EngineFailed { .. }), "got: {err}");
    }

    #[cfg(unix)]
    #[test]
    fn stdout_is_returned_verbatim() {
        // `echo` prints its arguments: the png path, "stdout", "--psm", "6".
        let engine = TesseractEngine::new("echo");
        let text = engine
            .recognize(&page(), RecognitionMode::SingleBlock)
            .unwrap();
        assert!(text.trim_end().ends_with("stdout --psm 6"), "got: {text:?}");
    }

    #[cfg(unix)]
    #[test]
    fn tessdata_dir_is_forwarded() {
        let engine = TesseractEngine::new("echo").with_tessdata_dir("/opt/tessdata");
        let text = engine
            .recognize(&page(), RecognitionMode::SparseText)
            .unwrap();
        assert!(text.contains("--psm 11 --tessdata-dir /opt/tessdata"), "got: {text:?}");
    }
}
