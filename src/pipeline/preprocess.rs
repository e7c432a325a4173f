//! Image preprocessing for OCR: grayscale → median denoise → adaptive
//! Gaussian threshold.
//!
//! The order and parameters are fixed by [`PreprocessOptions`] and do not
//! adapt to image content. They favour dense printed tables: the 3×3 median
//! removes scanner speckle without eroding thin strokes, and a local
//! threshold copes with uneven lighting across a scanned page where a single
//! global cutoff would wash out one side.
//!
//! `imageproc::contrast::adaptive_threshold` uses an unweighted box mean, so
//! the Gaussian-weighted variant is implemented here: the local mean is a
//! separable Gaussian blur over a `block_size`² window with replicated
//! borders, rounded to 8 bits, and a pixel turns white when it is brighter
//! than `mean - offset`. The blur is hand-written rather than
//! `imageproc::filter::separable_filter_equal` because that truncates the
//! weighted sum back to `u8`, which shifts the mean by up to one level.

use crate::config::ExtractionConfig;
use crate::pipeline::render::PageImage;
use image::{DynamicImage, GrayImage, Luma};
use imageproc::filter::median_filter;
use tracing::debug;

/// A single-channel bitmap containing only 0 (ink) and 255 (paper).
#[derive(Debug, Clone)]
pub struct PreprocessedImage {
    /// 1-indexed page number the bitmap came from.
    pub page_num: usize,
    image: GrayImage,
}

impl PreprocessedImage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn as_gray(&self) -> &GrayImage {
        &self.image
    }
}

/// Preprocessing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreprocessOptions {
    /// Median kernel edge length (odd).
    pub denoise_kernel: u32,
    /// Threshold window edge length (odd, ≥ 3).
    pub block_size: u32,
    /// Subtracted from the local mean.
    pub offset: i32,
}

impl Default for PreprocessOptions {
    fn default() -> Self {
        Self {
            denoise_kernel: 3,
            block_size: 11,
            offset: 2,
        }
    }
}

impl From<&ExtractionConfig> for PreprocessOptions {
    fn from(c: &ExtractionConfig) -> Self {
        Self {
            denoise_kernel: c.denoise_kernel,
            block_size: c.threshold_block_size,
            offset: c.threshold_offset,
        }
    }
}

/// Run the full preprocessing pipeline on one page.
pub fn preprocess(page: &PageImage, options: &PreprocessOptions) -> PreprocessedImage {
    let gray = to_grayscale(&page.image);
    let denoised = denoise(&gray, options.denoise_kernel);
    let binary = adaptive_gaussian_threshold(&denoised, options.block_size, options.offset);
    debug!(
        "Preprocessed page {} ({}x{})",
        page.page_num,
        binary.width(),
        binary.height()
    );
    PreprocessedImage {
        page_num: page.page_num,
        image: binary,
    }
}

fn to_grayscale(image: &DynamicImage) -> GrayImage {
    image.to_luma8()
}

fn denoise(gray: &GrayImage, kernel: u32) -> GrayImage {
    let radius = kernel / 2;
    if radius == 0 {
        return gray.clone();
    }
    median_filter(gray, radius, radius)
}

/// Normalised 1-D Gaussian kernel of odd length `size`.
///
/// σ follows the usual rule for a kernel size with no explicit sigma:
/// `0.3 * ((size - 1) / 2 - 1) + 0.8`, i.e. σ = 2 for an 11-tap kernel.
fn gaussian_kernel(size: u32) -> Vec<f32> {
    let sigma = 0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    let center = (size / 2) as f32;
    let denom = 2.0 * sigma * sigma;
    let mut kernel: Vec<f32> = (0..size)
        .map(|i| {
            let x = i as f32 - center;
            (-(x * x) / denom).exp()
        })
        .collect();
    let sum: f32 = kernel.iter().sum();
    kernel.iter_mut().for_each(|k| *k /= sum);
    kernel
}

/// Gaussian-weighted local mean of every pixel, replicated borders.
fn gaussian_local_mean(gray: &GrayImage, block_size: u32) -> GrayImage {
    let (w, h) = gray.dimensions();
    if w == 0 || h == 0 {
        return gray.clone();
    }
    let kernel = gaussian_kernel(block_size);
    let radius = (block_size / 2) as i64;
    let (wi, hi) = (w as i64, h as i64);

    // Horizontal pass.
    let mut horizontal = vec![0f32; (w * h) as usize];
    for y in 0..h {
        for x in 0..wi {
            let mut acc = 0f32;
            for (k, weight) in kernel.iter().enumerate() {
                let sx = (x + k as i64 - radius).clamp(0, wi - 1) as u32;
                acc += weight * gray.get_pixel(sx, y)[0] as f32;
            }
            horizontal[(y as usize) * (w as usize) + x as usize] = acc;
        }
    }

    // Vertical pass.
    GrayImage::from_fn(w, h, |x, y| {
        let mut acc = 0f32;
        for (k, weight) in kernel.iter().enumerate() {
            let sy = (y as i64 + k as i64 - radius).clamp(0, hi - 1) as usize;
            acc += weight * horizontal[sy * (w as usize) + x as usize];
        }
        Luma([acc.round().clamp(0.0, 255.0) as u8])
    })
}

/// Binarize `gray` against its Gaussian-weighted local mean.
pub fn adaptive_gaussian_threshold(gray: &GrayImage, block_size: u32, offset: i32) -> GrayImage {
    let mean = gaussian_local_mean(gray, block_size);
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let pixel = gray.get_pixel(x, y)[0] as i32;
        let local = mean.get_pixel(x, y)[0] as i32;
        if pixel > local - offset {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}
