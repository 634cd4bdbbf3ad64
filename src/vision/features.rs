//! Color and texture statistics for water sample photos.
//!
//! Every image is resampled to a fixed 300x300 canvas before measuring, so
//! phone photos of any size or aspect produce comparable numbers. The four
//! statistics and their order are a compatibility contract with the trained
//! classifier artifact: [hue, saturation, brightness, texture].

use image::imageops::FilterType;
use image::GenericImageView;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Canonical analysis resolution. Matches the resolution the bundled
/// classifier artifact was trained against.
const ANALYSIS_SIZE: u32 = 300;

/// Fixed 4-tuple of image statistics consumed by the quality classifier.
///
/// Hue is in [0, 180), saturation and brightness in [0, 255] (OpenCV-style
/// HSV ranges, which the training data used). The texture score is the
/// variance of the Laplacian response over the grayscale image: high
/// variance means sharp particulate detail (turbid water), low variance a
/// smooth, clear sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub mean_hue: f64,
    pub mean_saturation: f64,
    pub mean_brightness: f64,
    pub texture_score: f64,
}

impl FeatureVector {
    /// Feature order expected by the classifier. Must never change without
    /// retraining the artifact.
    pub fn as_model_input(&self) -> [f64; 4] {
        [
            self.mean_hue,
            self.mean_saturation,
            self.mean_brightness,
            self.texture_score,
        ]
    }
}

/// Compute the feature vector for a raster image supplied as raw bytes.
///
/// Undecodable bytes (corrupt data, unsupported format, empty file) are an
/// expected outcome and come back as `Error::ImageDecode`. A decoded image
/// whose statistics cannot be computed reports `Error::FeatureExtraction`.
pub fn extract_features(bytes: &[u8]) -> Result<FeatureVector> {
    let decoded = image::load_from_memory(bytes)?;
    let (width, height) = decoded.dimensions();
    if width == 0 || height == 0 {
        return Err(Error::FeatureExtraction(
            "decoded image has no pixels".into(),
        ));
    }

    let canvas = decoded
        .resize_exact(ANALYSIS_SIZE, ANALYSIS_SIZE, FilterType::Triangle)
        .to_rgb8();

    let mut hue_sum = 0.0;
    let mut sat_sum = 0.0;
    let mut val_sum = 0.0;
    for pixel in canvas.pixels() {
        let (h, s, v) = rgb_to_hsv(pixel.0[0], pixel.0[1], pixel.0[2]);
        hue_sum += h;
        sat_sum += s;
        val_sum += v;
    }
    let pixel_count = (ANALYSIS_SIZE * ANALYSIS_SIZE) as f64;

    let gray = image::DynamicImage::ImageRgb8(canvas.clone()).to_luma8();
    let texture_score = laplacian_variance(&gray).ok_or_else(|| {
        Error::FeatureExtraction("image too small for texture analysis".into())
    })?;

    Ok(FeatureVector {
        mean_hue: hue_sum / pixel_count,
        mean_saturation: sat_sum / pixel_count,
        mean_brightness: val_sum / pixel_count,
        texture_score,
    })
}

/// RGB -> HSV with OpenCV ranges: H in [0, 180), S and V in [0, 255].
fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (f64, f64, f64) {
    let r = r as f64;
    let g = g as f64;
    let b = b as f64;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let value = max;
    let saturation = if max > 0.0 { 255.0 * delta / max } else { 0.0 };

    if delta == 0.0 {
        return (0.0, saturation, value);
    }

    let mut hue = if max == r {
        60.0 * (g - b) / delta
    } else if max == g {
        120.0 + 60.0 * (b - r) / delta
    } else {
        240.0 + 60.0 * (r - g) / delta
    };
    if hue < 0.0 {
        hue += 360.0;
    }

    (hue / 2.0, saturation, value)
}

/// Population variance of the 3x3 Laplacian response over the interior of a
/// grayscale image. Returns `None` when the image has no interior.
fn laplacian_variance(gray: &image::GrayImage) -> Option<f64> {
    let (width, height) = gray.dimensions();
    if width < 3 || height < 3 {
        return None;
    }

    let at = |x: u32, y: u32| gray.get_pixel(x, y).0[0] as f64;

    let mut responses = Vec::with_capacity(((width - 2) * (height - 2)) as usize);
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let response =
                at(x, y - 1) + at(x, y + 1) + at(x - 1, y) + at(x + 1, y) - 4.0 * at(x, y);
            responses.push(response);
        }
    }

    let count = responses.len() as f64;
    let mean = responses.iter().sum::<f64>() / count;
    let variance = responses
        .iter()
        .map(|r| (r - mean) * (r - mean))
        .sum::<f64>()
        / count;
    Some(variance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn png_bytes(img: RgbImage) -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut buffer, ImageFormat::Png)
            .unwrap();
        buffer.into_inner()
    }

    #[test]
    fn solid_color_has_zero_texture() {
        let img = RgbImage::from_pixel(64, 64, Rgb([80, 120, 200]));
        let features = extract_features(&png_bytes(img)).unwrap();
        assert!(features.texture_score.abs() < 1e-9);
    }

    #[test]
    fn pure_blue_hue_matches_opencv_range() {
        let img = RgbImage::from_pixel(32, 32, Rgb([0, 0, 255]));
        let features = extract_features(&png_bytes(img)).unwrap();
        // OpenCV blue: H = 120, S = 255, V = 255.
        assert!((features.mean_hue - 120.0).abs() < 1.0);
        assert!((features.mean_saturation - 255.0).abs() < 1.0);
        assert!((features.mean_brightness - 255.0).abs() < 1.0);
    }

    #[test]
    fn checkerboard_scores_higher_texture_than_flat() {
        let mut noisy = RgbImage::new(64, 64);
        for (x, y, pixel) in noisy.enumerate_pixels_mut() {
            let shade = if (x + y) % 2 == 0 { 255 } else { 0 };
            *pixel = Rgb([shade, shade, shade]);
        }
        let noisy_score = extract_features(&png_bytes(noisy)).unwrap().texture_score;

        let flat = RgbImage::from_pixel(64, 64, Rgb([128, 128, 128]));
        let flat_score = extract_features(&png_bytes(flat)).unwrap().texture_score;

        assert!(noisy_score > flat_score);
    }

    #[test]
    fn corrupt_bytes_report_decode_failure() {
        let result = extract_features(b"not an image at all");
        assert!(matches!(result, Err(crate::Error::ImageDecode(_))));
    }

    #[test]
    fn empty_input_reports_decode_failure() {
        assert!(matches!(
            extract_features(&[]),
            Err(crate::Error::ImageDecode(_))
        ));
    }

    #[test]
    fn model_input_order_is_fixed() {
        let features = FeatureVector {
            mean_hue: 1.0,
            mean_saturation: 2.0,
            mean_brightness: 3.0,
            texture_score: 4.0,
        };
        assert_eq!(features.as_model_input(), [1.0, 2.0, 3.0, 4.0]);
    }
}
