//! Pre-trace enhancement: edge-preserving smoothing followed by an unsharp
//! mask, applied to the colour channels only.
//!
//! The smoothing is the recursive-filter variant of the domain transform
//! (Gastal & Oliveira 2011). Each pass filters rows, then columns, with a
//! per-pixel feedback weight `a^d` where `d` grows with the local colour
//! difference, so strong edges stop the filter from bleeding across them.

use image::{ImageBuffer, Rgb, RgbImage};
use imageproc::filter::gaussian_blur_f32;
use imageproc::map::map_colors2;

use crate::config::EnhanceParams;
use crate::error::ConversionError;
use crate::raster::RasterBuffer;

pub struct Enhancer {
    params: EnhanceParams,
}

impl Enhancer {
    pub fn new(params: EnhanceParams) -> Self {
        Self { params }
    }

    /// Smooth, then sharpen as `amount * smoothed + (1 - amount) * blurred`.
    /// The alpha channel, if any, is left exactly as it came in.
    pub fn enhance(&self, buffer: RasterBuffer) -> Result<RasterBuffer, ConversionError> {
        let p = &self.params;
        if p.spatial_sigma <= 0.0 || p.range_sigma <= 0.0 || p.blur_sigma <= 0.0 {
            return Err(ConversionError::Enhancement(format!(
                "filter sigmas must be positive (spatial {}, range {}, blur {})",
                p.spatial_sigma, p.range_sigma, p.blur_sigma
            )));
        }
        let (width, height) = buffer.dimensions();
        if width == 0 || height == 0 {
            return Err(ConversionError::Enhancement("image is empty".into()));
        }

        let smoothed = edge_preserving_smooth(buffer.rgb(), p.spatial_sigma, p.range_sigma, p.iterations);
        let blurred = gaussian_blur_f32(&smoothed, p.blur_sigma);
        let sharpened = weighted_sum(&smoothed, p.amount, &blurred, 1.0 - p.amount);

        log::debug!("enhanced {width}x{height} raster");
        Ok(buffer.with_rgb(sharpened))
    }
}

impl Default for Enhancer {
    fn default() -> Self {
        Self::new(EnhanceParams::default())
    }
}

/// Domain-transform recursive filter on an 8-bit RGB image.
fn edge_preserving_smooth(rgb: &RgbImage, sigma_s: f32, sigma_r: f32, iterations: u32) -> RgbImage {
    let (w, h) = rgb.dimensions();
    let (w, h) = (w as usize, h as usize);
    let mut data: Vec<f32> = rgb.as_raw().iter().map(|&v| v as f32 / 255.0).collect();

    let ratio = sigma_s / sigma_r;
    let channel_distance = |data: &[f32], a: usize, b: usize| -> f32 {
        (0..3).map(|c| (data[a * 3 + c] - data[b * 3 + c]).abs()).sum()
    };

    // Domain-transform derivatives, stored at the later of the two pixels.
    // The first column/row never feeds a weight, so it stays at 1.
    let mut dx = vec![1.0f32; w * h];
    let mut dy = vec![1.0f32; w * h];
    for y in 0..h {
        for x in 1..w {
            let i = y * w + x;
            dx[i] = 1.0 + ratio * channel_distance(&data, i - 1, i);
        }
    }
    for y in 1..h {
        for x in 0..w {
            let i = y * w + x;
            dy[i] = 1.0 + ratio * channel_distance(&data, i - w, i);
        }
    }

    let n = iterations.max(1) as i32;
    let norm = (4f32.powi(n) - 1.0).sqrt();
    for i in 0..n {
        let sigma_h = sigma_s * 3f32.sqrt() * 2f32.powi(n - i - 1) / norm;
        let a = (-(2f32.sqrt()) / sigma_h).exp();
        let wx: Vec<f32> = dx.iter().map(|&d| a.powf(d)).collect();
        let wy: Vec<f32> = dy.iter().map(|&d| a.powf(d)).collect();

        for y in 0..h {
            recursive_pass(&mut data, &wx, y * w, 1, w);
        }
        for x in 0..w {
            recursive_pass(&mut data, &wy, x, w, h);
        }
    }

    let raw = data
        .iter()
        .map(|&v| (v * 255.0).round().clamp(0.0, 255.0) as u8)
        .collect();
    ImageBuffer::from_raw(w as u32, h as u32, raw).unwrap_or_else(|| RgbImage::new(w as u32, h as u32))
}

/// Causal then anti-causal first-order filter along one line of pixels.
/// `start` and `stride` are in pixels; `weights` is indexed like the image.
fn recursive_pass(data: &mut [f32], weights: &[f32], start: usize, stride: usize, len: usize) {
    for k in 1..len {
        let cur = start + k * stride;
        let prev = cur - stride;
        let v = weights[cur];
        for c in 0..3 {
            let p = data[prev * 3 + c];
            let q = &mut data[cur * 3 + c];
            *q += (p - *q) * v;
        }
    }
    for k in (0..len.saturating_sub(1)).rev() {
        let cur = start + k * stride;
        let next = cur + stride;
        let v = weights[next];
        for c in 0..3 {
            let p = data[next * 3 + c];
            let q = &mut data[cur * 3 + c];
            *q += (p - *q) * v;
        }
    }
}

fn weighted_sum(a: &RgbImage, wa: f32, b: &RgbImage, wb: f32) -> RgbImage {
    map_colors2(a, b, |pa, pb| {
        Rgb(std::array::from_fn(|c| {
            (pa[c] as f32 * wa + pb[c] as f32 * wb).round().clamp(0.0, 255.0) as u8
        }))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbaImage};

    fn step_image(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, _| {
            if x < width / 2 {
                Rgb([20, 20, 20])
            } else {
                Rgb([235, 235, 235])
            }
        })
    }

    #[test]
    fn flat_image_stays_flat() {
        let img = RgbImage::from_pixel(12, 9, Rgb([120, 60, 200]));
        let out = Enhancer::default()
            .enhance(RasterBuffer::from_image(DynamicImage::ImageRgb8(img)))
            .unwrap();
        for px in out.rgb().pixels() {
            for (got, want) in px.0.iter().zip([120u8, 60, 200]) {
                assert!((*got as i32 - want as i32).abs() <= 2, "{:?}", px);
            }
        }
    }

    #[test]
    fn smoothing_keeps_strong_edges() {
        let smoothed = edge_preserving_smooth(&step_image(40, 10), 50.0, 0.2, 3);
        let left = smoothed.get_pixel(2, 5).0[0];
        let right = smoothed.get_pixel(37, 5).0[0];
        assert!(left < 40, "left side bled: {left}");
        assert!(right > 215, "right side bled: {right}");
    }

    #[test]
    fn smoothing_flattens_low_contrast_noise() {
        let noisy = RgbImage::from_fn(32, 32, |x, y| {
            let v = if (x * 7 + y * 13) % 5 == 0 { 132 } else { 128 };
            Rgb([v, v, v])
        });
        let smoothed = edge_preserving_smooth(&noisy, 50.0, 0.2, 3);
        let (min, max) = smoothed
            .pixels()
            .fold((255u8, 0u8), |(lo, hi), p| (lo.min(p.0[0]), hi.max(p.0[0])));
        assert!(max - min < 4, "spread {min}..{max}");
    }

    #[test]
    fn alpha_is_untouched() {
        let rgba = RgbaImage::from_fn(10, 10, |x, y| image::Rgba([x as u8 * 20, y as u8 * 20, 90, (x * 25) as u8]));
        let original_alpha: Vec<u8> = rgba.pixels().map(|p| p.0[3]).collect();

        let out = Enhancer::default()
            .enhance(RasterBuffer::from_image(DynamicImage::ImageRgba8(rgba)))
            .unwrap();
        let alpha: Vec<u8> = out.alpha().unwrap().pixels().map(|p| p.0[0]).collect();
        assert_eq!(alpha, original_alpha);
    }

    #[test]
    fn enhancing_twice_is_well_defined() {
        let enhancer = Enhancer::default();
        let once = enhancer
            .enhance(RasterBuffer::from_image(DynamicImage::ImageRgb8(step_image(24, 16))))
            .unwrap();
        let twice = enhancer.enhance(once).unwrap();
        assert_eq!(twice.dimensions(), (24, 16));
    }

    #[test]
    fn single_pixel_image() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(1, 1, Rgb([1, 2, 3])));
        let out = Enhancer::default().enhance(RasterBuffer::from_image(img)).unwrap();
        assert_eq!(out.dimensions(), (1, 1));
    }

    #[test]
    fn weighted_sum_sharpens_and_clamps() {
        let a = RgbImage::from_pixel(3, 2, Rgb([200, 100, 10]));
        let b = RgbImage::from_pixel(3, 2, Rgb([100, 100, 40]));
        let out = weighted_sum(&a, 1.5, &b, -0.5);
        assert_eq!(out.dimensions(), (3, 2));
        // 300-50, 150-50, 15-20 clamped
        assert!(out.pixels().all(|p| p.0 == [250, 100, 0]));
    }

    #[test]
    fn invalid_sigma_is_an_enhancement_failure() {
        let enhancer = Enhancer::new(EnhanceParams {
            blur_sigma: 0.0,
            ..EnhanceParams::default()
        });
        let img = DynamicImage::ImageRgb8(RgbImage::new(4, 4));
        let err = enhancer.enhance(RasterBuffer::from_image(img)).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::EnhancementFailure);
    }
}
