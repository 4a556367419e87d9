use crate::config::{AdaptiveConfig, AdaptiveMethod, Binarization};
use crate::error::{ensure_non_empty, PreprocessError};
use image::{GrayImage, Luma, RgbImage};
use imageproc::contrast::{threshold, ThresholdType};
use imageproc::stats::histogram;

use super::grayscale;

/// Reduce the image to two tones, replicated back into three channels
pub fn apply(
    image: RgbImage,
    mode: Binarization,
    config: &AdaptiveConfig,
) -> Result<RgbImage, PreprocessError> {
    ensure_non_empty(image.width(), image.height())?;

    let gray = grayscale::to_gray(&image);
    let binary = match mode {
        Binarization::Simple => otsu_threshold(&gray),
        Binarization::Adaptive => adaptive_threshold(&gray, config),
    };
    Ok(grayscale::to_rgb(&binary))
}

/// Global threshold picked by Otsu's method; pixels above it become 255
pub fn otsu_threshold(gray: &GrayImage) -> GrayImage {
    let level = otsu_level(gray);
    tracing::debug!("Otsu level: {}", level);
    threshold(gray, level, ThresholdType::Binary)
}

/// Level maximizing the between-class variance of the histogram
///
/// Sums are kept in 64 bits, so full-resolution photographs are safe.
pub fn otsu_level(gray: &GrayImage) -> u8 {
    let hist = histogram(gray);
    let counts = &hist.channels[0];

    let total_weight: u64 = counts.iter().map(|&c| c as u64).sum();
    let total_sum: f64 = counts
        .iter()
        .enumerate()
        .map(|(level, &c)| level as f64 * c as f64)
        .sum();

    let mut background_weight = 0u64;
    let mut background_sum = 0f64;
    let mut largest_variance = 0f64;
    let mut best_level = 0u8;

    for (level, &count) in counts.iter().enumerate() {
        background_weight += count as u64;
        if background_weight == 0 {
            continue;
        }
        let foreground_weight = total_weight - background_weight;
        if foreground_weight == 0 {
            break;
        }

        background_sum += level as f64 * count as f64;
        let background_mean = background_sum / background_weight as f64;
        let foreground_mean = (total_sum - background_sum) / foreground_weight as f64;

        let variance = background_weight as f64
            * foreground_weight as f64
            * (background_mean - foreground_mean).powi(2);
        if variance > largest_variance {
            largest_variance = variance;
            best_level = level as u8;
        }
    }

    best_level
}

/// Local threshold: each pixel is compared against its own neighborhood mean
/// minus a bias
///
/// Works where a single cutoff cannot, e.g. a shadow across half the page.
pub fn adaptive_threshold(gray: &GrayImage, config: &AdaptiveConfig) -> GrayImage {
    let means = match config.method {
        AdaptiveMethod::Gaussian => gaussian_means(gray, config.block_size),
        AdaptiveMethod::Mean => box_means(gray, config.block_size),
    };
    let width = gray.width() as usize;
    map_binary(gray, |x, y, value| {
        value as f32 > means[y as usize * width + x as usize] - config.bias
    })
}

fn map_binary<F>(gray: &GrayImage, is_on: F) -> GrayImage
where
    F: Fn(u32, u32, u8) -> bool,
{
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        if is_on(x, y, gray.get_pixel(x, y).0[0]) {
            Luma([255u8])
        } else {
            Luma([0u8])
        }
    })
}

/// Sigma matching a Gaussian kernel of the given odd size
fn block_sigma(block_size: u32) -> f32 {
    0.3 * ((block_size as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Gaussian-weighted neighborhood means, borders replicated
fn gaussian_means(gray: &GrayImage, block_size: u32) -> Vec<f32> {
    let (width, height) = (gray.width() as usize, gray.height() as usize);
    let radius = (block_size / 2) as isize;
    let sigma = block_sigma(block_size);

    let mut kernel: Vec<f32> = (-radius..=radius)
        .map(|i| (-((i * i) as f32) / (2.0 * sigma * sigma)).exp())
        .collect();
    let total: f32 = kernel.iter().sum();
    kernel.iter_mut().for_each(|k| *k /= total);

    let at = |v: isize, limit: usize| v.clamp(0, limit as isize - 1) as usize;

    let src = gray.as_raw();
    let mut rows = vec![0f32; width * height];
    for y in 0..height {
        for x in 0..width {
            rows[y * width + x] = kernel
                .iter()
                .enumerate()
                .map(|(k, w)| w * src[y * width + at(x as isize + k as isize - radius, width)] as f32)
                .sum();
        }
    }

    let mut means = vec![0f32; width * height];
    for y in 0..height {
        for x in 0..width {
            means[y * width + x] = kernel
                .iter()
                .enumerate()
                .map(|(k, w)| w * rows[at(y as isize + k as isize - radius, height) * width + x])
                .sum();
        }
    }
    means
}

/// Plain box means, windows clipped at the border
fn box_means(gray: &GrayImage, block_size: u32) -> Vec<f32> {
    let (width, height) = gray.dimensions();
    let half_window = (block_size / 2) as i32;
    let integral = compute_integral_image(gray);

    let mut means = Vec::with_capacity(width as usize * height as usize);
    for y in 0..height {
        for x in 0..width {
            let x1 = (x as i32 - half_window).max(0) as usize;
            let y1 = (y as i32 - half_window).max(0) as usize;
            let x2 = (x as i32 + half_window).min(width as i32 - 1) as usize + 1;
            let y2 = (y as i32 + half_window).min(height as i32 - 1) as usize + 1;

            let area = ((x2 - x1) * (y2 - y1)) as f64;
            let sum = integral[y2][x2] - integral[y1][x2] - integral[y2][x1] + integral[y1][x1];
            means.push((sum / area) as f32);
        }
    }
    means
}

/// Summed-area table with a leading zero row and column
fn compute_integral_image(img: &GrayImage) -> Vec<Vec<f64>> {
    let (width, height) = img.dimensions();
    let mut integral = vec![vec![0.0f64; width as usize + 1]; height as usize + 1];

    for y in 0..height as usize {
        for x in 0..width as usize {
            let val = img.get_pixel(x as u32, y as u32).0[0] as f64;
            integral[y + 1][x + 1] = val + integral[y][x + 1] + integral[y + 1][x] - integral[y][x];
        }
    }

    integral
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn gradient() -> RgbImage {
        RgbImage::from_fn(50, 50, |x, y| {
            let v = (x * 5 + y).min(255) as u8;
            Rgb([v, v, v])
        })
    }

    fn distinct_values(img: &RgbImage) -> Vec<u8> {
        let mut values: Vec<u8> = img.pixels().flat_map(|p| p.0).collect();
        values.sort_unstable();
        values.dedup();
        values
    }

    #[test]
    fn test_threshold_binarizes_image() {
        for mode in [Binarization::Simple, Binarization::Adaptive] {
            let result = apply(gradient(), mode, &AdaptiveConfig::default()).unwrap();
            for value in distinct_values(&result) {
                assert!(value == 0 || value == 255, "Expected binary pixel, got {}", value);
            }
            // Channels stay replicated
            assert!(result.pixels().all(|p| p.0[0] == p.0[1] && p.0[1] == p.0[2]));
        }
    }

    #[test]
    fn test_threshold_handles_text_pattern() {
        // Dark text on a light background
        let mut img = RgbImage::from_pixel(50, 20, Rgb([240, 240, 240]));
        for x in 10..40 {
            img.put_pixel(x, 10, Rgb([20, 20, 20]));
        }

        for mode in [Binarization::Simple, Binarization::Adaptive] {
            let result = apply(img.clone(), mode, &AdaptiveConfig::default()).unwrap();
            assert_eq!(result.get_pixel(25, 10).0, [0, 0, 0], "{:?}", mode);
            assert_eq!(result.get_pixel(25, 5).0, [255, 255, 255], "{:?}", mode);
        }
    }

    #[test]
    fn test_adaptive_flat_image_is_background() {
        let img = RgbImage::from_pixel(40, 40, Rgb([90, 90, 90]));
        let result = apply(img, Binarization::Adaptive, &AdaptiveConfig::default()).unwrap();
        assert!(result.pixels().all(|p| p.0 == [255, 255, 255]));
    }

    #[test]
    fn test_box_mean_variant() {
        let config = AdaptiveConfig {
            method: AdaptiveMethod::Mean,
            ..Default::default()
        };
        let mut gray = GrayImage::from_pixel(60, 30, Luma([200]));
        for y in 12..16 {
            for x in 20..40 {
                gray.put_pixel(x, y, Luma([30]));
            }
        }

        let binary = adaptive_threshold(&gray, &config);
        assert_eq!(binary.get_pixel(30, 14).0[0], 0);
        assert_eq!(binary.get_pixel(5, 5).0[0], 255);
    }

    #[test]
    fn test_otsu_level_matches_imageproc_on_small_images() {
        let img = GrayImage::from_fn(64, 48, |x, y| Luma([((x * 7 + y * 3) % 256) as u8]));
        assert_eq!(otsu_level(&img), imageproc::contrast::otsu_level(&img));

        let mut two_tone = GrayImage::from_pixel(30, 30, Luma([220]));
        for x in 0..10 {
            for y in 0..30 {
                two_tone.put_pixel(x, y, Luma([40]));
            }
        }
        assert_eq!(otsu_level(&two_tone), imageproc::contrast::otsu_level(&two_tone));
    }

    #[test]
    fn test_otsu_handles_full_resolution_photo() {
        // Enough bright pixels that level * count no longer fits in 32 bits
        let mut gray = GrayImage::from_pixel(4200, 4200, Luma([250]));
        for y in 0..100 {
            for x in 0..4200 {
                gray.put_pixel(x, y, Luma([20]));
            }
        }

        let level = otsu_level(&gray);
        assert!((20..250).contains(&level), "level was {}", level);

        let binary = otsu_threshold(&gray);
        assert_eq!(binary.get_pixel(10, 10).0[0], 0);
        assert_eq!(binary.get_pixel(10, 4000).0[0], 255);

        let uniform = GrayImage::from_pixel(4200, 4200, Luma([250]));
        assert!(otsu_threshold(&uniform).pixels().all(|p| p.0[0] == 255));
    }

    #[test]
    fn test_gaussian_kernel_sigma() {
        assert!((block_sigma(35) - 5.6).abs() < 1e-5);
        assert!((block_sigma(3) - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_adaptive_follows_lighting_gradient() {
        // Background darkens from right to left; simple thresholding marks the
        // dark side as foreground, adaptive does not
        let img = RgbImage::from_fn(200, 60, |x, _| {
            let v = (40 + x) as u8;
            Rgb([v, v, v])
        });

        let count_dark = |img: &RgbImage| img.pixels().filter(|p| p.0[0] == 0).count();
        let simple = apply(img.clone(), Binarization::Simple, &AdaptiveConfig::default()).unwrap();
        let adaptive = apply(img, Binarization::Adaptive, &AdaptiveConfig::default()).unwrap();

        assert!(count_dark(&simple) > 1000);
        assert_eq!(count_dark(&adaptive), 0);
    }
}
