use crate::config::DenoiseConfig;
use crate::error::{ensure_non_empty, PreprocessError};
use image::RgbImage;

/// Non-local means weights below this are dropped
const MIN_WEIGHT: f32 = 1e-3;

/// Suppress noise while keeping character strokes intact
/// Bilateral filter first, then a mild color non-local means pass
pub fn apply(image: RgbImage, config: &DenoiseConfig) -> Result<RgbImage, PreprocessError> {
    ensure_non_empty(image.width(), image.height())?;

    let smoothed = bilateral_filter(&image, config);
    Ok(non_local_means(&smoothed, config))
}

/// Copy of the image with `pad` replicated pixels on every side, as raw RGB
fn pad_replicate(image: &RgbImage, pad: usize) -> (Vec<u8>, usize) {
    let (width, height) = (image.width() as usize, image.height() as usize);
    let padded_width = width + 2 * pad;
    let padded_height = height + 2 * pad;
    let src = image.as_raw();

    let mut padded = Vec::with_capacity(padded_width * padded_height * 3);
    for py in 0..padded_height {
        let y = py.saturating_sub(pad).min(height - 1);
        for px in 0..padded_width {
            let x = px.saturating_sub(pad).min(width - 1);
            let i = (y * width + x) * 3;
            padded.extend_from_slice(&src[i..i + 3]);
        }
    }
    (padded, padded_width)
}

/// Bilateral filter over a circular neighborhood
///
/// Neighbors are weighted by spatial distance and by the L1 color distance to
/// the center pixel, so regions are smoothed but strong edges are not blurred
/// across.
pub fn bilateral_filter(image: &RgbImage, config: &DenoiseConfig) -> RgbImage {
    let (width, height) = (image.width() as usize, image.height() as usize);
    let radius = (config.bilateral_diameter / 2) as isize;
    let space_coeff = -0.5 / (config.sigma_space * config.sigma_space);
    let color_coeff = -0.5 / (config.sigma_color * config.sigma_color);

    let (padded, stride) = pad_replicate(image, radius as usize);

    // (offset into padded buffer, spatial weight)
    let mut offsets = Vec::new();
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let dist2 = dx * dx + dy * dy;
            if dist2 > radius * radius {
                continue;
            }
            let offset = (dy * stride as isize + dx) * 3;
            offsets.push((offset, (dist2 as f32 * space_coeff).exp()));
        }
    }
    let color_weights: Vec<f32> = (0..=3 * 255)
        .map(|d: i32| ((d * d) as f32 * color_coeff).exp())
        .collect();

    let mut out = RgbImage::new(width as u32, height as u32);
    let dst: &mut [u8] = &mut out;
    let pad = radius as usize;

    for y in 0..height {
        for x in 0..width {
            let center = (((y + pad) * stride + x + pad) * 3) as isize;
            let c = &padded[center as usize..center as usize + 3];

            let mut sum = [0f32; 3];
            let mut weight_sum = 0f32;
            for &(offset, space_weight) in &offsets {
                let n = (center + offset) as usize;
                let p = &padded[n..n + 3];
                let dist = (p[0] as i32 - c[0] as i32).abs()
                    + (p[1] as i32 - c[1] as i32).abs()
                    + (p[2] as i32 - c[2] as i32).abs();
                let weight = space_weight * color_weights[dist as usize];
                sum[0] += weight * p[0] as f32;
                sum[1] += weight * p[1] as f32;
                sum[2] += weight * p[2] as f32;
                weight_sum += weight;
            }

            let i = (y * width + x) * 3;
            for ch in 0..3 {
                dst[i + ch] = (sum[ch] / weight_sum).round().clamp(0.0, 255.0) as u8;
            }
        }
    }

    out
}

/// Non-local means over all three channels
///
/// Every pixel becomes a weighted average of the pixels in its search window,
/// weighted by how similar the patches around them are. Patch distances for a
/// given displacement are computed for the whole image at once with running
/// box sums, so the cost does not grow with the patch size.
pub fn non_local_means(image: &RgbImage, config: &DenoiseConfig) -> RgbImage {
    let (width, height) = (image.width() as usize, image.height() as usize);
    let template_radius = (config.template_window / 2) as usize;
    let search_radius = (config.search_window / 2) as isize;
    let template = 2 * template_radius + 1;

    let (padded, stride) = pad_replicate(image, template_radius + search_radius as usize);

    // Patch distance is the sum of squared differences; normalizing by the
    // sample count gives the mean squared difference the strength applies to
    let samples = (template * template * 3) as f32;
    let h2 = config.strength * config.strength;
    let max_distance = ((1.0 / MIN_WEIGHT).ln() * h2 * samples).ceil() as usize;
    let weights: Vec<f32> = (0..=max_distance)
        .map(|d| (-(d as f32) / (samples * h2)).exp())
        .collect();

    // Patch centers span the output plus the template radius on each side;
    // that region starts `search_radius` pixels into the padded buffer
    let region_width = width + 2 * template_radius;
    let region_height = height + 2 * template_radius;
    let origin = search_radius as usize;

    let mut diff = vec![0u32; region_width * region_height];
    let mut row_sums = vec![0u32; width * region_height];
    let mut column = vec![0u32; width];
    let mut weight_sum = vec![0f32; width * height];
    let mut acc = vec![0f32; width * height * 3];

    for oy in -search_radius..=search_radius {
        for ox in -search_radius..=search_radius {
            let shift = (oy * stride as isize + ox) * 3;

            for ry in 0..region_height {
                let row = ((ry + origin) * stride + origin) * 3;
                for rx in 0..region_width {
                    let a = row + rx * 3;
                    let b = (a as isize + shift) as usize;
                    let mut d = 0u32;
                    for ch in 0..3 {
                        let delta = padded[a + ch] as i32 - padded[b + ch] as i32;
                        d += (delta * delta) as u32;
                    }
                    diff[ry * region_width + rx] = d;
                }
            }

            // Horizontal box sums, one per output column
            for ry in 0..region_height {
                let line = &diff[ry * region_width..(ry + 1) * region_width];
                let mut running: u32 = line[..template].iter().sum();
                row_sums[ry * width] = running;
                for x in 1..width {
                    running = running + line[x + template - 1] - line[x - 1];
                    row_sums[ry * width + x] = running;
                }
            }

            // Vertical box sums, rolled down the image
            column.iter_mut().for_each(|c| *c = 0);
            for ry in 0..template {
                for x in 0..width {
                    column[x] += row_sums[ry * width + x];
                }
            }

            for y in 0..height {
                if y > 0 {
                    for x in 0..width {
                        column[x] = column[x] + row_sums[(y + template - 1) * width + x]
                            - row_sums[(y - 1) * width + x];
                    }
                }

                let src_row = ((y + template_radius + origin) * stride
                    + template_radius
                    + origin) as isize
                    * 3
                    + shift;
                for x in 0..width {
                    let distance = column[x] as usize;
                    if distance > max_distance {
                        continue;
                    }
                    let weight = weights[distance];
                    let p = (src_row + x as isize * 3) as usize;
                    let i = y * width + x;
                    weight_sum[i] += weight;
                    acc[i * 3] += weight * padded[p] as f32;
                    acc[i * 3 + 1] += weight * padded[p + 1] as f32;
                    acc[i * 3 + 2] += weight * padded[p + 2] as f32;
                }
            }
        }
    }

    let mut out = RgbImage::new(width as u32, height as u32);
    let dst: &mut [u8] = &mut out;
    for (i, &total) in weight_sum.iter().enumerate() {
        for ch in 0..3 {
            dst[i * 3 + ch] = (acc[i * 3 + ch] / total).round().clamp(0.0, 255.0) as u8;
        }
    }
    out
}
