//! Contour geometry and rotation helpers used by the deskew step

use image::{Rgb, RgbImage};
use imageproc::geometry::convex_hull;
use imageproc::point::Point;

/// Rotated rectangle enclosing a point set
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinAreaRect {
    pub center: (f64, f64),
    pub width: f64,
    pub height: f64,
    /// Angle of the rectangle's first side in degrees, in [-90, 0)
    pub angle: f64,
}

/// Minimum-area enclosing rectangle via rotating calipers over the convex hull
///
/// `imageproc::geometry::min_area_rect` only returns integer corners; the
/// skew estimate needs the side angle as a float.
///
/// Returns `None` for an empty point set. The angle follows the usual image
/// convention (y axis pointing down) folded into [-90, 0), so an axis-aligned
/// rectangle reports -90.
pub fn min_area_rect(points: &[Point<i32>]) -> Option<MinAreaRect> {
    if points.is_empty() {
        return None;
    }
    let hull = convex_hull(points);
    let first = hull.first()?;

    if hull.len() == 1 {
        return Some(MinAreaRect {
            center: (first.x as f64, first.y as f64),
            width: 0.0,
            height: 0.0,
            angle: -90.0,
        });
    }

    let hull: Vec<(f64, f64)> = hull.iter().map(|p| (p.x as f64, p.y as f64)).collect();
    let n = hull.len();
    let mut best: Option<(f64, MinAreaRect)> = None;

    for i in 0..n {
        let (x0, y0) = hull[i];
        let (x1, y1) = hull[(i + 1) % n];
        let (ex, ey) = (x1 - x0, y1 - y0);
        let length = (ex * ex + ey * ey).sqrt();
        if length < f64::EPSILON {
            continue;
        }
        let (nx, ny) = (ex / length, ey / length);

        let mut min_n = f64::MAX;
        let mut max_n = f64::MIN;
        let mut min_p = f64::MAX;
        let mut max_p = f64::MIN;
        for &(px, py) in &hull {
            let along = nx * (px - x0) + ny * (py - y0);
            let across = -ny * (px - x0) + nx * (py - y0);
            min_n = min_n.min(along);
            max_n = max_n.max(along);
            min_p = min_p.min(across);
            max_p = max_p.max(across);
        }

        let width = max_n - min_n;
        let height = max_p - min_p;
        let area = width * height;
        if best.as_ref().is_some_and(|(best_area, _)| area >= *best_area) {
            continue;
        }

        let mid_n = (min_n + max_n) / 2.0;
        let mid_p = (min_p + max_p) / 2.0;
        let center = (
            x0 + mid_n * nx - mid_p * ny,
            y0 + mid_n * ny + mid_p * nx,
        );
        let angle = ny.atan2(nx).to_degrees().rem_euclid(90.0) - 90.0;
        best = Some((
            area,
            MinAreaRect {
                center,
                width,
                height,
                angle,
            },
        ));
    }

    best.map(|(_, rect)| rect)
}

/// Rotate clockwise (as displayed) by `degrees` about the image center
///
/// Output keeps the input dimensions. Samples use a bicubic kernel and
/// positions outside the frame take the nearest edge pixel.
pub fn rotate_about_center(image: &RgbImage, degrees: f32) -> RgbImage {
    let (width, height) = image.dimensions();
    let cx = (width / 2) as f32;
    let cy = (height / 2) as f32;
    let (sin, cos) = degrees.to_radians().sin_cos();

    RgbImage::from_fn(width, height, |x, y| {
        let dx = x as f32 - cx;
        let dy = y as f32 - cy;
        let sx = cos * dx + sin * dy + cx;
        let sy = -sin * dx + cos * dy + cy;
        sample_bicubic(image, sx, sy)
    })
}

/// Cubic convolution weights for the four taps around a fractional offset
fn cubic_weights(t: f32) -> [f32; 4] {
    const A: f32 = -0.75;
    let w0 = ((A * (t + 1.0) - 5.0 * A) * (t + 1.0) + 8.0 * A) * (t + 1.0) - 4.0 * A;
    let w1 = ((A + 2.0) * t - (A + 3.0)) * t * t + 1.0;
    let w2 = ((A + 2.0) * (1.0 - t) - (A + 3.0)) * (1.0 - t) * (1.0 - t) + 1.0;
    [w0, w1, w2, 1.0 - w0 - w1 - w2]
}

fn sample_bicubic(image: &RgbImage, x: f32, y: f32) -> Rgb<u8> {
    let (width, height) = image.dimensions();
    let x0 = x.floor();
    let y0 = y.floor();
    let wx = cubic_weights(x - x0);
    let wy = cubic_weights(y - y0);

    let clamp = |v: f32, limit: u32| (v as i64).clamp(0, limit as i64 - 1) as u32;

    let mut sum = [0f32; 3];
    for (j, weight_y) in wy.iter().enumerate() {
        let sy = clamp(y0 - 1.0 + j as f32, height);
        for (i, weight_x) in wx.iter().enumerate() {
            let sx = clamp(x0 - 1.0 + i as f32, width);
            let p = image.get_pixel(sx, sy);
            let weight = weight_x * weight_y;
            for (acc, &v) in sum.iter_mut().zip(p.0.iter()) {
                *acc += weight * v as f32;
            }
        }
    }

    Rgb(sum.map(|v| v.round().clamp(0.0, 255.0) as u8))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect_points(x0: i32, y0: i32, x1: i32, y1: i32) -> Vec<Point<i32>> {
        vec![
            Point::new(x0, y0),
            Point::new(x1, y0),
            Point::new(x1, y1),
            Point::new(x0, y1),
        ]
    }

    #[test]
    fn test_axis_aligned_rect() {
        let rect = min_area_rect(&rect_points(10, 20, 110, 40)).unwrap();
        // Sides are at multiples of 90 degrees; rounding may land on either end
        assert!((rect.angle + 90.0).abs() < 1e-9 || rect.angle.abs() < 1e-9);
        assert!((rect.width * rect.height - 2000.0).abs() < 1e-6);
        assert!((rect.center.0 - 60.0).abs() < 1e-9);
        assert!((rect.center.1 - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_rotated_rect_angle() {
        // Long side runs 10 degrees below horizontal (y down)
        let (sin, cos) = 10f64.to_radians().sin_cos();
        let corners = [(0.0, 0.0), (200.0, 0.0), (200.0, 20.0), (0.0, 20.0)];
        let points: Vec<Point<i32>> = corners
            .iter()
            .map(|&(x, y)| {
                Point::new(
                    (x * cos - y * sin + 300.0).round() as i32,
                    (x * sin + y * cos + 100.0).round() as i32,
                )
            })
            .collect();

        let rect = min_area_rect(&points).unwrap();
        assert!((-90.0..0.0).contains(&rect.angle));
        assert!((rect.angle + 80.0).abs() < 0.5, "angle was {}", rect.angle);
    }

    #[test]
    fn test_min_area_rect_empty() {
        assert!(min_area_rect(&[]).is_none());
    }

    #[test]
    fn test_rotate_zero_is_identity() {
        let img = RgbImage::from_fn(17, 9, |x, y| Rgb([(x * 10) as u8, (y * 20) as u8, 7]));
        assert_eq!(rotate_about_center(&img, 0.0), img);
    }

    #[test]
    fn test_rotate_replicates_edges() {
        // A white image has nothing but white to replicate into the corners
        let img = RgbImage::from_pixel(40, 20, Rgb([255, 255, 255]));
        let rotated = rotate_about_center(&img, 12.0);
        assert!(rotated.pixels().all(|p| p.0 == [255, 255, 255]));
    }

    #[test]
    fn test_rotate_quarter_turn_moves_pixels_clockwise() {
        let mut img = RgbImage::from_pixel(21, 21, Rgb([0, 0, 0]));
        // Right of center
        img.put_pixel(15, 10, Rgb([255, 255, 255]));
        let rotated = rotate_about_center(&img, 90.0);
        // Clockwise quarter turn moves it below center
        assert_eq!(rotated.get_pixel(10, 15).0, [255, 255, 255]);
    }
}
