use image::{GrayImage, Rgb, RgbImage};

/// Convert a color image to a single intensity channel
/// Most of the analysis (deskew, thresholding) runs on this
pub fn to_gray(image: &RgbImage) -> GrayImage {
    image::imageops::grayscale(image)
}

/// Replicate a single channel across three, so two-tone results keep the
/// channel layout of the color image they came from
pub fn to_rgb(gray: &GrayImage) -> RgbImage {
    RgbImage::from_fn(gray.width(), gray.height(), |x, y| {
        let v = gray.get_pixel(x, y).0[0];
        Rgb([v, v, v])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_grayscale_converts_color() {
        let mut img = RgbImage::new(10, 10);
        img.put_pixel(0, 0, Rgb([255, 0, 0])); // Red
        img.put_pixel(1, 0, Rgb([0, 255, 0])); // Green
        img.put_pixel(2, 0, Rgb([0, 0, 255])); // Blue

        let gray = to_gray(&img);

        assert!(gray.get_pixel(0, 0).0[0] > 0);
        assert!(gray.get_pixel(1, 0).0[0] > 0);
        assert!(gray.get_pixel(2, 0).0[0] > 0);
        assert_eq!(gray.get_pixel(3, 0).0[0], 0);
    }

    #[test]
    fn test_rgb_replicates_channel() {
        let mut gray = GrayImage::new(4, 3);
        gray.put_pixel(2, 1, Luma([77]));

        let rgb = to_rgb(&gray);
        assert_eq!(rgb.dimensions(), (4, 3));
        assert_eq!(rgb.get_pixel(2, 1), &Rgb([77, 77, 77]));
        assert_eq!(rgb.get_pixel(0, 0), &Rgb([0, 0, 0]));
    }
}
