//! Channel-order conversions for the pipeline's output

use image::{Rgb, RgbImage};

/// Three-channel image stored in blue, green, red order
///
/// Same pixels as the RGB result, laid out for consumers that expect BGR.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BgrImage {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl BgrImage {
    pub fn from_rgb(image: &RgbImage) -> Self {
        let data = image
            .pixels()
            .flat_map(|p| {
                let [r, g, b] = p.0;
                [b, g, r]
            })
            .collect();
        Self {
            width: image.width(),
            height: image.height(),
            data,
        }
    }

    pub fn to_rgb(&self) -> RgbImage {
        RgbImage::from_fn(self.width, self.height, |x, y| {
            let [b, g, r] = self.pixel(x, y);
            Rgb([r, g, b])
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// `[b, g, r]` at the given position
    ///
    /// # Panics
    ///
    /// Panics if the position is outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        assert!(x < self.width && y < self.height, "pixel ({x}, {y}) out of bounds");
        let i = (y as usize * self.width as usize + x as usize) * 3;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    /// Row-major interleaved BGR bytes
    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channels_are_swapped() {
        let mut img = RgbImage::new(3, 2);
        img.put_pixel(1, 1, Rgb([10, 20, 30]));

        let bgr = BgrImage::from_rgb(&img);
        assert_eq!(bgr.dimensions(), (3, 2));
        assert_eq!(bgr.pixel(1, 1), [30, 20, 10]);
        assert_eq!(&bgr.as_raw()[12..15], &[30, 20, 10]);
        assert_eq!(bgr.to_rgb(), img);
    }
}
