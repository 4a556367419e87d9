//! Synthetic document images for integration tests
#![allow(dead_code)]

use image::{Rgb, RgbImage};

pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
pub const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

/// Glyph cell size before scaling
const GLYPH_WIDTH: u32 = 5;
const GLYPH_HEIGHT: u32 = 7;

/// Scale used by the test documents
pub const SCALE: u32 = 3;

fn glyph(c: char) -> [&'static str; 7] {
    match c {
        'H' => ["10001", "10001", "10001", "11111", "10001", "10001", "10001"],
        'E' => ["11111", "10000", "10000", "11110", "10000", "10000", "11111"],
        'L' => ["10000", "10000", "10000", "10000", "10000", "10000", "11111"],
        'O' => ["01110", "10001", "10001", "10001", "10001", "10001", "01110"],
        'W' => ["10001", "10001", "10001", "10101", "10101", "10101", "01010"],
        'R' => ["11110", "10001", "10001", "11110", "10100", "10010", "10001"],
        'D' => ["11110", "10001", "10001", "10001", "10001", "10001", "11110"],
        _ => ["00000"; 7],
    }
}

/// Horizontal distance between glyph origins
pub fn advance(scale: u32) -> u32 {
    (GLYPH_WIDTH + 1) * scale
}

/// Size of the rendered text block
pub fn text_size(text: &str, scale: u32) -> (u32, u32) {
    let count = text.chars().count() as u32;
    (count * advance(scale) - scale, GLYPH_HEIGHT * scale)
}

/// Draw text with a blocky 5x7 font, top-left corner at (x, y)
pub fn draw_text(image: &mut RgbImage, text: &str, x: u32, y: u32, scale: u32, color: Rgb<u8>) {
    for (i, c) in text.chars().enumerate() {
        let origin_x = x + i as u32 * advance(scale);
        for (row, bits) in glyph(c).iter().enumerate() {
            for (col, bit) in bits.chars().enumerate() {
                if bit != '1' {
                    continue;
                }
                for dy in 0..scale {
                    for dx in 0..scale {
                        let px = origin_x + col as u32 * scale + dx;
                        let py = y + row as u32 * scale + dy;
                        if px < image.width() && py < image.height() {
                            image.put_pixel(px, py, color);
                        }
                    }
                }
            }
        }
    }
}

/// 600x200 white page with "HELLO WORLD" in black, top-left at (x, y)
pub fn hello_world_at(x: u32, y: u32) -> RgbImage {
    let mut img = RgbImage::from_pixel(600, 200, WHITE);
    draw_text(&mut img, "HELLO WORLD", x, y, SCALE, BLACK);
    img
}

/// Same page with the text centered
pub fn hello_world_centered() -> RgbImage {
    let (w, h) = text_size("HELLO WORLD", SCALE);
    hello_world_at(300 - w / 2, 100 - h / 2)
}

/// Pixels equal to 0 in the first channel
pub fn dark_pixels(image: &RgbImage) -> Vec<(u32, u32)> {
    image
        .enumerate_pixels()
        .filter(|(_, _, p)| p.0[0] == 0)
        .map(|(x, y, _)| (x, y))
        .collect()
}

pub fn distinct_values(image: &RgbImage) -> Vec<u8> {
    let mut values: Vec<u8> = image.pixels().flat_map(|p| p.0).collect();
    values.sort_unstable();
    values.dedup();
    values
}
