//! Test utilities for stickerops
//!
//! This module provides common functionality for testing the processing
//! operations. It is only compiled when running tests.

use image::Rgba;
use imageproc::definitions::Image;

/// Creates an image filled with a single color.
pub fn solid_image(width: u32, height: u32, color: Rgba<u8>) -> Image<Rgba<u8>> {
    Image::from_pixel(width, height, color)
}

/// Creates a fully transparent image.
pub fn transparent_image(width: u32, height: u32) -> Image<Rgba<u8>> {
    Image::new(width, height)
}

/// Creates an opaque white backdrop with a solid-color rectangle on it.
///
/// The rectangle starts at (`rect_x`, `rect_y`) and spans
/// `rect_width` x `rect_height` pixels. This is the canonical "character
/// on a uniform backdrop" shape the pipeline consumes.
pub fn square_on_background(
    width: u32,
    height: u32,
    rect_x: u32,
    rect_y: u32,
    rect_width: u32,
    rect_height: u32,
    color: Rgba<u8>,
) -> Image<Rgba<u8>> {
    let mut image = solid_image(width, height, Rgba([255, 255, 255, 255]));
    for y in rect_y..(rect_y + rect_height).min(height) {
        for x in rect_x..(rect_x + rect_width).min(width) {
            image.put_pixel(x, y, color);
        }
    }
    image
}

/// Encodes an image as PNG bytes, the shape raw model output arrives in.
pub fn png_bytes(image: &Image<Rgba<u8>>) -> Vec<u8> {
    let mut buffer = std::io::Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, image::ImageFormat::Png)
        .expect("in-memory PNG encoding");
    buffer.into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_on_background_places_the_rectangle() {
        let image = square_on_background(10, 10, 2, 3, 4, 5, Rgba([255, 0, 0, 255]));
        assert_eq!(*image.get_pixel(0, 0), Rgba([255, 255, 255, 255]));
        assert_eq!(*image.get_pixel(2, 3), Rgba([255, 0, 0, 255]));
        assert_eq!(*image.get_pixel(5, 7), Rgba([255, 0, 0, 255]));
        assert_eq!(*image.get_pixel(6, 3), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn png_bytes_round_trips() {
        let image = solid_image(4, 4, Rgba([1, 2, 3, 255]));
        let bytes = png_bytes(&image);
        let decoded = image::load_from_memory(&bytes)
            .expect("decodable PNG")
            .to_rgba8();
        assert_eq!(decoded.as_raw(), image.as_raw());
    }
}
