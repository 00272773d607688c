use image::Rgba;
use imageproc::definitions::Image;

/// Alpha level a pixel must exceed to count as content.
///
/// Deliberately higher than zero so the faint smoothed fringe left by
/// background removal does not stretch the box.
pub const CONTENT_ALPHA_THRESHOLD: u8 = 50;

/// Tight axis-aligned rectangle around the opaque content of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub min_x: u32,
    pub min_y: u32,
    pub width: u32,
    pub height: u32,
}

/// Trait for locating the opaque content of a background-removed image.
pub trait ContentBoundingBox {
    /// Scans the alpha channel and returns the tightest rectangle holding
    /// every pixel with `alpha > alpha_threshold`, or `None` when the
    /// image is entirely background. Single pass over the pixels.
    fn content_bounding_box(&self, alpha_threshold: u8) -> Option<BoundingBox>;
}

impl ContentBoundingBox for Image<Rgba<u8>> {
    fn content_bounding_box(&self, alpha_threshold: u8) -> Option<BoundingBox> {
        let (width, height) = self.dimensions();
        let mut bounds = [width, height, 0, 0]; // [min_x, min_y, max_x, max_y]
        let mut found = false;

        for (x, y, pixel) in self.enumerate_pixels() {
            if pixel[3] > alpha_threshold {
                update_bounds(&mut bounds, x, y);
                found = true;
            }
        }

        found.then(|| BoundingBox {
            min_x: bounds[0],
            min_y: bounds[1],
            width: bounds[2] - bounds[0] + 1,
            height: bounds[3] - bounds[1] + 1,
        })
    }
}

fn update_bounds(bounds: &mut [u32; 4], x: u32, y: u32) {
    bounds[0] = bounds[0].min(x);
    bounds[1] = bounds[1].min(y);
    bounds[2] = bounds[2].max(x);
    bounds[3] = bounds[3].max(y);
}
