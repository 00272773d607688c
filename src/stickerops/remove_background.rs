use image::{GenericImageView, Rgba};
use imageproc::definitions::Image;

/// Alpha applied to character-colored pixels that border transparency.
///
/// Softens the hard cut line left by the flood fill. The value is tuned,
/// not derived; changing it changes the visible fringe on every sticker.
pub const EDGE_SOFT_ALPHA: u8 = 230;

/// Multiplier applied to the tolerance when fading background-colored
/// fringe pixels (`alpha = 255 - tolerance * factor`, floored at 0).
pub const EDGE_FADE_TOLERANCE_FACTOR: u32 = 4;

/// Rectangular sub-region of a source image, in source pixel coordinates.
///
/// A rectangle with zero width or height means "no crop"; callers filter
/// those out before handing the rectangle down. Rectangles reaching past
/// the source bounds are clamped, never rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    /// Clamps the rectangle into an image of the given dimensions,
    /// keeping it at least 1x1.
    pub(crate) fn clamped_to(self, width: u32, height: u32) -> Self {
        let x = self.x.min(width.saturating_sub(1));
        let y = self.y.min(height.saturating_sub(1));
        Self {
            x,
            y,
            width: self.width.min(width.saturating_sub(x)).max(1),
            height: self.height.min(height.saturating_sub(y)).max(1),
        }
    }
}

/// Classifies a pixel against a sampled background color.
///
/// A pixel counts as background iff its Euclidean RGB distance from
/// `reference` is within `tolerance`. Alpha is ignored; the comparison is
/// done on squared distances so no rounding is involved.
#[inline]
pub fn is_background(pixel: &Rgba<u8>, reference: &Rgba<u8>, tolerance: u8) -> bool {
    let dr = i32::from(pixel[0]) - i32::from(reference[0]);
    let dg = i32::from(pixel[1]) - i32::from(reference[1]);
    let db = i32::from(pixel[2]) - i32::from(reference[2]);
    let tolerance = i32::from(tolerance);
    dr * dr + dg * dg + db * db <= tolerance * tolerance
}

/// Trait providing flood-fill background removal for RGBA images.
///
/// The background color is not configured by the caller: it is sampled
/// from the top-left pixel of the working region, so a generator that
/// alternates between white and green-screen backdrops needs no
/// per-image configuration.
pub trait RemoveBackground {
    /// Produces a copy of the (optionally cropped) image with
    /// border-connected background made transparent.
    ///
    /// The fill is seeded from every border pixel that classifies as
    /// background and spreads across 4-connected neighbors. Regions of
    /// background color fully enclosed by content are intentionally left
    /// opaque: a character's white eyes stay solid on a white backdrop.
    /// A final pass softens the cut line: background-colored fringe fades
    /// to `255 - tolerance * EDGE_FADE_TOLERANCE_FACTOR`, character-colored
    /// edge pixels drop to `EDGE_SOFT_ALPHA`.
    ///
    /// # Arguments
    ///
    /// * `tolerance` - Maximum Euclidean RGB distance still treated as background
    /// * `crop` - Sub-region to operate on; the output has the crop's dimensions
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use stickerops::{Image, RemoveBackground};
    /// use image::Rgba;
    ///
    /// let image: Image<Rgba<u8>> = Image::new(100, 100);
    /// let cut_out = image.remove_background(30, None);
    /// ```
    fn remove_background(&self, tolerance: u8, crop: Option<CropRect>) -> Self;
}

impl RemoveBackground for Image<Rgba<u8>> {
    fn remove_background(&self, tolerance: u8, crop: Option<CropRect>) -> Self {
        let mut working = extract_working_region(self, crop);
        let (width, height) = working.dimensions();
        let reference = *working.get_pixel(0, 0);

        flood_fill_transparent(&mut working, &reference, tolerance);
        smooth_edges(&mut working, &reference, tolerance);

        working
    }
}

/// Copies the crop region (or the whole image) into a fresh buffer.
fn extract_working_region(image: &Image<Rgba<u8>>, crop: Option<CropRect>) -> Image<Rgba<u8>> {
    let (width, height) = image.dimensions();
    match crop {
        Some(rect) => {
            let rect = rect.clamped_to(width, height);
            image.view(rect.x, rect.y, rect.width, rect.height).to_image()
        }
        None => image.clone(),
    }
}

/// Zeroes the alpha of every border-connected background pixel.
fn flood_fill_transparent(image: &mut Image<Rgba<u8>>, reference: &Rgba<u8>, tolerance: u8) {
    let (width, height) = image.dimensions();
    let (w, h) = (width as usize, height as usize);

    let mut visited = vec![false; w * h];
    let mut stack: Vec<usize> = Vec::new();

    let seed = |index: usize, image: &Image<Rgba<u8>>, stack: &mut Vec<usize>, visited: &mut Vec<bool>| {
        let (x, y) = ((index % w) as u32, (index / w) as u32);
        if !visited[index] && is_background(image.get_pixel(x, y), reference, tolerance) {
            visited[index] = true;
            stack.push(index);
        }
    };

    // Entry points: all four edges of the working region.
    for x in 0..w {
        seed(x, image, &mut stack, &mut visited);
        seed((h - 1) * w + x, image, &mut stack, &mut visited);
    }
    for y in 0..h {
        seed(y * w, image, &mut stack, &mut visited);
        seed(y * w + (w - 1), image, &mut stack, &mut visited);
    }

    while let Some(index) = stack.pop() {
        let (x, y) = ((index % w) as u32, (index / w) as u32);
        image.get_pixel_mut(x, y)[3] = 0;

        let mut neighbors = [0usize; 4];
        let mut count = 0;
        if x > 0 {
            neighbors[count] = index - 1;
            count += 1;
        }
        if x + 1 < width {
            neighbors[count] = index + 1;
            count += 1;
        }
        if y > 0 {
            neighbors[count] = index - w;
            count += 1;
        }
        if y + 1 < height {
            neighbors[count] = index + w;
            count += 1;
        }

        for &neighbor in &neighbors[..count] {
            let (nx, ny) = ((neighbor % w) as u32, (neighbor / w) as u32);
            if !visited[neighbor] && is_background(image.get_pixel(nx, ny), reference, tolerance) {
                visited[neighbor] = true;
                stack.push(neighbor);
            }
        }
    }
}

/// Softens the boundary between opaque content and the filled background.
///
/// Runs in place, row-major, over interior pixels only: an opaque pixel
/// with a fully transparent 4-neighbor either fades (if it still
/// classifies as background, fill shadow the traversal never reached) or
/// drops to the fixed partial alpha (genuine content color at the edge).
fn smooth_edges(image: &mut Image<Rgba<u8>>, reference: &Rgba<u8>, tolerance: u8) {
    let (width, height) = image.dimensions();
    if width < 3 || height < 3 {
        return;
    }

    let fade_alpha =
        255u32.saturating_sub(u32::from(tolerance) * EDGE_FADE_TOLERANCE_FACTOR) as u8;

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            if image.get_pixel(x, y)[3] == 0 {
                continue;
            }

            let touches_transparency = image.get_pixel(x, y - 1)[3] == 0
                || image.get_pixel(x, y + 1)[3] == 0
                || image.get_pixel(x - 1, y)[3] == 0
                || image.get_pixel(x + 1, y)[3] == 0;
            if !touches_transparency {
                continue;
            }

            let alpha = if is_background(image.get_pixel(x, y), reference, tolerance) {
                fade_alpha
            } else {
                EDGE_SOFT_ALPHA
            };
            image.get_pixel_mut(x, y)[3] = alpha;
        }
    }
}
