use image::imageops::{self, FilterType};
use image::{GenericImageView, Rgba};
use imageproc::definitions::Image;

use crate::stickerops::content_bounds::{ContentBoundingBox, CONTENT_ALPHA_THRESHOLD};
use crate::stickerops::profile::SizeProfile;
use crate::stickerops::remove_background::{CropRect, RemoveBackground};

/// Trait composing a raw image onto a platform-sized canvas.
///
/// This is the full production step for a single asset: background
/// removal, auto-trim to the content bounding box, uniform scale into the
/// margin-reduced box, and centering on the final canvas.
pub trait FitToProfile {
    /// Trims, scales and centers the image onto a canvas of the
    /// profile's even-adjusted dimensions.
    ///
    /// A crop with zero width or height is ignored. When nothing remains
    /// after background removal, the result is a fully transparent canvas
    /// of the target size (an empty sticker, not an error).
    ///
    /// The scale factor is a single scalar,
    /// `min((w - 2m) / bbox_w, (h - 2m) / bbox_h)`: aspect ratio is
    /// preserved, and content grows or shrinks exactly enough to fit the
    /// margin-reduced box. Centering uses the full canvas, so the margin
    /// only caps the drawn size.
    ///
    /// # Arguments
    ///
    /// * `profile` - Output size profile for the final canvas
    /// * `crop` - Optional manual sub-region of the source to work from
    /// * `tolerance` - Background color tolerance handed to the removal step
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use stickerops::{FitToProfile, Image, SizeProfile};
    /// use image::Rgba;
    ///
    /// let source: Image<Rgba<u8>> = Image::new(1024, 1024);
    /// let sticker = source.fit_to_profile(SizeProfile::Sticker, None, 30);
    /// assert_eq!(sticker.dimensions(), SizeProfile::Sticker.canvas_size());
    /// ```
    fn fit_to_profile(&self, profile: SizeProfile, crop: Option<CropRect>, tolerance: u8)
        -> Self;
}

impl FitToProfile for Image<Rgba<u8>> {
    fn fit_to_profile(
        &self,
        profile: SizeProfile,
        crop: Option<CropRect>,
        tolerance: u8,
    ) -> Self {
        let crop = crop.filter(|rect| rect.width >= 1 && rect.height >= 1);
        let processed = self.remove_background(tolerance, crop);

        let (canvas_width, canvas_height) = profile.canvas_size();
        let Some(bbox) = processed.content_bounding_box(CONTENT_ALPHA_THRESHOLD) else {
            return Image::new(canvas_width, canvas_height);
        };

        let margin = profile.margin();
        let available_width = (canvas_width - 2 * margin) as f32;
        let available_height = (canvas_height - 2 * margin) as f32;

        let scale = (available_width / bbox.width as f32)
            .min(available_height / bbox.height as f32);
        let draw_width = ((bbox.width as f32 * scale).round() as u32).max(1);
        let draw_height = ((bbox.height as f32 * scale).round() as u32).max(1);

        let content = processed
            .view(bbox.min_x, bbox.min_y, bbox.width, bbox.height)
            .to_image();
        let scaled = imageops::resize(&content, draw_width, draw_height, FilterType::Triangle);

        let mut canvas: Image<Rgba<u8>> = Image::new(canvas_width, canvas_height);
        let offset_x = (i64::from(canvas_width) - i64::from(draw_width)) / 2;
        let offset_y = (i64::from(canvas_height) - i64::from(draw_height)) / 2;
        imageops::overlay(&mut canvas, &scaled, offset_x, offset_y);

        canvas
    }
}
