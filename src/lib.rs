//! # stickerops
//!
//! Raster post-processing pipeline for chat-sticker production.
//!
//! The crate turns raw generative-model output into platform-ready
//! sticker assets:
//!
//! - **Background Removal**: border-seeded flood fill with automatic
//!   background color detection and edge softening
//! - **Content Bounding Box**: tight alpha-channel content detection
//! - **Profile Composition**: auto-trim, uniform scale and centering onto
//!   fixed even-sized canvases with platform margins
//! - **Animation Assembly**: multi-frame APNG encoding with uniform frame
//!   delay and infinite looping
//! - **Pipeline Orchestration**: derived-asset working set over shared
//!   high-resolution originals, bounded-concurrency static generation and
//!   strictly sequential animation chaining
//!
//! ## Example Usage
//!
//! ```no_run
//! use stickerops::{FitToProfile, Image, RemoveBackground, SizeProfile};
//! use image::Rgba;
//!
//! // Cut the backdrop out of a decoded model output
//! let source: Image<Rgba<u8>> = Image::new(1024, 1024);
//! let cut_out = source.remove_background(30, None);
//!
//! // Or run the whole composition step in one go
//! let sticker = source.fit_to_profile(SizeProfile::Sticker, None, 30);
//! assert_eq!(sticker.dimensions(), SizeProfile::Sticker.canvas_size());
//! ```

mod error;
mod stickerops;

#[cfg(test)]
mod test_utils;

pub use error::{AnimationError, GenerationError, PipelineError};
pub use stickerops::animation::{encode_apng, APNG_MEDIA_TYPE};
pub use stickerops::content_bounds::{BoundingBox, ContentBoundingBox, CONTENT_ALPHA_THRESHOLD};
pub use stickerops::fit_to_profile::FitToProfile;
pub use stickerops::pipeline::{
    EditState, GeneratedSticker, Resolution, StickerGenerator, StickerPipeline,
    DEFAULT_TOLERANCE, GENERATION_CONCURRENCY, MIN_GRID_CELL_PX,
};
pub use stickerops::profile::{
    SizeProfile, ANIMATION_FRAME_DELAY_MS, MAX_ANIMATION_FRAMES, STICKER_MARGIN, TAB_MARGIN,
};
pub use stickerops::remove_background::{
    is_background, CropRect, RemoveBackground, EDGE_FADE_TOLERANCE_FACTOR, EDGE_SOFT_ALPHA,
};

// Re-export imageproc::definitions::Image for convenience
pub use imageproc::definitions::Image;
