//! Working-set orchestration around the processing operations.
//!
//! Raw model output enters here, gets decoded once into a shared
//! high-resolution original, and every derived asset (sticker preview,
//! pack icon, tab icon, grid cells, re-edits) is composited from that
//! shared original without duplicating it.

use std::io::Cursor;
use std::sync::Arc;
use std::thread;

use base64::{engine::general_purpose, Engine as _};
use image::{ImageFormat, Rgba};
use imageproc::definitions::Image;
use itertools::iproduct;

use crate::error::{AnimationError, GenerationError, PipelineError};
use crate::stickerops::animation::encode_apng;
use crate::stickerops::fit_to_profile::FitToProfile;
use crate::stickerops::profile::{SizeProfile, MAX_ANIMATION_FRAMES};
use crate::stickerops::remove_background::CropRect;

/// Background tolerance applied when no edit state says otherwise.
pub const DEFAULT_TOLERANCE: u8 = 30;

/// How many generation calls may be in flight at once for static batches.
pub const GENERATION_CONCURRENCY: usize = 2;

/// Grid cells narrower or shorter than this are skipped during splitting;
/// they cannot hold meaningful content.
pub const MIN_GRID_CELL_PX: u32 = 10;

/// Resolution tier requested from the upstream generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    OneK,
    FourK,
}

/// Opaque handle to the external generative model.
///
/// Implementations receive an encoded input image and a prompt and return
/// zero or more encoded output images. Zero outputs is a valid "nothing to
/// process" answer, not a failure. The pipeline performs no retries; a
/// returned [`GenerationError`] aborts the batch item.
///
/// `sequential_step` marks chained animation requests, where the input is
/// the previous frame rather than the user's source image.
pub trait StickerGenerator {
    fn generate(
        &self,
        input: &[u8],
        prompt: &str,
        sequential_step: bool,
        resolution: Resolution,
    ) -> Result<Vec<Vec<u8>>, GenerationError>;
}

impl<G: StickerGenerator + ?Sized> StickerGenerator for &G {
    fn generate(
        &self,
        input: &[u8],
        prompt: &str,
        sequential_step: bool,
        resolution: Resolution,
    ) -> Result<Vec<Vec<u8>>, GenerationError> {
        (**self).generate(input, prompt, sequential_step, resolution)
    }
}

/// User-adjustable processing parameters attached to a derived asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditState {
    pub crop: Option<CropRect>,
    pub tolerance: u8,
}

impl Default for EditState {
    fn default() -> Self {
        Self {
            crop: None,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

/// One derived asset in the working set.
///
/// `original` is the full-resolution decode of the raw model output and
/// may be shared by several siblings (a sticker crop, a pack-icon crop and
/// a tab crop of the same generation result all point at one buffer). It
/// is freed when the last sibling holding it is removed.
pub struct GeneratedSticker {
    pub id: u64,
    pub processed: Image<Rgba<u8>>,
    pub original: Arc<Image<Rgba<u8>>>,
    pub profile: SizeProfile,
    pub edit: EditState,
}

impl GeneratedSticker {
    /// Dimensions of the processed raster (the profile's canvas size).
    pub fn target_size(&self) -> (u32, u32) {
        self.profile.canvas_size()
    }
}

/// Orchestrates generation, processing and the derived-asset working set.
pub struct StickerPipeline<G> {
    generator: G,
    images: Vec<GeneratedSticker>,
    next_id: u64,
}

impl<G> StickerPipeline<G> {
    pub fn new(generator: G) -> Self {
        Self {
            generator,
            images: Vec::new(),
            next_id: 1,
        }
    }

    /// All assets currently in the working set, in creation order.
    pub fn images(&self) -> &[GeneratedSticker] {
        &self.images
    }

    pub fn get(&self, id: u64) -> Option<&GeneratedSticker> {
        self.images.iter().find(|record| record.id == id)
    }

    fn find(&self, id: u64) -> Result<usize, PipelineError> {
        self.images
            .iter()
            .position(|record| record.id == id)
            .ok_or(PipelineError::UnknownImage(id))
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn push_record(
        &mut self,
        original: Arc<Image<Rgba<u8>>>,
        profile: SizeProfile,
        edit: EditState,
    ) -> u64 {
        let processed = original.fit_to_profile(profile, edit.crop, edit.tolerance);
        let id = self.allocate_id();
        self.images.push(GeneratedSticker {
            id,
            processed,
            original,
            profile,
            edit,
        });
        id
    }

    /// Decodes one raw model output and adds it to the working set as a
    /// composited asset at `profile` size. Returns the new asset's id.
    pub fn ingest(&mut self, raw: &[u8], profile: SizeProfile) -> Result<u64, PipelineError> {
        let original = image::load_from_memory(raw)?.to_rgba8();
        log::debug!(
            "ingested {}x{} original for {:?} profile",
            original.width(),
            original.height(),
            profile
        );
        Ok(self.push_record(Arc::new(original), profile, EditState::default()))
    }

    /// Same as [`ingest`](Self::ingest) for base64-encoded model output.
    /// Whitespace inside the payload is tolerated.
    pub fn ingest_base64(&mut self, data: &str, profile: SizeProfile) -> Result<u64, PipelineError> {
        let clean: String = data.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = general_purpose::STANDARD.decode(clean)?;
        self.ingest(&bytes, profile)
    }

    /// Removes an asset from the working set. The shared original is
    /// released automatically once no sibling references it.
    pub fn remove(&mut self, id: u64) -> Result<(), PipelineError> {
        let index = self.find(id)?;
        self.images.remove(index);
        Ok(())
    }

    /// Appends a copy of an existing asset under a fresh id. The copy
    /// shares the original buffer with its source.
    pub fn duplicate(&mut self, id: u64) -> Result<u64, PipelineError> {
        let index = self.find(id)?;
        let copy_id = self.allocate_id();
        let source = &self.images[index];
        let copy = GeneratedSticker {
            id: copy_id,
            processed: source.processed.clone(),
            original: Arc::clone(&source.original),
            profile: source.profile,
            edit: source.edit,
        };
        self.images.push(copy);
        Ok(copy_id)
    }

    /// Re-composites an asset's shared original at a different profile,
    /// reusing its stored crop and tolerance. The derived sibling shares
    /// the original buffer; nothing is re-generated or re-decoded.
    pub fn derive_asset(&mut self, id: u64, profile: SizeProfile) -> Result<u64, PipelineError> {
        let index = self.find(id)?;
        let original = Arc::clone(&self.images[index].original);
        let edit = self.images[index].edit;
        Ok(self.push_record(original, profile, edit))
    }

    /// Re-runs composition with an updated crop/tolerance.
    ///
    /// With `in_place` the existing record is overwritten and keeps its
    /// id; otherwise a sibling is appended and its new id returned.
    pub fn apply_edit(
        &mut self,
        id: u64,
        edit: EditState,
        in_place: bool,
    ) -> Result<u64, PipelineError> {
        let index = self.find(id)?;
        if in_place {
            let record = &mut self.images[index];
            let processed = record
                .original
                .fit_to_profile(record.profile, edit.crop, edit.tolerance);
            record.processed = processed;
            record.edit = edit;
            Ok(id)
        } else {
            let original = Arc::clone(&self.images[index].original);
            let profile = self.images[index].profile;
            Ok(self.push_record(original, profile, edit))
        }
    }

    /// Splits an asset's original into `rows` x `cols` independent cells
    /// and composites each as its own asset. Cells below
    /// [`MIN_GRID_CELL_PX`] in either dimension are skipped. Each new
    /// asset stores its cell rectangle as its crop, so later edits and
    /// derivations stay scoped to the cell.
    pub fn split_grid(
        &mut self,
        id: u64,
        rows: u32,
        cols: u32,
    ) -> Result<Vec<u64>, PipelineError> {
        let index = self.find(id)?;
        if rows == 0 || cols == 0 {
            log::debug!("grid split with {rows}x{cols} cells requested, nothing to do");
            return Ok(Vec::new());
        }

        let original = Arc::clone(&self.images[index].original);
        let profile = self.images[index].profile;
        let tolerance = self.images[index].edit.tolerance;
        let (width, height) = original.dimensions();
        let cell_width = f64::from(width) / f64::from(cols);
        let cell_height = f64::from(height) / f64::from(rows);

        let mut created = Vec::new();
        for (row, col) in iproduct!(0..rows, 0..cols) {
            let rect = CropRect {
                x: (f64::from(col) * cell_width).floor() as u32,
                y: (f64::from(row) * cell_height).floor() as u32,
                width: cell_width.floor() as u32,
                height: cell_height.floor() as u32,
            };
            if rect.width < MIN_GRID_CELL_PX || rect.height < MIN_GRID_CELL_PX {
                log::debug!(
                    "skipping grid cell ({row}, {col}): {}x{} is below the minimum cell size",
                    rect.width,
                    rect.height
                );
                continue;
            }

            let edit = EditState {
                crop: Some(rect),
                tolerance,
            };
            created.push(self.push_record(Arc::clone(&original), profile, edit));
        }

        log::info!("grid split produced {} assets from {rows}x{cols} cells", created.len());
        Ok(created)
    }

    /// Encodes every asset currently in the working set, in order, into
    /// one animated PNG at the animation-frame canvas size.
    pub fn encode_animation(&self, delay_ms: u16) -> Result<Vec<u8>, AnimationError> {
        let frames: Vec<Image<Rgba<u8>>> = self
            .images
            .iter()
            .map(|record| record.processed.clone())
            .collect();
        let (width, height) = SizeProfile::AnimationFrame.canvas_size();
        encode_apng(&frames, width, height, delay_ms)
    }

    /// Encodes one finished asset as a still PNG byte buffer.
    pub fn export_png(&self, id: u64) -> Result<Vec<u8>, PipelineError> {
        let record = self.get(id).ok_or(PipelineError::UnknownImage(id))?;
        let mut buffer = Cursor::new(Vec::new());
        record.processed.write_to(&mut buffer, ImageFormat::Png)?;
        Ok(buffer.into_inner())
    }
}

impl<G: StickerGenerator + Sync> StickerPipeline<G> {
    /// Generates `count` independent static variants from one source
    /// image and ingests every returned output at sticker size.
    ///
    /// Calls are issued through a window of [`GENERATION_CONCURRENCY`]
    /// concurrent requests. On an upstream failure the batch stops, the
    /// error propagates, and everything already ingested stays in the
    /// working set.
    pub fn generate_static(
        &mut self,
        source: &[u8],
        prompt: &str,
        count: usize,
        resolution: Resolution,
    ) -> Result<Vec<u64>, PipelineError> {
        let mut created = Vec::new();
        let variants: Vec<usize> = (0..count).collect();

        for chunk in variants.chunks(GENERATION_CONCURRENCY) {
            let generator = &self.generator;
            let outputs: Vec<Result<Vec<Vec<u8>>, GenerationError>> = thread::scope(|scope| {
                let handles: Vec<_> = chunk
                    .iter()
                    .map(|&variant| {
                        let variation_prompt = format!("{prompt} --variation={}", variant + 1);
                        scope.spawn(move || {
                            generator.generate(source, &variation_prompt, false, resolution)
                        })
                    })
                    .collect();
                handles
                    .into_iter()
                    .map(|handle| {
                        handle.join().unwrap_or_else(|_| {
                            Err(GenerationError("generation worker panicked".into()))
                        })
                    })
                    .collect()
            });

            for output in outputs {
                let raw_images = output?;
                if raw_images.is_empty() {
                    log::warn!("generation call returned no images");
                }
                for raw in raw_images {
                    created.push(self.ingest(&raw, SizeProfile::Sticker)?);
                }
            }
            log::info!("{} of {count} static variants generated", created.len());
        }

        Ok(created)
    }
}

impl<G: StickerGenerator> StickerPipeline<G> {
    /// Generates a chained animation sequence.
    ///
    /// Strictly sequential: frame `i + 1` is generated from frame `i`'s
    /// raw output, so the motion stays smooth. This ordering is part of
    /// the contract, not an optimization opportunity. A step that returns
    /// no image is skipped and the chain continues from the last
    /// successful frame. `frame_count` is clamped to the platform limit.
    pub fn generate_animation(
        &mut self,
        source: &[u8],
        prompt: &str,
        frame_count: usize,
        resolution: Resolution,
    ) -> Result<Vec<u64>, PipelineError> {
        let total = frame_count.min(MAX_ANIMATION_FRAMES);
        let mut created = Vec::new();
        let mut current_input = source.to_vec();

        for frame in 0..total {
            let sequence_prompt = format!(
                "{prompt}. (Animation frame {} of {total}: small, smooth motion progression from the input image.)",
                frame + 1
            );
            let raw_images =
                self.generator
                    .generate(&current_input, &sequence_prompt, true, resolution)?;

            match raw_images.into_iter().next() {
                Some(raw) => {
                    created.push(self.ingest(&raw, SizeProfile::AnimationFrame)?);
                    current_input = raw;
                }
                None => {
                    log::warn!(
                        "animation frame {} came back empty, chaining from the previous frame",
                        frame + 1
                    );
                }
            }
        }

        Ok(created)
    }
}
