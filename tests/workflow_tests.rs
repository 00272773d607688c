//! Integration tests for stickerops workflows
//!
//! These tests drive the pipeline the way the application does: raw model
//! output in, derived platform assets out, with a stub generator standing
//! in for the external service.

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use image::{Rgba, RgbaImage};
use stickerops::{
    ContentBoundingBox, EditState, GenerationError, PipelineError, Resolution, SizeProfile,
    StickerGenerator, StickerPipeline, ANIMATION_FRAME_DELAY_MS, CONTENT_ALPHA_THRESHOLD,
};

/// Encodes an image as the PNG bytes a generator would return.
fn png_bytes(image: &RgbaImage) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, image::ImageFormat::Png)
        .expect("in-memory PNG encoding");
    buffer.into_inner()
}

/// White backdrop with a colored square in the middle.
fn character_image(color: Rgba<u8>) -> RgbaImage {
    let mut image = RgbaImage::from_pixel(256, 256, Rgba([255, 255, 255, 255]));
    for y in 64..192 {
        for x in 64..192 {
            image.put_pixel(x, y, color);
        }
    }
    image
}

/// Stub generator that always returns one image per call.
struct FixedGenerator {
    calls: AtomicUsize,
}

impl FixedGenerator {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

impl StickerGenerator for FixedGenerator {
    fn generate(
        &self,
        _input: &[u8],
        _prompt: &str,
        _sequential_step: bool,
        _resolution: Resolution,
    ) -> Result<Vec<Vec<u8>>, GenerationError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let color = Rgba([(40 * (call % 6 + 1)) as u8, 80, 120, 255]);
        Ok(vec![png_bytes(&character_image(color))])
    }
}

/// Stub generator that mirrors its input back, shifted one green level.
/// Lets the tests observe that chained animation steps really feed each
/// frame's output into the next request.
struct ChainingGenerator {
    sequential_flags: Mutex<Vec<bool>>,
}

impl ChainingGenerator {
    fn new() -> Self {
        Self {
            sequential_flags: Mutex::new(Vec::new()),
        }
    }
}

impl StickerGenerator for ChainingGenerator {
    fn generate(
        &self,
        input: &[u8],
        _prompt: &str,
        sequential_step: bool,
        _resolution: Resolution,
    ) -> Result<Vec<Vec<u8>>, GenerationError> {
        self.sequential_flags
            .lock()
            .expect("flag lock")
            .push(sequential_step);

        let mut image = image::load_from_memory(input)
            .map_err(|e| GenerationError(e.to_string()))?
            .to_rgba8();
        for pixel in image.pixels_mut() {
            if pixel[0] > 200 && pixel[1] > 200 && pixel[2] > 200 {
                continue; // leave the backdrop alone
            }
            pixel[1] = pixel[1].saturating_add(1);
        }
        Ok(vec![png_bytes(&image)])
    }
}

/// Stub generator that fails from the `fail_after`-th call on.
struct FlakyGenerator {
    calls: AtomicUsize,
    fail_after: usize,
}

impl StickerGenerator for FlakyGenerator {
    fn generate(
        &self,
        _input: &[u8],
        _prompt: &str,
        _sequential_step: bool,
        _resolution: Resolution,
    ) -> Result<Vec<Vec<u8>>, GenerationError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call >= self.fail_after {
            return Err(GenerationError("quota exhausted".into()));
        }
        Ok(vec![png_bytes(&character_image(Rgba([200, 40, 40, 255])))])
    }
}

#[test]
fn static_batch_produces_sticker_sized_assets() {
    let mut pipeline = StickerPipeline::new(FixedGenerator::new());
    let source = png_bytes(&character_image(Rgba([200, 40, 40, 255])));

    let created = pipeline
        .generate_static(&source, "a happy mascot", 5, Resolution::OneK)
        .expect("generation succeeds");

    assert_eq!(created.len(), 5);
    assert_eq!(pipeline.images().len(), 5);
    for id in created {
        let record = pipeline.get(id).expect("record exists");
        assert_eq!(
            record.processed.dimensions(),
            SizeProfile::Sticker.canvas_size()
        );
        assert!(record
            .processed
            .content_bounding_box(CONTENT_ALPHA_THRESHOLD)
            .is_some());
    }
}

#[test]
fn submission_assets_derive_from_the_shared_original() {
    let mut pipeline = StickerPipeline::new(FixedGenerator::new());
    let source = png_bytes(&character_image(Rgba([200, 40, 40, 255])));

    let created = pipeline
        .generate_static(&source, "a happy mascot", 1, Resolution::OneK)
        .expect("generation succeeds");
    let sticker_id = created[0];

    let main_id = pipeline
        .derive_asset(sticker_id, SizeProfile::Main)
        .expect("main icon");
    let tab_id = pipeline
        .derive_asset(sticker_id, SizeProfile::Tab)
        .expect("tab icon");

    assert_eq!(
        pipeline.get(main_id).expect("record").processed.dimensions(),
        (240, 240)
    );
    assert_eq!(
        pipeline.get(tab_id).expect("record").processed.dimensions(),
        (96, 74)
    );
    // One generator call produced all three assets.
    assert_eq!(pipeline.images().len(), 3);
}

#[test]
fn animation_chain_is_sequential_and_feeds_frames_forward() {
    let generator = ChainingGenerator::new();
    let mut pipeline = StickerPipeline::new(&generator);
    let source = png_bytes(&character_image(Rgba([200, 40, 40, 255])));

    let created = pipeline
        .generate_animation(&source, "wave", 4, Resolution::OneK)
        .expect("generation succeeds");

    assert_eq!(created.len(), 4);
    for id in &created {
        assert_eq!(
            pipeline.get(*id).expect("record").processed.dimensions(),
            SizeProfile::AnimationFrame.canvas_size()
        );
    }

    // Every request was marked as a chained sequential step.
    let flags = generator.sequential_flags.lock().expect("flag lock");
    assert_eq!(flags.len(), 4);
    assert!(flags.iter().all(|&sequential| sequential));
    drop(flags);

    // Each frame's original carries one more green shift than the last,
    // which can only happen if frame i+1 was generated from frame i's
    // output rather than from the user's source image.
    let greens: Vec<u8> = created
        .iter()
        .map(|id| {
            pipeline
                .get(*id)
                .expect("record")
                .original
                .get_pixel(128, 128)[1]
        })
        .collect();
    assert_eq!(greens, vec![41, 42, 43, 44]);
}

#[test]
fn upstream_failure_keeps_completed_results() {
    let mut pipeline = StickerPipeline::new(FlakyGenerator {
        calls: AtomicUsize::new(0),
        fail_after: 3,
    });
    let source = png_bytes(&character_image(Rgba([200, 40, 40, 255])));

    let result = pipeline.generate_static(&source, "a happy mascot", 6, Resolution::FourK);

    assert!(matches!(result, Err(PipelineError::Generation(_))));
    // The successful calls stay available for the user.
    assert!(!pipeline.images().is_empty());
    assert!(pipeline.images().len() < 6);
}

#[test]
fn grid_split_then_animation_download() {
    let mut pipeline = StickerPipeline::new(FixedGenerator::new());

    // One big sheet holding a 2x2 grid of characters.
    let mut sheet = RgbaImage::from_pixel(400, 400, Rgba([255, 255, 255, 255]));
    for (cell_y, cell_x) in [(0u32, 0u32), (0, 200), (200, 0), (200, 200)] {
        for y in (cell_y + 40)..(cell_y + 160) {
            for x in (cell_x + 40)..(cell_x + 160) {
                sheet.put_pixel(x, y, Rgba([40, 40, 200, 255]));
            }
        }
    }

    let sheet_id = pipeline
        .ingest(&png_bytes(&sheet), SizeProfile::AnimationFrame)
        .expect("ingest");
    let cells = pipeline.split_grid(sheet_id, 2, 2).expect("split");
    assert_eq!(cells.len(), 4);

    // Drop the sheet-level record; the cells keep the shared original alive.
    pipeline.remove(sheet_id).expect("remove");

    let apng = pipeline
        .encode_animation(ANIMATION_FRAME_DELAY_MS)
        .expect("encode");
    assert!(!apng.is_empty());

    let decoder = png::Decoder::new(Cursor::new(&apng));
    let reader = decoder.read_info().expect("APNG header");
    let control = reader
        .info()
        .animation_control()
        .expect("animated container");
    assert_eq!(control.num_frames, 4);
    assert_eq!(control.num_plays, 0); // infinite loop
}

#[test]
fn edits_can_fork_or_overwrite() {
    let mut pipeline = StickerPipeline::new(FixedGenerator::new());
    let source = png_bytes(&character_image(Rgba([200, 40, 40, 255])));
    let id = pipeline
        .ingest(&source, SizeProfile::Sticker)
        .expect("ingest");

    let before = pipeline.get(id).expect("record").processed.clone();

    let fork = pipeline
        .apply_edit(
            id,
            EditState {
                crop: Some(stickerops::CropRect {
                    x: 0,
                    y: 0,
                    width: 128,
                    height: 256,
                }),
                tolerance: 30,
            },
            false,
        )
        .expect("fork");

    assert_ne!(fork, id);
    assert_eq!(
        pipeline.get(id).expect("record").processed.as_raw(),
        before.as_raw(),
        "forked edit must leave the source record untouched"
    );

    pipeline
        .apply_edit(
            id,
            EditState {
                crop: None,
                tolerance: 90,
            },
            true,
        )
        .expect("overwrite");
    assert_eq!(pipeline.get(id).expect("record").edit.tolerance, 90);
}

#[test]
fn export_png_round_trips() {
    let mut pipeline = StickerPipeline::new(FixedGenerator::new());
    let source = png_bytes(&character_image(Rgba([200, 40, 40, 255])));
    let id = pipeline
        .ingest(&source, SizeProfile::Sticker)
        .expect("ingest");

    let bytes = pipeline.export_png(id).expect("export");
    let decoded = image::load_from_memory(&bytes)
        .expect("valid PNG")
        .to_rgba8();
    assert_eq!(decoded.dimensions(), SizeProfile::Sticker.canvas_size());
}
