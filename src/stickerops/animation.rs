use image::{imageops, Rgba};
use imageproc::definitions::Image;

use crate::error::AnimationError;

/// Media type of the encoded animation container.
pub const APNG_MEDIA_TYPE: &str = "image/png";

/// Encodes an ordered frame sequence into a single animated PNG.
///
/// Each frame is centered, unscaled, on a transparent `width` x `height`
/// canvas (`offset = (target - frame) / 2` per axis; frames larger than
/// the canvas are clipped). All frames share the same `delay_ms` and the
/// animation loops forever (loop count 0 in the container).
///
/// # Errors
///
/// * `AnimationError::InsufficientFrames` - `frames` is empty; a zero-frame
///   animation file must never be produced
/// * `AnimationError::Encoding` - the PNG writer rejected the stream
pub fn encode_apng(
    frames: &[Image<Rgba<u8>>],
    width: u32,
    height: u32,
    delay_ms: u16,
) -> Result<Vec<u8>, AnimationError> {
    if frames.is_empty() {
        return Err(AnimationError::InsufficientFrames);
    }

    let mut output = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut output, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_animated(frames.len() as u32, 0)?; // 0 = loop forever

        let mut writer = encoder.write_header()?;
        for frame in frames {
            let canvas = center_on_canvas(frame, width, height);
            writer.set_frame_delay(delay_ms, 1000)?;
            writer.set_dispose_op(png::DisposeOp::Background)?;
            writer.write_image_data(canvas.as_raw())?;
        }
        writer.finish()?;
    }

    Ok(output)
}

fn center_on_canvas(frame: &Image<Rgba<u8>>, width: u32, height: u32) -> Image<Rgba<u8>> {
    let mut canvas: Image<Rgba<u8>> = Image::new(width, height);
    let offset_x = (i64::from(width) - i64::from(frame.width())) / 2;
    let offset_y = (i64::from(height) - i64::from(frame.height())) / 2;
    imageops::overlay(&mut canvas, frame, offset_x, offset_y);
    canvas
}
