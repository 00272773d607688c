use thiserror::Error;

/// Error type for animated-output assembly.
///
/// Geometry problems never surface here: undersized or oversized frames
/// are centered and clipped. The only hard failures are an empty frame
/// list and the underlying container writer rejecting the stream.
#[derive(Debug, Error)]
pub enum AnimationError {
    /// The frame sequence was empty after filtering invalid frames.
    ///
    /// A zero-frame animated file is never a valid output, so encoding
    /// refuses to proceed rather than producing one.
    #[error("animation encoder needs at least one frame")]
    InsufficientFrames,

    /// The PNG writer failed while producing the animated container.
    #[error("APNG encoding failed: {0}")]
    Encoding(#[from] png::EncodingError),
}

/// Opaque failure reported by the upstream generation service.
///
/// The pipeline treats the generator as a black box: whatever message the
/// service produced is carried through unchanged, and no retry happens on
/// this side.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("upstream generation failed: {0}")]
pub struct GenerationError(pub String);

/// Error type for the orchestration layer.
///
/// Distinguishes the user-visible failure classes: malformed input
/// payloads, codec failures, references to assets no longer in the
/// working set, upstream generation failures, and animation assembly
/// failures. Empty generation results and empty content are not errors
/// and never appear here.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A base64 payload from the generator could not be decoded.
    #[error("raw model output is not valid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    /// An image buffer could not be decoded or encoded.
    ///
    /// Raster decoding happens once, at ingestion; the processing stages
    /// themselves assume well-formed buffers.
    #[error("image codec error: {0}")]
    Image(#[from] image::ImageError),

    /// The referenced asset is not in the working set.
    #[error("no image with id {0} in the working set")]
    UnknownImage(u64),

    /// The upstream generation call failed.
    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// Animated-output assembly failed.
    #[error(transparent)]
    Animation(#[from] AnimationError),
}
