//! frame codecs: turning bytes into headers and samples
//!
//! The stream decoder only talks to a [`FrameCodec`]; [`MpegFrameCodec`] is
//! the implementation for MPEG audio elementary streams.
mod mpeg;
mod samples;
pub mod vbr;

pub use mpeg::MpegFrameCodec;
pub use vbr::{read_vbr_tag, VbrTag, VbrTagKind};

use crate::core::{AudioFrameHeader, CodecError};

/// Header and payload extraction for one frame at a time.
///
/// Implementations own the byte cursor. Every call advances it by the bytes
/// it consumed, failures included, so a retry never starts from the same
/// position twice.
pub trait FrameCodec {
    /// Parse the next frame header, or `Ok(None)` at a clean end of stream
    fn read_header(&mut self) -> Result<Option<AudioFrameHeader>, CodecError>;

    /// Decode the frame belonging to `header` into interleaved samples
    fn decode_frame(&mut self, header: &AudioFrameHeader) -> Result<Vec<f32>, CodecError>;

    /// Advance past the frame belonging to `header`, returning the per-channel
    /// sample count decoding would have produced
    fn skip_frame(&mut self, header: &AudioFrameHeader) -> Result<usize, CodecError>;

    /// bytes consumed from the source so far
    fn position(&self) -> u64;
}
