//! Fault-tolerant streaming decoder for MPEG audio frame streams
//!
//! [`create_decoder`] probes a byte source for its first MPEG-1/2/2.5 frame
//! header and hands back a [`StreamDecoder`] that pulls one frame at a time.
//! Malformed frames are absorbed against an [`ErrorPolicy`] budget and
//! resynchronized past; truncated tails end the stream cleanly once enough
//! audio has been seen.

pub mod codec;
pub mod core;
pub mod streaming;

mod reader;

#[cfg(all(target_arch = "wasm32", feature = "wasm"))]
pub mod wasm;

pub use codec::{FrameCodec, MpegFrameCodec, VbrTag, VbrTagKind};
pub use crate::core::{
    AudioFrame, AudioFrameHeader, ChannelMode, CodecError, CodecErrorKind, ErrorPolicy, Layer,
    MalformedFrame, MpaResult, MpegVersion, StreamError, DEFAULT_MODERATE_BUDGET,
    MIN_VALID_FRAMES,
};
pub use streaming::{create_decoder, DecoderState, Frames, StreamDecoder};

/// get lib version
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Format time in seconds to M:SS or H:MM:SS
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "0:00".to_string();
    }

    let total_secs = seconds.floor() as u64;
    let hours = total_secs / 3600;
    let mins = (total_secs % 3600) / 60;
    let secs = total_secs % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, mins, secs)
    } else {
        format!("{}:{:02}", mins, secs)
    }
}
