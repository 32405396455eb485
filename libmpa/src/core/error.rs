//! Error taxonomy for frame codecs and the stream decoder
//!
//! Codec errors describe one failed header or payload attempt and carry
//! whether the stream can retry past them. Stream errors are terminal for
//! the pull that raised them.

use std::io;

use thiserror::Error;

/// Why a single frame could not be parsed or decoded
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedFrame {
    /// Cursor was not on a sync word; bytes skipped to reach the next candidate
    #[error("lost frame sync, skipped {skipped} bytes")]
    LostSync { skipped: u64 },

    #[error("reserved MPEG version")]
    ReservedVersion,

    #[error("reserved layer")]
    ReservedLayer,

    /// Free-format bit rate (index 0) is not supported
    #[error("free-format bit rate is not supported")]
    FreeFormat,

    #[error("forbidden bit rate index")]
    BadBitrate,

    #[error("reserved sample rate index")]
    ReservedSampleRate,

    /// Layer II bit rate not allowed with this channel mode
    #[error("illegal layer II allocation: {bitrate_kbps} kb/s with {mode}")]
    IllegalMode { bitrate_kbps: u32, mode: &'static str },

    /// Payload requested without a header having buffered its frame
    #[error("no frame payload buffered for this header")]
    MissingPayload,

    #[error("payload decode failed: {0}")]
    Payload(String),

    #[error("unsupported stream: {0}")]
    Unsupported(String),
}

/// Coarse classification of a [`CodecError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecErrorKind {
    /// Bad frame structure, counted and resynchronized past
    Malformed,
    /// Input ended in the middle of a frame or sync scan
    Exhausted,
    /// The byte source itself failed
    Transport,
}

/// Failure of one header or payload attempt
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("malformed frame: {0}")]
    Malformed(#[from] MalformedFrame),

    #[error("unexpected end of stream: {0}")]
    Exhausted(String),

    #[error("transport failure: {0}")]
    Transport(#[source] io::Error),
}

impl CodecError {
    pub fn kind(&self) -> CodecErrorKind {
        match self {
            CodecError::Malformed(_) => CodecErrorKind::Malformed,
            CodecError::Exhausted(_) => CodecErrorKind::Exhausted,
            CodecError::Transport(_) => CodecErrorKind::Transport,
        }
    }

    /// Whether the stream decoder may count this error and keep scanning
    pub fn may_retry(&self) -> bool {
        !matches!(self, CodecError::Transport(_))
    }
}

impl From<io::Error> for CodecError {
    fn from(e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            CodecError::Exhausted(e.to_string())
        } else {
            CodecError::Transport(e)
        }
    }
}

/// Terminal failure of a stream decoder operation
#[derive(Error, Debug)]
pub enum StreamError {
    /// Reading the byte source failed; the cursor can no longer be trusted
    #[error("I/O failure reading stream: {0}")]
    Transport(#[source] io::Error),

    /// Errors piled up before a handful of frames ever decoded
    #[error("not a valid MPEG audio stream ({errors} errors, {valid_frames} valid frames)")]
    NotAudio { errors: u32, valid_frames: u64 },

    /// Error budget exceeded on a stream that did contain audio
    #[error("too many decoding errors ({errors} errors after {valid_frames} valid frames)")]
    TooManyErrors { errors: u32, valid_frames: u64 },

    #[error("invalid decoder state: {0}")]
    InvalidState(&'static str),
}

impl StreamError {
    /// True for the "wrong file type" outcome as opposed to a damaged stream
    pub fn is_not_audio(&self) -> bool {
        matches!(self, StreamError::NotAudio { .. })
    }
}

/// result type for stream decoding
pub type MpaResult<T> = Result<T, StreamError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unexpected_eof_maps_to_exhausted() {
        let err: CodecError = io::Error::new(io::ErrorKind::UnexpectedEof, "short").into();
        assert_eq!(err.kind(), CodecErrorKind::Exhausted);
        assert!(err.may_retry());
    }

    #[test]
    fn test_other_io_errors_are_fatal() {
        let err: CodecError = io::Error::new(io::ErrorKind::BrokenPipe, "gone").into();
        assert_eq!(err.kind(), CodecErrorKind::Transport);
        assert!(!err.may_retry());
    }

    #[test]
    fn test_malformed_message() {
        let err = CodecError::from(MalformedFrame::LostSync { skipped: 12 });
        assert_eq!(err.to_string(), "malformed frame: lost frame sync, skipped 12 bytes");
    }
}
