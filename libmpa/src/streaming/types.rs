//! Streaming types and enums

use crate::core::{AudioFrameHeader, CodecError};

/// Stream decoder state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    /// Looking for the first frame header
    Probing,
    /// A header (or a deferred error) is waiting for the next pull
    Ready,
    /// End of stream reached
    Draining,
    /// A terminal error was raised
    Failed,
}

/// whether a pull materializes samples
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PullMode {
    Decode,
    Skip,
}

/// what the next pull starts from
#[derive(Debug)]
pub(crate) enum Pending {
    Header(AudioFrameHeader),
    /// refilling after the last emitted frame failed
    Error(CodecError),
    Nothing,
}
