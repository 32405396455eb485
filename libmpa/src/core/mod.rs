pub mod error;
pub mod frame;
pub mod policy;
pub mod tables;
pub mod types;

pub use error::{CodecError, CodecErrorKind, MalformedFrame, MpaResult, StreamError};
pub use frame::AudioFrame;
pub use policy::{ErrorPolicy, DEFAULT_MODERATE_BUDGET};
pub use types::{AudioFrameHeader, ChannelMode, Layer, MpegVersion, MIN_VALID_FRAMES};
