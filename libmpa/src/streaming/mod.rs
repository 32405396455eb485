//! pull-based stream decoding with error tolerance
//!
//! frames are pulled one at a time; malformed frames are counted against the
//! decoder's [`ErrorPolicy`](crate::ErrorPolicy) and resynchronized past
mod decoder;
mod factory;
mod types;

pub use decoder::{Frames, StreamDecoder};
pub use factory::create_decoder;
pub use types::DecoderState;

#[cfg(test)]
mod tests;
