use std::io::Read;

use crate::codec::MpegFrameCodec;
use crate::core::{ErrorPolicy, MpaResult};

use super::StreamDecoder;

/// Open an MPEG audio stream over `reader`.
///
/// The first frame header is located before this returns, so estimates are
/// available right away. Leading ID3v2 tags and junk are skipped; junk counts
/// against `policy`.
pub fn create_decoder<R: Read>(
    reader: R,
    policy: ErrorPolicy,
) -> MpaResult<StreamDecoder<MpegFrameCodec<R>>> {
    StreamDecoder::open(MpegFrameCodec::new(reader), policy)
}
