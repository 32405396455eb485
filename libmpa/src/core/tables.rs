//! MPEG audio lookup tables

/// Size of a frame header in bytes
pub const HEADER_LEN: usize = 4;

/// Bytes of CRC following a protected header
pub const CRC_LEN: usize = 2;

/// Bit rates in kb/s, indexed by `[row][bitrate_index]`.
///
/// Rows: MPEG-1 Layer I, MPEG-1 Layer II, MPEG-1 Layer III,
/// MPEG-2/2.5 Layer I, MPEG-2/2.5 Layer II and III.
/// Index 0 is free format, index 15 is forbidden.
pub const BITRATES_KBPS: [[u32; 16]; 5] = [
    [0, 32, 64, 96, 128, 160, 192, 224, 256, 288, 320, 352, 384, 416, 448, 0],
    [0, 32, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 384, 0],
    [0, 32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 0],
    [0, 32, 48, 56, 64, 80, 96, 112, 128, 144, 160, 176, 192, 224, 256, 0],
    [0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160, 0],
];

/// Sample rates in Hz, indexed by `[version][sample_rate_index]`
/// (MPEG-1, MPEG-2, MPEG-2.5). Index 3 is reserved.
pub const SAMPLE_RATES_HZ: [[u32; 3]; 3] = [
    [44100, 48000, 32000],
    [22050, 24000, 16000],
    [11025, 12000, 8000],
];

/// Layer III side information length (bytes) for `[mpeg1][mono]`
#[inline]
pub fn side_info_len(mpeg1: bool, mono: bool) -> usize {
    match (mpeg1, mono) {
        (true, true) => 17,
        (true, false) => 32,
        (false, true) => 9,
        (false, false) => 17,
    }
}

