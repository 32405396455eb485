//! frame header types for MPEG audio

use std::fmt;

use serde::Serialize;

use super::error::MalformedFrame;
use super::tables::{side_info_len, BITRATES_KBPS, CRC_LEN, HEADER_LEN, SAMPLE_RATES_HZ};

/// Minimum number of valid frames before a failing stream counts as damaged
/// audio rather than something that never was audio
pub const MIN_VALID_FRAMES: u64 = 3;

/// MPEG audio version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MpegVersion {
    V1,
    V2,
    V2_5,
}

impl MpegVersion {
    fn table_row(self) -> usize {
        match self {
            MpegVersion::V1 => 0,
            MpegVersion::V2 => 1,
            MpegVersion::V2_5 => 2,
        }
    }
}

impl fmt::Display for MpegVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MpegVersion::V1 => write!(f, "MPEG-1"),
            MpegVersion::V2 => write!(f, "MPEG-2"),
            MpegVersion::V2_5 => write!(f, "MPEG-2.5"),
        }
    }
}

/// MPEG audio layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Layer {
    I,
    II,
    III,
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layer::I => write!(f, "Layer I"),
            Layer::II => write!(f, "Layer II"),
            Layer::III => write!(f, "Layer III"),
        }
    }
}

/// channel layout of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ChannelMode {
    Stereo,
    JointStereo,
    DualChannel,
    Mono,
}

impl ChannelMode {
    /// 1 for mono, 2 otherwise
    pub fn channels(self) -> usize {
        match self {
            ChannelMode::Mono => 1,
            _ => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ChannelMode::Stereo => "stereo",
            ChannelMode::JointStereo => "joint stereo",
            ChannelMode::DualChannel => "dual channel",
            ChannelMode::Mono => "mono",
        }
    }
}

/// Format snapshot of one parsed frame.
///
/// Header bit layout (`AAAAAAAA AAABBCCD EEEEFFGH IIJJKLMM`):
///
/// | Bits | Field                                   |
/// |------|-----------------------------------------|
/// | A    | sync (all ones)                         |
/// | B    | version (00 = 2.5, 10 = 2, 11 = 1)      |
/// | C    | layer (01 = III, 10 = II, 11 = I)       |
/// | D    | protection (0 = CRC follows)            |
/// | E    | bit rate index                          |
/// | F    | sample rate index                       |
/// | G    | padding                                 |
/// | H    | private                                 |
/// | I    | channel mode                            |
/// | J    | mode extension                          |
/// | K    | copyright                               |
/// | L    | original                                |
/// | M    | emphasis                                |
///
/// Only obtainable from [`AudioFrameHeader::parse`], so every value describes
/// a structurally valid frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AudioFrameHeader {
    version: MpegVersion,
    layer: Layer,
    channel_mode: ChannelMode,
    sample_rate: u32,
    bitrate_kbps: u32,
    vbr: bool,
    copyright: bool,
    original: bool,
    crc_protected: bool,
    padded: bool,
    frame_len: usize,
}

impl AudioFrameHeader {
    /// true if the first two bytes look like a frame sync word
    #[inline]
    pub fn is_sync(b0: u8, b1: u8) -> bool {
        b0 == 0xFF && (b1 & 0xE0) == 0xE0
    }

    /// parse a 4 byte frame header
    pub fn parse(bytes: [u8; 4]) -> Result<Self, MalformedFrame> {
        if !Self::is_sync(bytes[0], bytes[1]) {
            return Err(MalformedFrame::LostSync { skipped: 0 });
        }

        let version = match (bytes[1] >> 3) & 0x03 {
            0b00 => MpegVersion::V2_5,
            0b10 => MpegVersion::V2,
            0b11 => MpegVersion::V1,
            _ => return Err(MalformedFrame::ReservedVersion),
        };
        let layer = match (bytes[1] >> 1) & 0x03 {
            0b01 => Layer::III,
            0b10 => Layer::II,
            0b11 => Layer::I,
            _ => return Err(MalformedFrame::ReservedLayer),
        };
        let crc_protected = bytes[1] & 0x01 == 0;

        let bitrate_index = (bytes[2] >> 4) as usize;
        let sample_rate_index = ((bytes[2] >> 2) & 0x03) as usize;
        let padded = (bytes[2] >> 1) & 0x01 == 1;

        let channel_mode = match bytes[3] >> 6 {
            0b00 => ChannelMode::Stereo,
            0b01 => ChannelMode::JointStereo,
            0b10 => ChannelMode::DualChannel,
            _ => ChannelMode::Mono,
        };
        let copyright = (bytes[3] >> 3) & 0x01 == 1;
        let original = (bytes[3] >> 2) & 0x01 == 1;

        match bitrate_index {
            0 => return Err(MalformedFrame::FreeFormat),
            15 => return Err(MalformedFrame::BadBitrate),
            _ => {}
        }
        if sample_rate_index == 3 {
            return Err(MalformedFrame::ReservedSampleRate);
        }

        let row = match (version, layer) {
            (MpegVersion::V1, Layer::I) => 0,
            (MpegVersion::V1, Layer::II) => 1,
            (MpegVersion::V1, Layer::III) => 2,
            (_, Layer::I) => 3,
            _ => 4,
        };
        let bitrate_kbps = BITRATES_KBPS[row][bitrate_index];
        let sample_rate = SAMPLE_RATES_HZ[version.table_row()][sample_rate_index];

        // MPEG-1 layer II only allows some bit rates per channel mode
        if version == MpegVersion::V1 && layer == Layer::II {
            let mono = channel_mode == ChannelMode::Mono;
            let allowed = match bitrate_kbps {
                32 | 48 | 56 | 80 => mono,
                224 | 256 | 320 | 384 => !mono,
                _ => true,
            };
            if !allowed {
                return Err(MalformedFrame::IllegalMode {
                    bitrate_kbps,
                    mode: channel_mode.name(),
                });
            }
        }

        let frame_len = frame_len(version, layer, bitrate_kbps, sample_rate, padded);

        Ok(AudioFrameHeader {
            version,
            layer,
            channel_mode,
            sample_rate,
            bitrate_kbps,
            vbr: false,
            copyright,
            original,
            crc_protected,
            padded,
            frame_len,
        })
    }

    /// same header with the stream mean bit rate from a VBR tag
    pub(crate) fn with_vbr_mean(mut self, mean_kbps: u32) -> Self {
        self.vbr = true;
        if mean_kbps > 0 {
            self.bitrate_kbps = mean_kbps;
        }
        self
    }

    pub fn version(&self) -> MpegVersion {
        self.version
    }

    pub fn layer(&self) -> Layer {
        self.layer
    }

    pub fn channel_mode(&self) -> ChannelMode {
        self.channel_mode
    }

    pub fn channels(&self) -> usize {
        self.channel_mode.channels()
    }

    /// Sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// bit rate in kb/s (stream mean for VBR)
    pub fn bitrate_kbps(&self) -> u32 {
        self.bitrate_kbps
    }

    pub fn is_vbr(&self) -> bool {
        self.vbr
    }

    pub fn is_copyright(&self) -> bool {
        self.copyright
    }

    pub fn is_original(&self) -> bool {
        self.original
    }

    pub fn is_crc_protected(&self) -> bool {
        self.crc_protected
    }

    pub fn is_padded(&self) -> bool {
        self.padded
    }

    /// whole frame length in bytes, header included
    pub fn frame_len(&self) -> usize {
        self.frame_len
    }

    /// samples per channel produced by one frame
    pub fn samples_per_frame(&self) -> usize {
        match (self.layer, self.version) {
            (Layer::I, _) => 384,
            (Layer::II, _) | (Layer::III, MpegVersion::V1) => 1152,
            (Layer::III, _) => 576,
        }
    }

    /// offset of a Xing/Info tag inside the frame (layer III only)
    pub fn vbr_tag_offset(&self) -> usize {
        let crc = if self.crc_protected { CRC_LEN } else { 0 };
        HEADER_LEN
            + crc
            + side_info_len(
                self.version == MpegVersion::V1,
                self.channel_mode == ChannelMode::Mono,
            )
    }

    /// "MPEG-1 Layer III" style description
    pub fn describe(&self) -> String {
        format!("{} {}", self.version, self.layer)
    }

    /// Estimated playing time of `stream_len` bytes at this header's bit rate
    pub fn estimate_duration(&self, stream_len: u64) -> f64 {
        if self.bitrate_kbps == 0 {
            return 0.0;
        }
        (stream_len as f64 * 8.0) / (self.bitrate_kbps as f64 * 1000.0)
    }

    /// Estimated number of frames in `stream_len` bytes
    pub fn estimate_frame_count(&self, stream_len: u64) -> u64 {
        let samples = self.estimate_duration(stream_len) * self.sample_rate as f64;
        (samples / self.samples_per_frame() as f64).round() as u64
    }
}

/// frame length in bytes
fn frame_len(
    version: MpegVersion,
    layer: Layer,
    bitrate_kbps: u32,
    sample_rate: u32,
    padded: bool,
) -> usize {
    let bitrate = bitrate_kbps as usize * 1000;
    let sample_rate = sample_rate as usize;
    let pad = padded as usize;

    match layer {
        Layer::I => (12 * bitrate / sample_rate + pad) * 4,
        Layer::II => 144 * bitrate / sample_rate + pad,
        Layer::III if version == MpegVersion::V1 => 144 * bitrate / sample_rate + pad,
        Layer::III => 72 * bitrate / sample_rate + pad,
    }
}
