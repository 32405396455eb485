//! Xing/Info and VBRI tags carried in the first frame of a stream

use crate::core::tables::HEADER_LEN;
use crate::core::{AudioFrameHeader, Layer};

/// VBRI tags sit at a fixed offset after the header
const VBRI_OFFSET: usize = HEADER_LEN + 32;

/// which tag was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VbrTagKind {
    Xing,
    /// Xing layout written by CBR encoders
    Info,
    Vbri,
}

/// stream totals recorded by the encoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VbrTag {
    pub kind: VbrTagKind,
    pub frames: Option<u32>,
    pub bytes: Option<u32>,
}

impl VbrTag {
    /// true for tags that mark a variable bit rate stream
    pub fn is_vbr(&self) -> bool {
        self.kind != VbrTagKind::Info
    }

    /// mean bit rate in kb/s over the whole stream
    pub fn mean_bitrate_kbps(&self, header: &AudioFrameHeader) -> Option<u32> {
        let frames = self.frames? as u64;
        let bytes = self.bytes? as u64;
        let samples = frames * header.samples_per_frame() as u64;
        if samples == 0 {
            return None;
        }
        let kbps = bytes * 8 * header.sample_rate() as u64 / (samples * 1000);
        Some(kbps as u32)
    }
}

/// look for a VBR tag inside a complete frame (header included)
pub fn read_vbr_tag(header: &AudioFrameHeader, frame: &[u8]) -> Option<VbrTag> {
    if header.layer() != Layer::III {
        return None;
    }

    read_xing(frame, header.vbr_tag_offset()).or_else(|| read_vbri(frame))
}

fn read_xing(frame: &[u8], offset: usize) -> Option<VbrTag> {
    let kind = match frame.get(offset..offset + 4)? {
        b"Xing" => VbrTagKind::Xing,
        b"Info" => VbrTagKind::Info,
        _ => return None,
    };

    let mut pos = offset + 4;
    let flags = read_u32_be(frame, pos)?;
    pos += 4;

    let frames = if flags & 0x01 != 0 {
        let v = read_u32_be(frame, pos);
        pos += 4;
        v
    } else {
        None
    };
    let bytes = if flags & 0x02 != 0 {
        read_u32_be(frame, pos)
    } else {
        None
    };

    Some(VbrTag {
        kind,
        frames,
        bytes,
    })
}

fn read_vbri(frame: &[u8]) -> Option<VbrTag> {
    if frame.get(VBRI_OFFSET..VBRI_OFFSET + 4)? != b"VBRI" {
        return None;
    }
    // id(4) + version(2) + delay(2) + quality(2)
    let bytes = read_u32_be(frame, VBRI_OFFSET + 10);
    let frames = read_u32_be(frame, VBRI_OFFSET + 14);

    Some(VbrTag {
        kind: VbrTagKind::Vbri,
        frames,
        bytes,
    })
}

fn read_u32_be(data: &[u8], pos: usize) -> Option<u32> {
    let b = data.get(pos..pos + 4)?;
    Some(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
}
