use std::io::Read;

use symphonia::core::audio::Channels;
use symphonia::core::codecs::{
    CodecParameters, Decoder, DecoderOptions, CODEC_TYPE_MP1, CODEC_TYPE_MP2, CODEC_TYPE_MP3,
};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::Packet;
use tracing::{debug, trace};

use super::samples::append_interleaved;
use super::vbr::read_vbr_tag;
use super::FrameCodec;
use crate::core::tables::HEADER_LEN;
use crate::core::{AudioFrameHeader, CodecError, Layer, MalformedFrame};
use crate::reader::SourceReader;

const ID3V2_HEADER_LEN: usize = 10;

/// symphonia decoder plus the format it was built for
struct PayloadDecoder {
    key: (Layer, u32, usize),
    inner: Box<dyn Decoder>,
}

/// [`FrameCodec`] for MPEG-1/2/2.5 layer I/II/III elementary streams.
///
/// Reading a header also buffers the rest of its frame, so a header is only
/// handed out once its whole frame is in memory. Sample reconstruction is
/// delegated to symphonia, one packet per frame.
pub struct MpegFrameCodec<R> {
    reader: SourceReader<R>,
    /// header + payload of the last frame read
    frame: Vec<u8>,
    buffered: bool,
    started: bool,
    /// only the first frame may carry a Xing/Info or VBRI tag
    tag_checked: bool,
    decoder: Option<PayloadDecoder>,
    /// running timestamp in samples, for packets
    ts: u64,
}

impl<R: Read> MpegFrameCodec<R> {
    pub fn new(source: R) -> Self {
        MpegFrameCodec {
            reader: SourceReader::new(source),
            frame: Vec::with_capacity(2048),
            buffered: false,
            started: false,
            tag_checked: false,
            decoder: None,
            ts: 0,
        }
    }

    /// release the byte source
    pub fn into_inner(self) -> R {
        self.reader.into_inner()
    }

    /// skip any ID3v2 tags in front of the first frame
    fn skip_id3v2(&mut self) -> Result<(), CodecError> {
        loop {
            let available = self.reader.fill(ID3V2_HEADER_LEN)?;
            let head = self.reader.peek();
            if available < ID3V2_HEADER_LEN || !head.starts_with(b"ID3") {
                return Ok(());
            }

            let flags = head[5];
            let size = head[6..10]
                .iter()
                .fold(0u64, |acc, &b| (acc << 7) | (b & 0x7F) as u64);
            let footer = if flags & 0x10 != 0 { 10 } else { 0 };
            let total = ID3V2_HEADER_LEN as u64 + size + footer;

            let skipped = self.reader.skip(total)?;
            debug!(bytes = skipped, "skipped ID3v2 tag");
        }
    }

    /// Move the cursor to the next sync candidate. Returns the bytes skipped
    /// and whether a candidate was found before the source ran out.
    fn scan_to_sync(&mut self) -> Result<(u64, bool), CodecError> {
        let mut skipped = 0u64;
        loop {
            let available = self.reader.fill(2)?;
            if available < 2 {
                self.reader.consume(available);
                skipped += available as u64;
                return Ok((skipped, false));
            }

            let window = self.reader.peek();
            match window
                .windows(2)
                .position(|pair| AudioFrameHeader::is_sync(pair[0], pair[1]))
            {
                Some(offset) => {
                    self.reader.consume(offset);
                    skipped += offset as u64;
                    return Ok((skipped, true));
                }
                None => {
                    // last byte may be the first half of a sync word
                    let keep_last = window.len() - 1;
                    self.reader.consume(keep_last);
                    skipped += keep_last as u64;
                }
            }
        }
    }

    fn payload_decoder(&mut self, header: &AudioFrameHeader) -> Result<&mut dyn Decoder, CodecError> {
        let key = (header.layer(), header.sample_rate(), header.channels());
        let stale = self.decoder.as_ref().map_or(true, |d| d.key != key);

        if stale {
            let codec = match header.layer() {
                Layer::I => CODEC_TYPE_MP1,
                Layer::II => CODEC_TYPE_MP2,
                Layer::III => CODEC_TYPE_MP3,
            };
            let channels = if header.channels() == 1 {
                Channels::FRONT_LEFT
            } else {
                Channels::FRONT_LEFT | Channels::FRONT_RIGHT
            };

            let mut params = CodecParameters::new();
            params
                .for_codec(codec)
                .with_sample_rate(header.sample_rate())
                .with_channels(channels);

            let inner = symphonia::default::get_codecs()
                .make(&params, &DecoderOptions::default())
                .map_err(map_symphonia_error)?;

            debug!(
                format = %header.describe(),
                sample_rate = header.sample_rate(),
                channels = header.channels(),
                "created payload decoder"
            );
            self.decoder = Some(PayloadDecoder { key, inner });
        }

        match self.decoder.as_mut() {
            Some(decoder) => Ok(decoder.inner.as_mut()),
            None => Err(MalformedFrame::Unsupported(header.describe()).into()),
        }
    }

    fn take_buffered(&mut self) -> Result<(), CodecError> {
        if !self.buffered {
            return Err(MalformedFrame::MissingPayload.into());
        }
        self.buffered = false;
        Ok(())
    }
}

impl<R: Read> FrameCodec for MpegFrameCodec<R> {
    fn read_header(&mut self) -> Result<Option<AudioFrameHeader>, CodecError> {
        self.buffered = false;

        if !self.started {
            self.started = true;
            self.skip_id3v2()?;
        }

        let available = self.reader.fill(HEADER_LEN)?;
        if available == 0 {
            return Ok(None);
        }

        if self.reader.peek().starts_with(b"TAG") {
            let trailer = self.reader.skip_to_end()?;
            debug!(bytes = trailer, "ID3v1 trailer, end of audio");
            return Ok(None);
        }

        if available < HEADER_LEN {
            debug!(bytes = available, "trailing fragment shorter than a header");
            self.reader.consume(available);
            return Ok(None);
        }

        let bytes = {
            let head = self.reader.peek();
            [head[0], head[1], head[2], head[3]]
        };

        if !AudioFrameHeader::is_sync(bytes[0], bytes[1]) {
            let (skipped, found) = self.scan_to_sync()?;
            if !found {
                return Err(CodecError::Exhausted(format!(
                    "no frame sync in the last {} bytes",
                    skipped
                )));
            }
            return Err(MalformedFrame::LostSync { skipped }.into());
        }

        let header = match AudioFrameHeader::parse(bytes) {
            Ok(header) => header,
            Err(malformed) => {
                // step off this sync word so the next attempt finds another
                self.reader.consume(1);
                self.scan_to_sync()?;
                return Err(malformed.into());
            }
        };

        self.frame.clear();
        let len = header.frame_len();
        let got = self.reader.read_into(&mut self.frame, len)?;
        if got < len {
            return Err(CodecError::Exhausted(format!(
                "frame truncated: {} of {} bytes",
                got, len
            )));
        }
        self.buffered = true;

        let first = !self.tag_checked;
        self.tag_checked = true;
        let tag = if first {
            read_vbr_tag(&header, &self.frame)
        } else {
            None
        };
        let header = match tag {
            Some(tag) if tag.is_vbr() => {
                let mean = tag.mean_bitrate_kbps(&header).unwrap_or(0);
                debug!(kind = ?tag.kind, frames = ?tag.frames, mean_kbps = mean, "VBR tag");
                header.with_vbr_mean(mean)
            }
            _ => header,
        };

        trace!(
            position = self.reader.position(),
            len,
            format = %header.describe(),
            "frame header"
        );
        Ok(Some(header))
    }

    fn decode_frame(&mut self, header: &AudioFrameHeader) -> Result<Vec<f32>, CodecError> {
        self.take_buffered()?;

        let duration = header.samples_per_frame() as u64;
        let packet = Packet::new_from_slice(0, self.ts, duration, &self.frame);
        self.ts += duration;

        let decoder = self.payload_decoder(header)?;
        let decoded = decoder.decode(&packet).map_err(map_symphonia_error)?;

        let mut samples = Vec::new();
        append_interleaved(&decoded, &mut samples);
        Ok(samples)
    }

    fn skip_frame(&mut self, header: &AudioFrameHeader) -> Result<usize, CodecError> {
        self.take_buffered()?;

        let count = header.samples_per_frame();
        self.ts += count as u64;

        // the bit reservoir no longer lines up with the next frame
        if let Some(decoder) = self.decoder.as_mut() {
            decoder.inner.reset();
        }
        Ok(count)
    }

    fn position(&self) -> u64 {
        self.reader.position()
    }
}

fn map_symphonia_error(err: SymphoniaError) -> CodecError {
    match err {
        SymphoniaError::DecodeError(msg) => MalformedFrame::Payload(msg.to_string()).into(),
        SymphoniaError::Unsupported(msg) => MalformedFrame::Unsupported(msg.to_string()).into(),
        SymphoniaError::IoError(e) => CodecError::Exhausted(format!("payload: {}", e)),
        other => MalformedFrame::Payload(other.to_string()).into(),
    }
}
