//! mpascan - MPEG audio stream scanner library
//!
//! Scans, validates and decodes MPEG audio byte streams with the
//! fault-tolerant decoder from `libmpa-stream`.
//!

pub mod audio;

use std::io::Cursor;

use anyhow::{Context, Result};
use libmpa_stream::{create_decoder, AudioFrameHeader, StreamError};
use tracing::{debug, warn};

/// Re-export libmpa types
pub use libmpa_stream::{ErrorPolicy, DEFAULT_MODERATE_BUDGET};

/// Information about an MPEG audio stream, taken from its first frame
#[derive(Debug, Clone, serde::Serialize)]
pub struct StreamInfo {
    pub version: String,
    pub layer: String,
    pub channel_mode: String,
    pub channels: usize,
    pub sample_rate: u32,
    pub bitrate_kbps: u32,
    pub vbr: bool,
    pub crc_protected: bool,
    pub samples_per_frame: usize,
    /// duration estimated from the bit rate and `file_size`
    pub estimated_duration_secs: f64,
    pub estimated_frames: u64,
    pub file_size: usize,
}

impl StreamInfo {
    fn from_header(header: &AudioFrameHeader, file_size: usize) -> Self {
        Self {
            version: header.version().to_string(),
            layer: header.layer().to_string(),
            channel_mode: header.channel_mode().name().to_string(),
            channels: header.channels(),
            sample_rate: header.sample_rate(),
            bitrate_kbps: header.bitrate_kbps(),
            vbr: header.is_vbr(),
            crc_protected: header.is_crc_protected(),
            samples_per_frame: header.samples_per_frame(),
            estimated_duration_secs: header.estimate_duration(file_size as u64),
            estimated_frames: header.estimate_frame_count(file_size as u64),
            file_size,
        }
    }
}

/// Probe a stream and describe its first frame
pub fn get_stream_info(data: &[u8], policy: ErrorPolicy) -> Result<StreamInfo> {
    let decoder =
        create_decoder(Cursor::new(data), policy).context("Not a valid MPEG audio stream")?;
    let header = decoder.current_header()?;
    Ok(StreamInfo::from_header(&header, data.len()))
}

/// Options for scanning a stream
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Error tolerance for the decoder
    pub policy: ErrorPolicy,
    /// Decode payloads instead of skipping them
    pub decode: bool,
}

impl ScanOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the error policy
    pub fn with_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Decode every frame's samples rather than skipping
    pub fn decoding(mut self) -> Self {
        self.decode = true;
        self
    }
}

/// How a scan ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanOutcome {
    /// Reached the end of the stream
    Complete,
    /// Failed before enough frames decoded to call it audio
    NotAudio,
    /// Error budget ran out
    TooManyErrors,
    /// The byte source failed
    TransportFailed,
}

/// Result of pulling every frame out of a stream
///
/// A Xing/Info or VBRI tag frame at the start of the stream is a well-formed
/// frame and is counted in `valid_frames`, `samples` and `duration_secs` like
/// any other.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ScanReport {
    /// UTC time the scan finished
    pub scanned_at: String,
    pub policy: String,
    pub decoded: bool,
    pub info: StreamInfo,
    pub frames_attempted: u64,
    pub valid_frames: u64,
    pub errors: u32,
    /// per-channel samples across valid frames
    pub samples: u64,
    /// playing time of the valid frames
    pub duration_secs: f64,
    pub bytes_consumed: u64,
    pub outcome: ScanOutcome,
    /// error message when the scan did not complete
    pub message: Option<String>,
}

impl ScanReport {
    pub fn is_complete(&self) -> bool {
        self.outcome == ScanOutcome::Complete
    }
}

/// Scan an in-memory stream frame by frame
///
/// # Arguments
/// * `data` - Raw bytes of an MPEG audio stream (ID3 tags allowed)
/// * `options` - Error policy and decode mode
///
/// # Returns
/// A report of what was found. Streams that fail while probing for the first
/// frame are an error; failures after that end up in the report's outcome.
pub fn scan_bytes(data: &[u8], options: ScanOptions) -> Result<ScanReport> {
    let mut decoder = create_decoder(Cursor::new(data), options.policy)
        .context("Not a valid MPEG audio stream")?;
    let header = decoder.current_header()?;
    let info = StreamInfo::from_header(&header, data.len());

    let mut samples = 0u64;
    let mut duration_secs = 0.0;
    let (outcome, message) = loop {
        let pulled = if options.decode {
            decoder.next_frame()
        } else {
            decoder.skip_frame()
        };

        match pulled {
            Ok(Some(frame)) => {
                samples += frame.sample_count() as u64;
                duration_secs += frame.duration_secs();
            }
            Ok(None) => break (ScanOutcome::Complete, None),
            Err(err) => {
                let outcome = match err {
                    StreamError::NotAudio { .. } => ScanOutcome::NotAudio,
                    StreamError::TooManyErrors { .. } => ScanOutcome::TooManyErrors,
                    StreamError::Transport(_) => ScanOutcome::TransportFailed,
                    StreamError::InvalidState(_) => {
                        return Err(err).context("Decoder used after failure")
                    }
                };
                break (outcome, Some(err.to_string()));
            }
        }
    };

    debug!(
        valid_frames = decoder.valid_frames_decoded(),
        errors = decoder.errors(),
        ?outcome,
        "scan finished"
    );

    Ok(ScanReport {
        scanned_at: chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        policy: options.policy.to_string(),
        decoded: options.decode,
        info,
        frames_attempted: decoder.frames_attempted(),
        valid_frames: decoder.valid_frames_decoded(),
        errors: decoder.errors(),
        samples,
        duration_secs,
        bytes_consumed: decoder.position(),
        outcome,
        message,
    })
}

/// Validate an MPEG audio stream
///
/// True when every frame could be read within the policy's error budget.
pub fn validate(data: &[u8], policy: ErrorPolicy) -> Result<bool> {
    match scan_bytes(data, ScanOptions::new().with_policy(policy)) {
        Ok(report) => Ok(report.is_complete()),
        Err(err) => match err.downcast_ref::<StreamError>() {
            Some(stream_err) if stream_err.is_not_audio() => Ok(false),
            _ => Err(err),
        },
    }
}

/// Decode an MPEG audio stream to raw samples
///
/// # Returns
/// Tuple of (samples, sample_rate, channels) where samples are interleaved f32
/// in the layout of the first frame. Frames with a different layout are dropped.
pub fn decode_to_samples(data: &[u8], policy: ErrorPolicy) -> Result<(Vec<f32>, u32, usize)> {
    let mut decoder =
        create_decoder(Cursor::new(data), policy).context("Not a valid MPEG audio stream")?;
    let header = decoder.current_header()?;
    let sample_rate = header.sample_rate();
    let channels = header.channels();

    let capacity = header.estimate_frame_count(data.len() as u64) as usize
        * header.samples_per_frame()
        * channels;
    let mut all_samples = Vec::with_capacity(capacity);

    while let Some(frame) = decoder.next_frame().context("Decoding failed")? {
        if frame.channels() != channels || frame.sample_rate() != sample_rate {
            warn!(
                channels = frame.channels(),
                sample_rate = frame.sample_rate(),
                "dropping frame with a different layout"
            );
            continue;
        }
        if let Some(samples) = frame.into_samples() {
            all_samples.extend(samples);
        }
    }

    Ok((all_samples, sample_rate, channels))
}

/// Decode an MPEG audio stream to WAV format
///
/// # Returns
/// Raw bytes of a 32-bit float WAV file
pub fn decode_to_wav(data: &[u8], policy: ErrorPolicy) -> Result<Vec<u8>> {
    let (samples, sample_rate, channels) = decode_to_samples(data, policy)?;

    audio::write_wav_to_bytes(&samples, sample_rate, channels).context("Failed to write WAV data")
}
