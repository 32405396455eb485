use std::mem;

use tracing::{debug, error, warn};

use crate::codec::FrameCodec;
use crate::core::{
    AudioFrame, AudioFrameHeader, CodecError, CodecErrorKind, ErrorPolicy, MpaResult,
    StreamError, MIN_VALID_FRAMES,
};

use super::types::{DecoderState, Pending, PullMode};

/// Pull-based decoder over a [`FrameCodec`].
///
/// Each pull either returns a frame, returns `None` at the end of the
/// stream, or fails terminally. Malformed frames in between are counted
/// against the [`ErrorPolicy`] and skipped by scanning for the next header.
/// Not meant to be shared between threads without external locking; every
/// pull mutates the counters.
pub struct StreamDecoder<C> {
    codec: C,
    /// fixed for the decoder's lifetime
    policy: ErrorPolicy,
    state: DecoderState,
    /// header found by the probe, basis for all estimates
    first_header: Option<AudioFrameHeader>,
    pending: Pending,
    frames_attempted: u64,
    valid_frames: u64,
    errors: u32,
}

impl<C: FrameCodec> StreamDecoder<C> {
    /// unprobed decoder, see [`StreamDecoder::open`]
    pub(crate) fn new(codec: C, policy: ErrorPolicy) -> Self {
        Self {
            codec,
            policy,
            state: DecoderState::Probing,
            first_header: None,
            pending: Pending::Nothing,
            frames_attempted: 0,
            valid_frames: 0,
            errors: 0,
        }
    }

    /// Probe `codec` for its first frame header and return a decoder ready to
    /// pull. Fails with [`StreamError::NotAudio`] if no header turns up before
    /// the error budget or the input runs out. More than
    /// [`MIN_VALID_FRAMES`] errors before that many valid frames also count as
    /// not audio, even under [`ErrorPolicy::All`].
    pub fn open(codec: C, policy: ErrorPolicy) -> MpaResult<Self> {
        let mut decoder = Self::new(codec, policy);
        decoder.probe()?;
        Ok(decoder)
    }

    pub(crate) fn probe(&mut self) -> MpaResult<AudioFrameHeader> {
        if self.state != DecoderState::Probing {
            return Err(StreamError::InvalidState("stream has already been probed"));
        }

        loop {
            match self.codec.read_header() {
                Ok(Some(header)) => {
                    debug!(
                        format = %header.describe(),
                        sample_rate = header.sample_rate(),
                        bitrate_kbps = header.bitrate_kbps(),
                        vbr = header.is_vbr(),
                        errors = self.errors,
                        position = self.codec.position(),
                        "found first frame header"
                    );
                    self.first_header = Some(header);
                    self.pending = Pending::Header(header);
                    self.state = DecoderState::Ready;
                    return Ok(header);
                }
                Ok(None) => {
                    let err = self.not_audio();
                    return Err(self.fail(err));
                }
                Err(err) => {
                    if !self.absorb(err)? {
                        let err = self.not_audio();
                        return Err(self.fail(err));
                    }
                }
            }
        }
    }

    /// header captured by the probe
    pub fn current_header(&self) -> MpaResult<AudioFrameHeader> {
        self.first_header
            .ok_or(StreamError::InvalidState("no frame header has been probed"))
    }

    /// Estimated duration in seconds of a stream `stream_len` bytes long,
    /// from the first header's bit rate
    pub fn estimate_duration(&self, stream_len: u64) -> MpaResult<f64> {
        Ok(self.current_header()?.estimate_duration(stream_len))
    }

    /// Estimated frame count of a stream `stream_len` bytes long
    pub fn estimate_frame_count(&self, stream_len: u64) -> MpaResult<u64> {
        Ok(self.current_header()?.estimate_frame_count(stream_len))
    }

    /// frames decoded or skipped successfully so far
    pub fn valid_frames_decoded(&self) -> u64 {
        self.valid_frames
    }

    /// True while a header (or a deferred refill error) waits for the next
    /// pull. The next pull may still come back empty. When false, pulls
    /// return `Ok(None)`.
    pub fn may_have_more_frames(&self) -> bool {
        self.state == DecoderState::Ready && !matches!(self.pending, Pending::Nothing)
    }

    /// decode the next frame, `None` at the end of the stream
    pub fn next_frame(&mut self) -> MpaResult<Option<AudioFrame>> {
        self.pull(PullMode::Decode)
    }

    /// like [`next_frame`](Self::next_frame) without producing samples
    pub fn skip_frame(&mut self) -> MpaResult<Option<AudioFrame>> {
        self.pull(PullMode::Skip)
    }

    /// iterator over decoded frames
    pub fn frames(&mut self) -> Frames<'_, C> {
        Frames { decoder: self }
    }

    /// current lifecycle state
    pub fn state(&self) -> DecoderState {
        self.state
    }

    /// error policy the decoder was opened with
    pub fn policy(&self) -> ErrorPolicy {
        self.policy
    }

    /// frames whose payload was attempted, successful or not
    pub fn frames_attempted(&self) -> u64 {
        self.frames_attempted
    }

    /// frame errors absorbed so far
    pub fn errors(&self) -> u32 {
        self.errors
    }

    /// bytes consumed from the source
    pub fn position(&self) -> u64 {
        self.codec.position()
    }

    /// the underlying codec
    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// release the codec (and with it the byte source)
    pub fn into_codec(self) -> C {
        self.codec
    }

    // internal stuff

    fn pull(&mut self, mode: PullMode) -> MpaResult<Option<AudioFrame>> {
        loop {
            match self.state {
                DecoderState::Probing => {
                    return Err(StreamError::InvalidState("stream has not been probed"))
                }
                // the failure was already reported to the caller
                DecoderState::Draining | DecoderState::Failed => return Ok(None),
                DecoderState::Ready => {}
            }

            let header = match mem::replace(&mut self.pending, Pending::Nothing) {
                Pending::Header(header) => header,
                Pending::Error(err) => {
                    if self.absorb(err)? && self.resync()? {
                        continue;
                    }
                    return Ok(None);
                }
                Pending::Nothing => {
                    self.drain();
                    return Ok(None);
                }
            };

            self.frames_attempted += 1;
            let produced = match mode {
                PullMode::Decode => self
                    .codec
                    .decode_frame(&header)
                    .map(|samples| AudioFrame::decoded(&header, samples)),
                PullMode::Skip => self
                    .codec
                    .skip_frame(&header)
                    .map(|count| AudioFrame::skipped(&header, count)),
            };

            match produced {
                Ok(frame) => {
                    self.valid_frames += 1;
                    self.refill();
                    return Ok(Some(frame));
                }
                Err(err) => {
                    if self.absorb(err)? && self.resync()? {
                        continue;
                    }
                    return Ok(None);
                }
            }
        }
    }

    /// read the header after an emitted frame; failures wait for the next pull
    fn refill(&mut self) {
        match self.codec.read_header() {
            Ok(Some(header)) => self.pending = Pending::Header(header),
            Ok(None) => self.drain(),
            Err(err) => self.pending = Pending::Error(err),
        }
    }

    /// Scan for the next header. `Ok(false)` means the stream ended.
    fn resync(&mut self) -> MpaResult<bool> {
        loop {
            match self.codec.read_header() {
                Ok(Some(header)) => {
                    debug!(
                        position = self.codec.position(),
                        errors = self.errors,
                        "resynchronized"
                    );
                    self.pending = Pending::Header(header);
                    return Ok(true);
                }
                Ok(None) => {
                    self.drain();
                    return Ok(false);
                }
                Err(err) => {
                    if !self.absorb(err)? {
                        return Ok(false);
                    }
                }
            }
        }
    }

    /// Count a codec error against the budget. `Ok(true)` means keep
    /// scanning, `Ok(false)` means the input ran out after enough audio.
    fn absorb(&mut self, err: CodecError) -> MpaResult<bool> {
        let err = match err {
            CodecError::Transport(io) => {
                let err = StreamError::Transport(io);
                return Err(self.fail(err));
            }
            other => other,
        };

        self.errors = self.errors.saturating_add(1);
        warn!(
            error = %err,
            errors = self.errors,
            budget = ?self.policy.budget(),
            valid_frames = self.valid_frames,
            position = self.codec.position(),
            "frame error"
        );

        // before any audio is established, at most MIN_VALID_FRAMES errors are
        // tolerated whatever the policy allows
        let unproven = self.valid_frames < MIN_VALID_FRAMES;
        if self.policy.is_exceeded(self.errors)
            || (unproven && u64::from(self.errors) > MIN_VALID_FRAMES)
        {
            let err = if unproven {
                self.not_audio()
            } else {
                StreamError::TooManyErrors {
                    errors: self.errors,
                    valid_frames: self.valid_frames,
                }
            };
            return Err(self.fail(err));
        }

        if err.kind() == CodecErrorKind::Exhausted {
            if self.valid_frames < MIN_VALID_FRAMES {
                let err = self.not_audio();
                return Err(self.fail(err));
            }
            self.drain();
            return Ok(false);
        }

        Ok(true)
    }

    fn not_audio(&self) -> StreamError {
        StreamError::NotAudio {
            errors: self.errors,
            valid_frames: self.valid_frames,
        }
    }

    fn drain(&mut self) {
        if self.state != DecoderState::Draining {
            debug!(
                valid_frames = self.valid_frames,
                errors = self.errors,
                position = self.codec.position(),
                "end of stream"
            );
        }
        self.state = DecoderState::Draining;
        self.pending = Pending::Nothing;
    }

    fn fail(&mut self, err: StreamError) -> StreamError {
        error!(error = %err, position = self.codec.position(), "stream decoding failed");
        self.state = DecoderState::Failed;
        self.pending = Pending::Nothing;
        err
    }
}

/// Iterator returned by [`StreamDecoder::frames`]; a terminal failure is
/// yielded once as `Err`, then iteration stops
pub struct Frames<'a, C> {
    decoder: &'a mut StreamDecoder<C>,
}

impl<C: FrameCodec> Iterator for Frames<'_, C> {
    type Item = MpaResult<AudioFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        self.decoder.next_frame().transpose()
    }
}
