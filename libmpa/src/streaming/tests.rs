//! Internal streaming tests driven by a scripted codec

use std::collections::VecDeque;
use std::io;

use super::*;
use crate::codec::FrameCodec;
use crate::core::{
    AudioFrameHeader, CodecError, ErrorPolicy, MalformedFrame, StreamError,
};

const FRAME_LEN: u64 = 417;

/// what the next header read runs into
#[derive(Debug, Clone, Copy)]
enum Unit {
    Frame,
    /// header parses, payload does not
    BadPayload,
    BadHeader,
    Truncated,
    Broken,
}

struct ScriptedCodec {
    script: VecDeque<Unit>,
    payload_ok: Option<bool>,
    position: u64,
}

impl ScriptedCodec {
    fn new(units: &[Unit]) -> Self {
        ScriptedCodec {
            script: units.iter().copied().collect(),
            payload_ok: None,
            position: 0,
        }
    }

    fn take_payload(&mut self) -> Result<(), CodecError> {
        match self.payload_ok.take() {
            Some(true) => Ok(()),
            Some(false) => Err(MalformedFrame::Payload("bad huffman data".into()).into()),
            None => Err(MalformedFrame::MissingPayload.into()),
        }
    }
}

impl FrameCodec for ScriptedCodec {
    fn read_header(&mut self) -> Result<Option<AudioFrameHeader>, CodecError> {
        let Some(unit) = self.script.pop_front() else {
            return Ok(None);
        };
        self.position += FRAME_LEN;
        match unit {
            Unit::Frame => {
                self.payload_ok = Some(true);
                Ok(Some(mono_header()))
            }
            Unit::BadPayload => {
                self.payload_ok = Some(false);
                Ok(Some(mono_header()))
            }
            Unit::BadHeader => Err(MalformedFrame::LostSync { skipped: FRAME_LEN }.into()),
            Unit::Truncated => Err(CodecError::Exhausted("frame cut short".into())),
            Unit::Broken => Err(CodecError::Transport(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "peer went away",
            ))),
        }
    }

    fn decode_frame(&mut self, header: &AudioFrameHeader) -> Result<Vec<f32>, CodecError> {
        self.take_payload()?;
        Ok(vec![0.25; header.samples_per_frame() * header.channels()])
    }

    fn skip_frame(&mut self, header: &AudioFrameHeader) -> Result<usize, CodecError> {
        self.take_payload()?;
        Ok(header.samples_per_frame())
    }

    fn position(&self) -> u64 {
        self.position
    }
}

/// MPEG-1 Layer III, 128 kb/s, 44.1 kHz, mono
fn mono_header() -> AudioFrameHeader {
    AudioFrameHeader::parse([0xFF, 0xFB, 0x90, 0xC0]).unwrap()
}

fn script(parts: &[(Unit, usize)]) -> Vec<Unit> {
    parts
        .iter()
        .flat_map(|&(unit, count)| std::iter::repeat(unit).take(count))
        .collect()
}

fn open(units: &[Unit], policy: ErrorPolicy) -> StreamDecoder<ScriptedCodec> {
    StreamDecoder::open(ScriptedCodec::new(units), policy).unwrap()
}

/// pull until the stream ends or fails, returning frames seen and the failure
fn drain_all(decoder: &mut StreamDecoder<ScriptedCodec>) -> (u64, Option<StreamError>) {
    let mut frames = 0;
    loop {
        match decoder.next_frame() {
            Ok(Some(_)) => frames += 1,
            Ok(None) => return (frames, None),
            Err(err) => return (frames, Some(err)),
        }
    }
}

// ============================================================================
// Clean streams
// ============================================================================

#[test]
fn test_five_frames_then_end() {
    let mut decoder = open(&script(&[(Unit::Frame, 5)]), ErrorPolicy::default());
    assert_eq!(decoder.state(), DecoderState::Ready);
    assert!(decoder.may_have_more_frames());

    for _ in 0..5 {
        let frame = decoder.next_frame().unwrap().unwrap();
        assert_eq!(frame.sample_count(), 1152);
        assert_eq!(frame.channels(), 1);
        assert_eq!(frame.sample_rate(), 44100);
    }

    assert!(!decoder.may_have_more_frames());
    assert!(decoder.next_frame().unwrap().is_none());
    assert!(decoder.next_frame().unwrap().is_none());
    assert_eq!(decoder.state(), DecoderState::Draining);
    assert_eq!(decoder.valid_frames_decoded(), 5);
    assert_eq!(decoder.frames_attempted(), 5);
    assert_eq!(decoder.errors(), 0);
}

#[test]
fn test_skip_returns_counts_only() {
    let mut decoder = open(&script(&[(Unit::Frame, 2)]), ErrorPolicy::default());
    let frame = decoder.skip_frame().unwrap().unwrap();
    assert!(frame.is_skipped());
    assert!(frame.samples().is_none());
    assert_eq!(frame.sample_count(), 1152);

    let frame = decoder.next_frame().unwrap().unwrap();
    assert_eq!(frame.samples().map(<[f32]>::len), Some(1152));
    assert_eq!(decoder.valid_frames_decoded(), 2);
}

#[test]
fn test_frames_iterator() {
    let mut decoder = open(&script(&[(Unit::Frame, 7)]), ErrorPolicy::default());
    let frames: Vec<_> = decoder.frames().collect::<Result<_, _>>().unwrap();
    assert_eq!(frames.len(), 7);
}

#[test]
fn test_frames_iterator_stops_after_failure() {
    let units = script(&[(Unit::Frame, 4), (Unit::Broken, 1), (Unit::Frame, 3)]);
    let mut decoder = open(&units, ErrorPolicy::All);
    let results: Vec<_> = decoder.frames().collect();
    assert_eq!(results.len(), 5);
    assert!(results[..4].iter().all(Result::is_ok));
    assert!(matches!(results[4], Err(StreamError::Transport(_))));
}

// ============================================================================
// Probing
// ============================================================================

#[test]
fn test_malformed_only_is_not_audio() {
    let units = script(&[(Unit::BadHeader, 4)]);
    let err = StreamDecoder::open(ScriptedCodec::new(&units), ErrorPolicy::default())
        .err()
        .unwrap();
    assert!(matches!(
        err,
        StreamError::NotAudio { errors: 4, valid_frames: 0 }
    ));
    assert!(err.is_not_audio());
}

#[test]
fn test_empty_stream_is_not_audio() {
    let result = StreamDecoder::open(ScriptedCodec::new(&[]), ErrorPolicy::default());
    assert!(result.err().unwrap().is_not_audio());
}

#[test]
fn test_probe_junk_under_strict_policy() {
    let units = script(&[(Unit::BadHeader, 1), (Unit::Frame, 5)]);
    let result = StreamDecoder::open(ScriptedCodec::new(&units), ErrorPolicy::None);
    assert!(matches!(
        result.err(),
        Some(StreamError::NotAudio { errors: 1, .. })
    ));
}

#[test]
fn test_probe_skips_leading_junk() {
    let units = script(&[(Unit::BadHeader, 3), (Unit::Frame, 5)]);
    let mut decoder = open(&units, ErrorPolicy::default());
    assert_eq!(decoder.errors(), 3);
    let (frames, err) = drain_all(&mut decoder);
    assert_eq!(frames, 5);
    assert!(err.is_none());
}

#[test]
fn test_four_leading_errors_are_not_audio() {
    let units = script(&[(Unit::BadHeader, 4), (Unit::Frame, 10)]);
    for policy in [ErrorPolicy::Moderate(10), ErrorPolicy::All] {
        let result = StreamDecoder::open(ScriptedCodec::new(&units), policy);
        assert!(matches!(
            result.err(),
            Some(StreamError::NotAudio { errors: 4, valid_frames: 0 })
        ));
    }
}

#[test]
fn test_junk_before_third_frame_is_not_audio() {
    let units = script(&[(Unit::Frame, 2), (Unit::BadHeader, 4), (Unit::Frame, 10)]);
    let mut decoder = open(&units, ErrorPolicy::All);
    let (frames, err) = drain_all(&mut decoder);
    assert_eq!(frames, 2);
    assert!(matches!(
        err,
        Some(StreamError::NotAudio { errors: 4, valid_frames: 2 })
    ));
}

#[test]
fn test_unprobed_decoder_is_defensive() {
    let mut decoder = StreamDecoder::new(ScriptedCodec::new(&[Unit::Frame]), ErrorPolicy::default());
    assert!(matches!(
        decoder.current_header(),
        Err(StreamError::InvalidState(_))
    ));
    assert!(decoder.estimate_duration(1000).is_err());
    assert!(!decoder.may_have_more_frames());
    assert!(matches!(
        decoder.next_frame(),
        Err(StreamError::InvalidState(_))
    ));
}

#[test]
fn test_probe_only_once() {
    let mut decoder = open(&[Unit::Frame], ErrorPolicy::default());
    assert!(matches!(decoder.probe(), Err(StreamError::InvalidState(_))));
    assert!(decoder.next_frame().unwrap().is_some());
}

// ============================================================================
// Error budget
// ============================================================================

#[test]
fn test_single_error_recovered() {
    let units = script(&[(Unit::Frame, 10), (Unit::BadHeader, 1), (Unit::Frame, 10)]);
    let mut decoder = open(&units, ErrorPolicy::default());
    let (frames, err) = drain_all(&mut decoder);
    assert_eq!(frames, 20);
    assert!(err.is_none());
    assert_eq!(decoder.errors(), 1);
    assert_eq!(decoder.valid_frames_decoded(), 20);
}

#[test]
fn test_bad_payload_recovered() {
    let units = script(&[(Unit::Frame, 10), (Unit::BadPayload, 1), (Unit::Frame, 10)]);
    let mut decoder = open(&units, ErrorPolicy::default());
    let (frames, err) = drain_all(&mut decoder);
    assert_eq!(frames, 20);
    assert!(err.is_none());
    assert_eq!(decoder.frames_attempted(), 21);
    assert_eq!(decoder.valid_frames_decoded(), 20);
}

#[test]
fn test_strict_policy_fails_on_next_pull() {
    let units = script(&[(Unit::Frame, 4), (Unit::BadHeader, 1), (Unit::Frame, 4)]);
    let mut decoder = open(&units, ErrorPolicy::None);
    for _ in 0..4 {
        assert!(decoder.next_frame().unwrap().is_some());
    }
    // refill error is deferred, so the header is still "pending"
    assert!(decoder.may_have_more_frames());
    let err = decoder.next_frame().unwrap_err();
    assert!(matches!(
        err,
        StreamError::TooManyErrors { errors: 1, valid_frames: 4 }
    ));
    assert_eq!(decoder.state(), DecoderState::Failed);
}

#[test]
fn test_strict_policy_bad_payload() {
    let units = script(&[(Unit::Frame, 4), (Unit::BadPayload, 1), (Unit::Frame, 4)]);
    let mut decoder = open(&units, ErrorPolicy::None);
    let (frames, err) = drain_all(&mut decoder);
    assert_eq!(frames, 4);
    assert!(matches!(err, Some(StreamError::TooManyErrors { .. })));
}

#[test]
fn test_early_failure_reports_not_audio() {
    let units = script(&[(Unit::Frame, 2), (Unit::BadHeader, 1), (Unit::Frame, 4)]);
    let mut decoder = open(&units, ErrorPolicy::None);
    let (frames, err) = drain_all(&mut decoder);
    assert_eq!(frames, 2);
    assert!(err.unwrap().is_not_audio());
}

#[test]
fn test_moderate_budget_is_inclusive() {
    let units = script(&[(Unit::Frame, 5), (Unit::BadHeader, 3), (Unit::Frame, 5)]);
    let mut decoder = open(&units, ErrorPolicy::Moderate(3));
    let (frames, err) = drain_all(&mut decoder);
    assert_eq!(frames, 10);
    assert!(err.is_none());
    assert_eq!(decoder.errors(), 3);
}

#[test]
fn test_moderate_budget_exceeded() {
    let units = script(&[(Unit::Frame, 5), (Unit::BadHeader, 4), (Unit::Frame, 5)]);
    let mut decoder = open(&units, ErrorPolicy::Moderate(3));
    let (frames, err) = drain_all(&mut decoder);
    assert_eq!(frames, 5);
    assert!(matches!(
        err,
        Some(StreamError::TooManyErrors { errors: 4, valid_frames: 5 })
    ));
}

#[test]
fn test_budget_spans_whole_stream() {
    // errors are never reset by good frames in between
    let units = script(&[
        (Unit::Frame, 5),
        (Unit::BadHeader, 2),
        (Unit::Frame, 5),
        (Unit::BadHeader, 2),
        (Unit::Frame, 5),
    ]);
    let mut decoder = open(&units, ErrorPolicy::Moderate(3));
    let (frames, err) = drain_all(&mut decoder);
    assert_eq!(frames, 10);
    assert!(matches!(err, Some(StreamError::TooManyErrors { errors: 4, .. })));
}

#[test]
fn test_budgets_are_per_instance() {
    let units = script(&[(Unit::Frame, 5), (Unit::BadHeader, 3), (Unit::Frame, 5)]);
    for _ in 0..3 {
        let mut decoder = open(&units, ErrorPolicy::Moderate(3));
        let (frames, err) = drain_all(&mut decoder);
        assert_eq!(frames, 10);
        assert!(err.is_none());
    }
}

#[test]
fn test_all_policy_never_gives_up() {
    let units = script(&[(Unit::Frame, 3), (Unit::BadHeader, 500), (Unit::Frame, 3)]);
    let mut decoder = open(&units, ErrorPolicy::All);
    let (frames, err) = drain_all(&mut decoder);
    assert_eq!(frames, 6);
    assert!(err.is_none());
    assert_eq!(decoder.errors(), 500);
}

// ============================================================================
// Transport and truncation
// ============================================================================

#[test]
fn test_transport_error_is_fatal() {
    let units = script(&[(Unit::Frame, 4), (Unit::Broken, 1), (Unit::Frame, 4)]);
    let mut decoder = open(&units, ErrorPolicy::All);
    let (frames, err) = drain_all(&mut decoder);
    assert_eq!(frames, 4);
    assert!(matches!(err, Some(StreamError::Transport(_))));
    assert_eq!(decoder.errors(), 0);
}

#[test]
fn test_transport_error_during_probe() {
    let result = StreamDecoder::open(ScriptedCodec::new(&[Unit::Broken]), ErrorPolicy::All);
    assert!(matches!(result.err(), Some(StreamError::Transport(_))));
}

#[test]
fn test_failed_decoder_stays_failed() {
    let units = script(&[(Unit::Frame, 1), (Unit::Broken, 1), (Unit::Frame, 4)]);
    let mut decoder = open(&units, ErrorPolicy::default());
    assert!(decoder.next_frame().unwrap().is_some());
    assert!(decoder.next_frame().is_err());
    assert_eq!(decoder.state(), DecoderState::Failed);
    assert!(!decoder.may_have_more_frames());
    assert!(decoder.next_frame().unwrap().is_none());
    assert!(decoder.skip_frame().unwrap().is_none());
    assert_eq!(decoder.valid_frames_decoded(), 1);
}

#[test]
fn test_truncated_tail_ends_cleanly() {
    let units = script(&[(Unit::Frame, 5), (Unit::Truncated, 1)]);
    let mut decoder = open(&units, ErrorPolicy::default());
    let (frames, err) = drain_all(&mut decoder);
    assert_eq!(frames, 5);
    assert!(err.is_none());
    assert_eq!(decoder.state(), DecoderState::Draining);
    assert_eq!(decoder.errors(), 1);
}

#[test]
fn test_truncated_short_stream_is_not_audio() {
    let units = script(&[(Unit::Frame, 1), (Unit::Truncated, 1)]);
    let mut decoder = open(&units, ErrorPolicy::default());
    let (frames, err) = drain_all(&mut decoder);
    assert_eq!(frames, 1);
    assert!(err.unwrap().is_not_audio());
}

// ============================================================================
// Observers
// ============================================================================

#[test]
fn test_no_more_frames_means_none() {
    let units = script(&[(Unit::Frame, 3), (Unit::BadHeader, 2), (Unit::Frame, 3)]);
    let mut decoder = open(&units, ErrorPolicy::default());
    let mut non_empty = 0;
    for _ in 0..20 {
        let more = decoder.may_have_more_frames();
        let pulled = decoder.next_frame().unwrap();
        if !more {
            assert!(pulled.is_none());
        }
        if pulled.is_some() {
            non_empty += 1;
        }
    }
    assert_eq!(non_empty, 6);
    assert_eq!(decoder.valid_frames_decoded(), non_empty);
}

#[test]
fn test_estimates_are_stable() {
    let units = script(&[(Unit::Frame, 4)]);
    let mut decoder = open(&units, ErrorPolicy::default());
    let duration = decoder.estimate_duration(160_000).unwrap();
    let count = decoder.estimate_frame_count(160_000).unwrap();
    assert!((duration - 10.0).abs() < 1e-9);
    assert_eq!(count, 383);

    assert_eq!(decoder.estimate_duration(160_000).unwrap(), duration);
    decoder.next_frame().unwrap();
    decoder.skip_frame().unwrap();
    assert_eq!(decoder.estimate_duration(160_000).unwrap(), duration);
    assert_eq!(decoder.estimate_frame_count(160_000).unwrap(), count);
}

#[test]
fn test_position_and_codec_release() {
    let mut decoder = open(&script(&[(Unit::Frame, 3)]), ErrorPolicy::default());
    assert_eq!(decoder.position(), FRAME_LEN);
    decoder.next_frame().unwrap();
    assert_eq!(decoder.position(), 2 * FRAME_LEN);
    assert_eq!(decoder.policy(), ErrorPolicy::Moderate(10));

    let codec = decoder.into_codec();
    assert_eq!(codec.script.len(), 1);
}
