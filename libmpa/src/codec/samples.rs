//! symphonia buffers to interleaved f32

use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::conv::IntoSample;
use symphonia::core::sample::Sample;

/// append a decoded buffer to `out` as interleaved f32 in [-1.0, 1.0]
pub fn append_interleaved(buffer: &AudioBufferRef<'_>, out: &mut Vec<f32>) {
    match buffer {
        AudioBufferRef::F32(buf) => {
            let channels = buf.spec().channels.count();
            out.reserve(buf.frames() * channels);
            for frame in 0..buf.frames() {
                for ch in 0..channels {
                    out.push(buf.chan(ch)[frame]);
                }
            }
        }
        AudioBufferRef::F64(buf) => convert(&**buf, out),
        AudioBufferRef::S32(buf) => convert(&**buf, out),
        AudioBufferRef::S24(buf) => convert(&**buf, out),
        AudioBufferRef::S16(buf) => convert(&**buf, out),
        AudioBufferRef::S8(buf) => convert(&**buf, out),
        AudioBufferRef::U32(buf) => convert(&**buf, out),
        AudioBufferRef::U24(buf) => convert(&**buf, out),
        AudioBufferRef::U16(buf) => convert(&**buf, out),
        AudioBufferRef::U8(buf) => convert(&**buf, out),
    }
}

fn convert<S>(buf: &AudioBuffer<S>, out: &mut Vec<f32>)
where
    S: Sample + IntoSample<f32>,
{
    let channels = buf.spec().channels.count();
    out.reserve(buf.frames() * channels);
    for frame in 0..buf.frames() {
        for ch in 0..channels {
            out.push(buf.chan(ch)[frame].into_sample());
        }
    }
}
