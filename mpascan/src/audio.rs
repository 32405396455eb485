//! WAV output for decoded samples

use std::io::Write;

use anyhow::{ensure, Result};

/// Size of the RIFF/WAVE header written by [`write_wav_to_bytes`]
pub const WAV_HEADER_LEN: usize = 44;

/// Write interleaved f32 samples as a 32-bit float WAV file
pub fn write_wav_to_bytes(samples: &[f32], sample_rate: u32, channels: usize) -> Result<Vec<u8>> {
    ensure!(channels > 0, "WAV output needs at least one channel");

    let bytes_per_sample = 4; // 32-bit float
    let data_size = samples.len() * bytes_per_sample;
    ensure!(
        data_size + WAV_HEADER_LEN - 8 <= u32::MAX as usize,
        "{} samples do not fit in a WAV file",
        samples.len()
    );

    let mut buffer = Vec::with_capacity(WAV_HEADER_LEN + data_size);

    // RIFF header
    buffer.write_all(b"RIFF")?;
    buffer.write_all(&((WAV_HEADER_LEN - 8 + data_size) as u32).to_le_bytes())?;
    buffer.write_all(b"WAVE")?;

    // fmt chunk
    buffer.write_all(b"fmt ")?;
    buffer.write_all(&16u32.to_le_bytes())?;
    buffer.write_all(&3u16.to_le_bytes())?; // IEEE float
    buffer.write_all(&(channels as u16).to_le_bytes())?;
    buffer.write_all(&sample_rate.to_le_bytes())?;
    let byte_rate = sample_rate * channels as u32 * bytes_per_sample as u32;
    buffer.write_all(&byte_rate.to_le_bytes())?;
    let block_align = channels as u16 * bytes_per_sample as u16;
    buffer.write_all(&block_align.to_le_bytes())?;
    buffer.write_all(&32u16.to_le_bytes())?;

    // data chunk
    buffer.write_all(b"data")?;
    buffer.write_all(&(data_size as u32).to_le_bytes())?;
    for &sample in samples {
        buffer.write_all(&sample.to_le_bytes())?;
    }

    Ok(buffer)
}
