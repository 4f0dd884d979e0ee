//! Silent WAV generation for the no-TTS fallback path.

use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};
use tracing::debug;

use crate::error::{MediaError, MediaResult};

const SAMPLE_RATE: u32 = 16_000;

/// Write a silent 16 kHz mono 16-bit PCM WAV of `duration_ms`.
///
/// The timing model stays authoritative for word timestamps; this
/// file only exists so the renderer always has an audio track of the
/// right length.
pub fn write_silent_wav(path: impl AsRef<Path>, duration_ms: u64) -> MediaResult<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let spec = WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let num_samples = (SAMPLE_RATE as u64 * duration_ms) / 1000;
    let mut writer =
        WavWriter::create(path, spec).map_err(|e| MediaError::WavWrite(e.to_string()))?;
    for _ in 0..num_samples {
        writer
            .write_sample(0i16)
            .map_err(|e| MediaError::WavWrite(e.to_string()))?;
    }
    writer
        .finalize()
        .map_err(|e| MediaError::WavWrite(e.to_string()))?;

    debug!(
        duration_ms,
        samples = num_samples,
        "Wrote silent WAV {}",
        path.display()
    );
    Ok(())
}
