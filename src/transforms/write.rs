//! Writer stage: persist the waveform in the requested format. The one
//! sanctioned I/O side effect in a processing pipeline.

use std::path::Path;

use anyhow::{anyhow, ensure, Context, Result};
use flacenc::bitsink::ByteSink;
use flacenc::component::BitRepr;
use flacenc::error::Verify;
use ndarray::Array2;

use super::{loaded, Transform};
use crate::types::{OutputFormat, Stimulus};

const PCM_SCALE: f32 = 32_767.0;

pub struct WaveToFile {
    format: OutputFormat,
}

impl WaveToFile {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }
}

impl Transform for WaveToFile {
    fn name(&self) -> &'static str {
        "write"
    }

    fn apply(&self, stimulus: &mut Stimulus) -> Result<()> {
        let (waveform, sample_rate) = loaded(stimulus)?;

        // Reject before any bytes are written.
        let extension = stimulus
            .out_path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("");
        ensure!(
            extension == self.format.extension(),
            "output extension '{}' of {} does not match requested format '{}'",
            extension,
            stimulus.out_path.display(),
            self.format
        );

        match self.format {
            OutputFormat::Wav => write_wav(&stimulus.out_path, waveform, sample_rate),
            OutputFormat::Flac => write_flac(&stimulus.out_path, waveform, sample_rate),
        }
    }
}

fn write_wav(path: &Path, waveform: &Array2<f32>, sample_rate: u32) -> Result<()> {
    let spec = hound::WavSpec {
        channels: waveform.nrows() as u16,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("failed to create WAV file {}", path.display()))?;
    for i in 0..waveform.ncols() {
        for ch in 0..waveform.nrows() {
            writer
                .write_sample(quantize(waveform[[ch, i]]))
                .context("failed to write audio sample")?;
        }
    }
    writer.finalize().context("failed to finalize WAV file")?;
    Ok(())
}

fn write_flac(path: &Path, waveform: &Array2<f32>, sample_rate: u32) -> Result<()> {
    let channels = waveform.nrows();
    let mut interleaved = Vec::with_capacity(channels * waveform.ncols());
    for i in 0..waveform.ncols() {
        for ch in 0..channels {
            interleaved.push(i32::from(quantize(waveform[[ch, i]])));
        }
    }

    let config = flacenc::config::Encoder::default()
        .into_verified()
        .map_err(|e| anyhow!("invalid FLAC encoder configuration: {e:?}"))?;
    let source = flacenc::source::MemSource::from_samples(
        &interleaved,
        channels,
        16,
        sample_rate as usize,
    );
    let stream = flacenc::encode_with_fixed_block_size(&config, source, config.block_size)
        .map_err(|e| anyhow!("FLAC encoding failed: {e:?}"))?;

    let mut sink = ByteSink::new();
    stream
        .write(&mut sink)
        .map_err(|e| anyhow!("failed to serialize FLAC stream: {e:?}"))?;
    std::fs::write(path, sink.as_slice())
        .with_context(|| format!("failed to write FLAC file {}", path.display()))?;
    Ok(())
}

fn quantize(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * PCM_SCALE) as i16
}
