//! Loader stage: decode an audio file into an in-memory waveform.

use std::fs::File;
use std::path::Path;

use anyhow::{ensure, Context, Result};
use ndarray::Array2;
use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::sample::Sample;

use super::Transform;
use crate::types::Stimulus;

/// Reads the record's source path into a channels x samples waveform plus
/// its sample rate.
pub struct PathToWave;

impl Transform for PathToWave {
    fn name(&self) -> &'static str {
        "load"
    }

    fn apply(&self, stimulus: &mut Stimulus) -> Result<()> {
        let (waveform, sample_rate) = decode_audio(&stimulus.path)?;
        stimulus.waveform = Some(waveform);
        stimulus.sample_rate = Some(sample_rate);
        Ok(())
    }
}

/// Decode an audio file to planar f32 PCM normalized to [-1.0, 1.0].
pub fn decode_audio(path: &Path) -> Result<(Array2<f32>, u32)> {
    let file = File::open(path)
        .with_context(|| format!("failed to open audio file {}", path.display()))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(extension);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .context("failed to probe audio format")?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .context("no audio tracks found in file")?;
    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .context("sample rate not specified in audio file")?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .context("failed to create decoder")?;

    let mut channels: Vec<Vec<f32>> = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(err))
                if err.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(err) => return Err(err).context("failed to read packet"),
        };
        if packet.track_id() != track_id {
            continue;
        }
        let decoded = decoder
            .decode(&packet)
            .context("failed to decode audio packet")?;
        append_planar(&mut channels, &decoded);
    }

    ensure!(
        channels.first().is_some_and(|ch| !ch.is_empty()),
        "decoded no audio samples from {}",
        path.display()
    );

    let rows = channels.len();
    let cols = channels[0].len();
    let mut data = Vec::with_capacity(rows * cols);
    for channel in &channels {
        data.extend_from_slice(channel);
    }
    let waveform = Array2::from_shape_vec((rows, cols), data)
        .context("decoded channels have mismatched lengths")?;
    Ok((waveform, sample_rate))
}

/// Append one decoded packet to the planar channel buffers, converting
/// whatever sample format the codec produced to normalized f32.
fn append_planar(channels: &mut Vec<Vec<f32>>, buffer: &AudioBufferRef) {
    match buffer {
        AudioBufferRef::U8(buf) => extend(channels, buf, |s| f32::from(s) / 128.0 - 1.0),
        AudioBufferRef::U16(buf) => extend(channels, buf, |s| f32::from(s) / 32_768.0 - 1.0),
        AudioBufferRef::U24(buf) => {
            extend(channels, buf, |s| s.inner() as f32 / 8_388_608.0 - 1.0)
        }
        AudioBufferRef::U32(buf) => {
            extend(channels, buf, |s| s as f32 / 2_147_483_648.0 - 1.0)
        }
        AudioBufferRef::S8(buf) => extend(channels, buf, |s| f32::from(s) / 128.0),
        AudioBufferRef::S16(buf) => extend(channels, buf, |s| f32::from(s) / 32_768.0),
        AudioBufferRef::S24(buf) => extend(channels, buf, |s| s.inner() as f32 / 8_388_608.0),
        AudioBufferRef::S32(buf) => extend(channels, buf, |s| s as f32 / 2_147_483_648.0),
        AudioBufferRef::F32(buf) => extend(channels, buf, |s| s),
        AudioBufferRef::F64(buf) => extend(channels, buf, |s| s as f32),
    }
}

fn extend<S, F>(channels: &mut Vec<Vec<f32>>, buf: &AudioBuffer<S>, convert: F)
where
    S: Sample,
    F: Fn(S) -> f32,
{
    let num_channels = buf.spec().channels.count();
    if channels.is_empty() {
        channels.resize_with(num_channels, Vec::new);
    }
    for (ch, sink) in channels.iter_mut().enumerate().take(num_channels) {
        sink.extend(buf.chan(ch).iter().copied().map(&convert));
    }
}

#[cfg(test)]
mod tests {
    use super::decode_audio;
    use hound::{SampleFormat, WavSpec, WavWriter};
    use tempfile::tempdir;

    #[test]
    fn decodes_stereo_wav_planar() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        let spec = WavSpec {
            channels: 2,
            sample_rate: 8_000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        for _ in 0..100 {
            writer.write_sample(16_384_i16).unwrap(); // left ~0.5
            writer.write_sample(-16_384_i16).unwrap(); // right ~-0.5
        }
        writer.finalize().unwrap();

        let (waveform, rate) = decode_audio(&path).unwrap();
        assert_eq!(rate, 8_000);
        assert_eq!(waveform.nrows(), 2);
        assert_eq!(waveform.ncols(), 100);
        assert!((waveform[[0, 0]] - 0.5).abs() < 1e-3);
        assert!((waveform[[1, 0]] + 0.5).abs() < 1e-3);
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = decode_audio(std::path::Path::new("/nonexistent/file.wav")).unwrap_err();
        assert!(err.to_string().contains("failed to open"));
    }
}
