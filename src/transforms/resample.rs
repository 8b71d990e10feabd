//! Resampling stage: linear interpolation to a target rate.

use anyhow::{ensure, Context, Result};
use ndarray::Array2;
use tracing::debug;

use super::{take_loaded, Transform};
use crate::types::Stimulus;

/// Interpolates the waveform to `resample_rate` when the current rate
/// differs; a no-op otherwise. The record's rate becomes the target either
/// way.
pub struct ResampleAudio {
    resample_rate: u32,
}

impl ResampleAudio {
    pub fn new(resample_rate: u32) -> Self {
        Self { resample_rate }
    }
}

impl Transform for ResampleAudio {
    fn name(&self) -> &'static str {
        "resample"
    }

    fn apply(&self, stimulus: &mut Stimulus) -> Result<()> {
        let (waveform, sample_rate) = take_loaded(stimulus)?;
        if sample_rate == self.resample_rate {
            stimulus.waveform = Some(waveform);
            return Ok(());
        }

        debug!(
            from = sample_rate,
            to = self.resample_rate,
            "resampling waveform"
        );
        let rows: Vec<Vec<f32>> = waveform
            .rows()
            .into_iter()
            .map(|row| {
                let channel: Vec<f32> = row.to_vec();
                linear_resample(&channel, sample_rate, self.resample_rate)
            })
            .collect::<Result<_>>()?;

        let ncols = rows.first().map_or(0, Vec::len);
        let data: Vec<f32> = rows.into_iter().flatten().collect();
        let resampled = Array2::from_shape_vec((waveform.nrows(), ncols), data)
            .context("resampled channels have mismatched lengths")?;

        stimulus.waveform = Some(resampled);
        stimulus.sample_rate = Some(self.resample_rate);
        Ok(())
    }
}

/// Linearly resample `samples` from `source_rate` to `target_rate`.
pub fn linear_resample(samples: &[f32], source_rate: u32, target_rate: u32) -> Result<Vec<f32>> {
    ensure!(source_rate > 0, "source sample rate must be positive");
    ensure!(target_rate > 0, "target sample rate must be positive");
    if samples.is_empty() || source_rate == target_rate {
        return Ok(samples.to_vec());
    }

    let ratio = target_rate as f64 / source_rate as f64;
    let output_len = ((samples.len() as f64) * ratio).ceil().max(1.0) as usize;
    let last = samples.len() - 1;
    let mut output = Vec::with_capacity(output_len);
    for i in 0..output_len {
        let position = i as f64 / ratio;
        let left = (position.floor() as usize).min(last);
        let right = (left + 1).min(last);
        let t = (position - left as f64) as f32;
        output.push(samples[left] * (1.0 - t) + samples[right] * t);
    }
    Ok(output)
}
