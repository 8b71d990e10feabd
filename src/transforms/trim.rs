//! Trim leading and trailing silence using an energy-based voice-activity
//! boundary detector, applied once forward and once on the reversed signal.

use anyhow::Result;
use ndarray::s;
use tracing::warn;

use super::{take_loaded, Transform};
use crate::types::Stimulus;

/// Detection window length in seconds.
const DETECTOR_WINDOW_SEC: f64 = 0.01;

pub struct TrimSilence {
    trigger_level: f32,
}

impl TrimSilence {
    /// `trigger_level` is in dB below full scale; larger values trim more
    /// aggressively.
    pub fn new(trigger_level: f32) -> Self {
        Self { trigger_level }
    }
}

impl Transform for TrimSilence {
    fn name(&self) -> &'static str {
        "trim"
    }

    fn apply(&self, stimulus: &mut Stimulus) -> Result<()> {
        let (waveform, sample_rate) = take_loaded(stimulus)?;

        // Detect on the summed channel mix; trim every channel at the
        // detected boundaries.
        let mixed: Vec<f32> = (0..waveform.ncols())
            .map(|i| waveform.column(i).sum())
            .collect();

        let Some(begin) = sound_onset(&mixed, sample_rate, self.trigger_level) else {
            warn!("waveform may be empty; skipping silence trim");
            stimulus.waveform = Some(waveform);
            return Ok(());
        };

        let reversed: Vec<f32> = mixed[begin..].iter().rev().copied().collect();
        let Some(tail) = sound_onset(&reversed, sample_rate, self.trigger_level) else {
            warn!("waveform may be empty; skipping silence trim");
            stimulus.waveform = Some(waveform);
            return Ok(());
        };

        let end = mixed.len() - tail;
        let trimmed = waveform.slice(s![.., begin..end]).to_owned();
        stimulus.waveform = Some(trimmed);
        Ok(())
    }
}

/// Index of the first sample of the first detection window whose mean
/// absolute amplitude reaches the trigger level, or `None` when the whole
/// signal stays below it.
pub fn sound_onset(samples: &[f32], sample_rate: u32, trigger_level: f32) -> Option<usize> {
    if samples.is_empty() {
        return None;
    }
    let threshold = 10.0_f32.powf(-trigger_level / 20.0);
    let window_size = ((DETECTOR_WINDOW_SEC * f64::from(sample_rate)).round() as usize).max(1);

    let mut idx = 0;
    while idx < samples.len() {
        let end = (idx + window_size).min(samples.len());
        let window = &samples[idx..end];
        let energy = window.iter().map(|s| s.abs()).sum::<f32>() / window.len() as f32;
        if energy >= threshold {
            return Some(idx);
        }
        idx = end;
    }
    None
}
